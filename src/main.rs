//! alertchime - Play a sound file when a Grafana alert fires.
//!
//! This is the main entry point of alertchime, a small service receiving Grafana
//! webhook notifications and playing a sound file for each firing alert that
//! matches one of its rules.
//!
//! # Overview
//!
//! Grafana is configured with a webhook contact point pointing to this service.
//! Each firing alert of a notification is looked up in the rule table by name,
//! and optionally by value. Matching sound files are queued and played one at a
//! time by an external player such as `mpg123`.
//!
//! # Features
//!
//! - **Rule Table**: Alert name to sound file, with an optional value pattern
//! - **Do Not Disturb**: Alerts outside of the configured hours are ignored
//! - **Sequential Playback**: Sounds never overlap, each one is bounded by a timeout
//! - **Legacy Alerts**: Notifications of the legacy Grafana alerting are supported
//! - **TOML Configuration**: With environment variable and command line overrides
//!
//! # Configuration
//!
//! Create an `alert.toml` file, see [`config`] for every setting:
//!
//! ```toml
//! [start_end]
//! start_hr = 8
//! end_hr = 23
//!
//! [mp3match]
//! "sounds/door.mp3" = "Front door open"
//! "sounds/co2.mp3" = ["CO2 level", "[0-9]{4}"]
//! ```
//!
//! # Usage
//!
//! ```bash
//! alertchime --config alert.toml --port 8333
//! ```
//!
//! # Architecture
//!
//! - [`app`] - Startup wiring of the listener and the worker
//! - [`config`] - Configuration file structures and loading
//! - [`grafana`] - Notification payloads and their evaluation
//! - [`playback`] - Playback queue, worker and player process
//! - [`rules`] - Rule table and its loading from the configuration file
//! - [`utils`] - Executable lookup
//! - [`webhook`] - HTTP listener
//! - [`window`] - Do-not-disturb hour window
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level, over `global.loglevel` and `--loglevel`
//! - `ALERTCHIME_<SECTION>__<KEY>` - Overrides a configuration file value

use std::path::Path;

use clap::Parser;
use env_logger::Env;
use log::{LevelFilter, error, info, warn};

use crate::{app::App, config::Config};

mod app;
mod config;
mod grafana;
mod playback;
mod rules;
mod utils;
mod webhook;
mod window;

/// Command-line arguments for alertchime.
///
/// Values given here override the configuration file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    ///
    /// Sound file paths of the `[mp3match]` section are relative to the
    /// directory of this file.
    #[arg(short, long, default_value = "alert.toml")]
    config: String,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level, used when neither `RUST_LOG` nor `global.loglevel` is set.
    #[arg(short, long, default_value = "info")]
    loglevel: LevelFilter,

    /// Player executable name or path.
    #[arg(long, alias = "mpg123")]
    player: Option<String>,

    /// Seconds before a playing file is interrupted.
    #[arg(short, long)]
    timeout: Option<u64>,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(player) = &self.player {
            config.player.executable = player.clone();
        }
        if let Some(timeout) = self.timeout {
            config.player.timeout = timeout;
        }
    }
}

/// Main entry point for alertchime.
///
/// 1. **Argument Parsing**: Parses command-line arguments using `clap`
/// 2. **Configuration Loading**: Reads the TOML file and the environment
/// 3. **Logging Setup**: Picks the level from `RUST_LOG`, the file or the command line
/// 4. **Startup**: Loads the rules and checks the player, then serves until Ctrl-C
///
/// Any startup failure is logged and the process exits with status 1.
#[tokio::main]
async fn main() {
    let args = Args::parse();
    let config = Config::load(&args.config);

    let file_level = config
        .as_ref()
        .ok()
        .and_then(|config| config.global.loglevel.clone());
    let level = match file_level.as_deref().map(str::parse::<LevelFilter>) {
        Some(Ok(level)) => level,
        _ => args.loglevel,
    };
    env_logger::init_from_env(Env::default().default_filter_or(level.to_string()));

    info!("Starting alertchime {}...", env!("CARGO_PKG_VERSION"));
    if let Some(Err(e)) = file_level.as_deref().map(str::parse::<LevelFilter>) {
        warn!("ignoring global.loglevel: {}", e);
    }

    let mut config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);

    let app = match App::new(config, Path::new(&args.config)).await {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app.start().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["alertchime"]);
        assert_eq!(args.config, "alert.toml");
        assert_eq!(args.loglevel, LevelFilter::Info);
        assert_eq!(args.port, None);
    }

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "alertchime",
            "--port",
            "9000",
            "--mpg123",
            "/usr/bin/mpg321",
            "--timeout",
            "5",
        ]);
        let mut config = Config::default();

        args.apply(&mut config);

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.player.executable, "/usr/bin/mpg321");
        assert_eq!(config.player.timeout, 5);
        assert_eq!(config.start_end.start_hr, 8);
    }

    #[test]
    fn test_args_keep_config_when_absent() {
        let args = Args::parse_from(["alertchime", "-l", "debug"]);
        let mut config = Config::default();
        config.server.port = 9100;

        args.apply(&mut config);

        assert_eq!(args.loglevel, LevelFilter::Debug);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.player.executable, "mpg123");
    }
}
