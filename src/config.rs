//! Configuration file structures for alertchime.
//!
//! The settings are read from a TOML file, then overridden by environment
//! variables prefixed with `ALERTCHIME_` (sections separated by `__`), then by
//! the command line. Every section and key is optional.
//!
//! # Configuration File Format
//!
//! ```toml
//! [global]
//! # Overrides --loglevel, itself overridden by RUST_LOG
//! loglevel = "debug"
//!
//! [server]
//! bind = "127.0.0.1"
//! port = 8333
//! # User-Agent header identifying Grafana requests
//! user_agent = "Grafana"
//! # "reject" answers 400 to other sources, "ignore" answers 200
//! bad_source = "reject"
//! max_body_bytes = 1048576
//!
//! [player]
//! executable = "mpg123"
//! args = ["-q"]
//! # Seconds before a playing file is interrupted
//! timeout = 30
//!
//! # Hours during which alerts play
//! [start_end]
//! start_hr = 8
//! end_hr = 23
//!
//! # Sound file to alert name, or to [alert name, value pattern]
//! [mp3match]
//! "sounds/door.mp3" = "Front door open"
//! "sounds/co2.mp3" = ["CO2 level", "[0-9]{4}"]
//! ```
//!
//! The `[mp3match]` section is not part of [`Config`], see
//! [`RuleLoader`](crate::rules::RuleLoader).
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export ALERTCHIME_SERVER__PORT=9000
//! export ALERTCHIME_PLAYER__EXECUTABLE=/usr/local/bin/mpg123
//! ```

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;

use crate::{
    webhook::BadSourcePolicy,
    window::{DEFAULT_END_HR, DEFAULT_START_HR},
};

/// Prefix of the environment variables overriding the configuration file.
pub const ENV_PREFIX: &str = "ALERTCHIME_";

/// Root configuration structure.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Config {
    pub global: Global,
    pub server: Server,
    pub player: PlayerSettings,
    pub start_end: StartEnd,
}

/// `[global]` section.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct Global {
    /// Log level name such as `info` or `debug`.
    pub loglevel: Option<String>,
}

/// `[server]` section: the webhook listener.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Server {
    /// Address to listen on.
    ///
    /// Defaults to the loopback interface; Grafana is expected to run on the
    /// same host or behind a reverse proxy.
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Expected `User-Agent` header value.
    pub user_agent: String,
    /// Answer given to requests with another `User-Agent`.
    pub bad_source: BadSourcePolicy,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
}

impl Default for Server {
    fn default() -> Self {
        Server {
            bind: "127.0.0.1".to_string(),
            port: 8333,
            user_agent: "Grafana".to_string(),
            bad_source: BadSourcePolicy::default(),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// `[player]` section: the external player command.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct PlayerSettings {
    /// Player executable name or path.
    pub executable: String,
    /// Arguments passed before the sound file path.
    pub args: Vec<String>,
    /// Timeout in seconds after which a playing file is interrupted.
    pub timeout: u64,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            executable: "mpg123".to_string(),
            args: vec!["-q".to_string()],
            timeout: 30,
        }
    }
}

/// `[start_end]` section: the do-not-disturb window.
#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct StartEnd {
    pub start_hr: u32,
    pub end_hr: u32,
}

impl Default for StartEnd {
    fn default() -> Self {
        StartEnd {
            start_hr: DEFAULT_START_HR,
            end_hr: DEFAULT_END_HR,
        }
    }
}

impl Config {
    /// Loads the configuration from `path` and the environment.
    ///
    /// A missing file yields the defaults; the rule loader reports it later.
    ///
    /// # Errors
    ///
    /// Returns the figment error when the file is not valid TOML or a value
    /// has the wrong type.
    pub fn load(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
    }
}
