//! Application wiring.
//!
//! [`App`] builds every component from the configuration once at startup and
//! runs the two execution contexts of the service:
//!
//! 1. **Playback worker**: a single task pulling sound files off the queue and
//!    playing them one at a time.
//! 2. **HTTP listener**: receives Grafana notifications and feeds the queue.
//!
//! ```text
//! Grafana → HTTP listener → rule table → playback queue → playback worker → player
//! ```
//!
//! The listener stops on Ctrl-C, which also stops the worker and any running
//! player.

use std::{path::Path, sync::Arc, time::Duration};

use anyhow::Context;
use log::{error, info, warn};
use tokio::{net::TcpListener, signal};

use crate::{
    config::Config,
    playback::{PlaybackWorker, ProcessPlayer, playback_queue},
    rules::{Rule, RuleLoader},
    utils::find_executable,
    webhook::{self, ListenerContext, local_clock},
    window::TimeWindow,
};

/// The assembled service, ready to start.
pub struct App {
    /// Shared state handed to every request handler.
    ctx: ListenerContext,
    /// Sole consumer of the playback queue.
    worker: PlaybackWorker<ProcessPlayer>,
    /// Address the HTTP listener binds to.
    bind: String,
    port: u16,
}

impl App {
    /// Builds the service from the configuration loaded from `config_path`.
    ///
    /// Reads the rule table from the same file, so every sound file is
    /// checked before anything is served.
    ///
    /// # Errors
    ///
    /// Fails if the player executable cannot be found, the hour window is
    /// invalid, or the rule table cannot be loaded.
    pub async fn new(config: Config, config_path: &Path) -> Result<Self, anyhow::Error> {
        let executable = find_executable(&config.player.executable).with_context(|| {
            format!(
                "cannot find player executable '{}'",
                config.player.executable
            )
        })?;
        info!("using player {}", executable.display());

        let window = TimeWindow::new(config.start_end.start_hr, config.start_end.end_hr)
            .context("invalid [start_end] section")?;
        info!("alerts play during {}", window);

        let rules = RuleLoader::new(config_path)
            .load()
            .await
            .context("cannot load rules")?;
        if rules.is_empty() {
            warn!("no rule in the configuration, no alert will play");
        } else {
            let names: Vec<&str> = rules.iter().map(Rule::name).collect();
            info!("watching {} alerts: {}", rules.len(), names.join(", "));
        }

        let (queue, receiver) = playback_queue();
        let player = ProcessPlayer::new(
            &executable.to_string_lossy(),
            config.player.args,
            Duration::from_secs(config.player.timeout),
        );

        let ctx = ListenerContext {
            rules: Arc::new(rules),
            window,
            queue,
            user_agent: Arc::from(config.server.user_agent),
            bad_source: config.server.bad_source,
            max_body_bytes: config.server.max_body_bytes,
            clock: local_clock(),
        };

        Ok(App {
            ctx,
            worker: PlaybackWorker::new(receiver, player),
            bind: config.server.bind,
            port: config.server.port,
        })
    }

    /// Starts the playback worker and serves requests until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails if the listening socket cannot be bound or the server fails.
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind((self.bind.as_str(), self.port))
            .await
            .with_context(|| format!("cannot listen on {}:{}", self.bind, self.port))?;

        let worker = tokio::spawn(self.worker.run());

        webhook::serve(listener, self.ctx, shutdown_signal())
            .await
            .context("HTTP server failed")?;

        // Drops the running player, if any, which kills it.
        worker.abort();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
        fs::write(dir.path().join("foo.mp3"), b"ID3").unwrap();
        let path = dir.path().join("alert.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn sh_player() -> Config {
        let mut config = Config::default();
        config.player.executable = "sh".to_string();
        config
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_new() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[mp3match]\n\"foo.mp3\" = [\"foo\", \".*bar.*\"]\n");

        let app = App::new(sh_player(), &path).await.unwrap();

        assert_eq!(app.ctx.rules.len(), 1);
        assert_eq!(app.bind, "127.0.0.1");
        assert_eq!(app.port, 8333);
        assert_eq!(&*app.ctx.user_agent, "Grafana");
    }

    #[tokio::test]
    async fn test_new_unknown_player() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[mp3match]\n\"foo.mp3\" = \"foo\"\n");
        let mut config = Config::default();
        config.player.executable = "alertchime-no-such-player".to_string();

        let error = App::new(config, &path).await.err().unwrap();

        assert!(error.to_string().contains("alertchime-no-such-player"));
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_new_invalid_window() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[mp3match]\n\"foo.mp3\" = \"foo\"\n");
        let mut config = sh_player();
        config.start_end.end_hr = 24;

        assert!(App::new(config, &path).await.is_err());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_new_missing_rules() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "[server]\nport = 9000\n");

        let error = App::new(sh_player(), &path).await.err().unwrap();

        assert_eq!(error.to_string(), "cannot load rules");
    }
}
