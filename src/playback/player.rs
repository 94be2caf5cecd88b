//! External player process supervision.
//!
//! This module provides the [`Player`] trait and [`ProcessPlayer`], which runs
//! `<executable> <args...> <file>` and kills it if it runs past the timeout.

use std::{process::Stdio, time::Duration};

use log::{debug, info, warn};
use mockall::automock;
use thiserror::Error;
use tokio::{process::Command, time};

use crate::playback::PlaybackTarget;

/// How a play attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The player exited on its own, with its exit code if it has one.
    Finished(Option<i32>),
    /// The player ran past the timeout and was killed.
    TimedOut,
}

/// Errors preventing a target from being played.
#[derive(Debug, Error)]
pub enum PlayError {
    /// The sound file vanished between rule loading and playback.
    #[error("file '{0}' does not exist")]
    MediaMissing(PlaybackTarget),
    /// The player process could not be started.
    #[error("cannot start player {executable}: {source}")]
    Spawn {
        executable: String,
        source: std::io::Error,
    },
    /// Waiting for the player process failed.
    #[error("cannot wait for player: {0}")]
    Wait(std::io::Error),
}

/// Something able to play a sound file to completion.
///
/// This trait abstracts the player process for easier testing with mocks.
#[automock]
pub trait Player {
    /// Plays `target` and returns once playback is over.
    ///
    /// Implementations must not return while anything they started for this
    /// target is still running.
    async fn play(&self, target: &PlaybackTarget) -> Result<PlayOutcome, PlayError>;
}

/// Plays files by running an external command such as `mpg123 -q <file>`.
///
/// # Examples
///
/// ```no_run
/// # use std::time::Duration;
/// # use alertchime::playback::{Player, ProcessPlayer, PlaybackTarget};
/// # async fn example() {
/// let player = ProcessPlayer::new("mpg123", vec!["-q".to_string()], Duration::from_secs(30));
/// let outcome = player.play(&PlaybackTarget::from("door.mp3")).await;
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ProcessPlayer {
    /// Player executable, looked up in `PATH` if not a path.
    executable: String,
    /// Arguments placed before the file path.
    args: Vec<String>,
    /// Maximum duration of one play.
    timeout: Duration,
}

impl ProcessPlayer {
    pub fn new(executable: &str, args: Vec<String>, timeout: Duration) -> Self {
        ProcessPlayer {
            executable: executable.to_owned(),
            args,
            timeout,
        }
    }
}

impl Player for ProcessPlayer {
    /// Runs the player and waits at most `timeout` for it.
    ///
    /// On timeout the process is killed and reaped before returning, so no
    /// zombie is left behind. `kill_on_drop` covers the remaining exit paths.
    async fn play(&self, target: &PlaybackTarget) -> Result<PlayOutcome, PlayError> {
        info!("playing '{}'", target);

        let mut child = Command::new(&self.executable)
            .args(&self.args)
            .arg(target.as_path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| PlayError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        match time::timeout(self.timeout, child.wait()).await {
            Ok(status) => {
                let status = status.map_err(PlayError::Wait)?;
                debug!("finished '{}' ({})", target, status);
                Ok(PlayOutcome::Finished(status.code()))
            }
            Err(_) => {
                warn!(
                    "'{}' still playing after {:?}, stopping player",
                    target, self.timeout
                );
                // Kills then waits, which reaps the process.
                child.kill().await.map_err(PlayError::Wait)?;
                Ok(PlayOutcome::TimedOut)
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::NamedTempFile;

    /// Player running `script` with `sh`, the file path being `$1`.
    fn shell_player(script: &str, timeout: Duration) -> ProcessPlayer {
        ProcessPlayer::new(
            "sh",
            vec!["-c".to_string(), script.to_string(), "sh".to_string()],
            timeout,
        )
    }

    fn target(file: &NamedTempFile) -> PlaybackTarget {
        PlaybackTarget::new(file.path())
    }

    #[tokio::test]
    async fn test_play_finishes() {
        let file = NamedTempFile::new().unwrap();
        let player = shell_player("test -f \"$1\"", Duration::from_secs(10));

        let outcome = player.play(&target(&file)).await.unwrap();
        assert_eq!(outcome, PlayOutcome::Finished(Some(0)));
    }

    #[tokio::test]
    async fn test_play_reports_exit_code() {
        let file = NamedTempFile::new().unwrap();
        let player = shell_player("exit 3", Duration::from_secs(10));

        let outcome = player.play(&target(&file)).await.unwrap();
        assert_eq!(outcome, PlayOutcome::Finished(Some(3)));
    }

    #[tokio::test]
    async fn test_play_timeout_kills_player() {
        let file = NamedTempFile::new().unwrap();
        let player = shell_player("exec sleep 30", Duration::from_millis(200));

        let start = Instant::now();
        let outcome = player.play(&target(&file)).await.unwrap();

        assert_eq!(outcome, PlayOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    #[cfg(target_os = "linux")]
    async fn test_play_timeout_reaps_player() {
        let file = NamedTempFile::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let pidfile = dir.path().join("player.pid");
        let script = format!("echo $$ > {:?}; exec sleep 30", pidfile.to_str().unwrap());
        let player = shell_player(&script, Duration::from_millis(500));

        let outcome = player.play(&target(&file)).await.unwrap();
        assert_eq!(outcome, PlayOutcome::TimedOut);

        let pid = std::fs::read_to_string(&pidfile).unwrap();
        let pid: u32 = pid.trim().parse().unwrap();
        // Neither running nor left as a zombie.
        assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
    }

    #[tokio::test]
    async fn test_play_unknown_executable() {
        let file = NamedTempFile::new().unwrap();
        let player = ProcessPlayer::new(
            "alertchime-no-such-player",
            vec![],
            Duration::from_secs(1),
        );

        assert!(matches!(
            player.play(&target(&file)).await,
            Err(PlayError::Spawn { .. })
        ));
    }
}
