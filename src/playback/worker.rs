//! Playback consumer loop.

use log::{debug, error, info};
use tokio::fs;

use crate::playback::{PlayError, PlayOutcome, PlaybackReceiver, PlaybackTarget, Player};

/// Pulls targets off the playback queue and plays them one after the other.
///
/// The worker is started once at startup and owns the player for its whole
/// life. Since targets are played sequentially, at most one player process
/// exists at any time.
///
/// # Error Handling
///
/// A play attempt failing never stops the loop:
/// - a target whose file disappeared since startup is logged and skipped
/// - a player that cannot be started is logged and the next target is tried
/// - a timeout is an expected condition, the next target is played right away
///   and the timed out one is not retried
///
/// # Examples
///
/// ```no_run
/// # use std::time::Duration;
/// # use alertchime::playback::{playback_queue, PlaybackWorker, ProcessPlayer};
/// # async fn example() {
/// let (queue, receiver) = playback_queue();
/// let player = ProcessPlayer::new("mpg123", vec!["-q".to_string()], Duration::from_secs(30));
/// tokio::spawn(PlaybackWorker::new(receiver, player).run());
/// queue.enqueue("door.mp3".into());
/// # }
/// ```
pub struct PlaybackWorker<P: Player> {
    receiver: PlaybackReceiver,
    player: P,
}

impl<P: Player> PlaybackWorker<P> {
    pub fn new(receiver: PlaybackReceiver, player: P) -> Self {
        PlaybackWorker { receiver, player }
    }

    /// Runs until every [`PlaybackQueue`](crate::playback::PlaybackQueue) handle is dropped.
    pub async fn run(mut self) {
        info!("playback worker started");

        while let Some(target) = self.receiver.next().await {
            debug!("working on '{}'", target);

            match self.play(&target).await {
                Ok(PlayOutcome::Finished(Some(0))) => debug!("played '{}'", target),
                Ok(PlayOutcome::Finished(code)) => {
                    info!("player exited with code {:?} for '{}'", code, target)
                }
                Ok(PlayOutcome::TimedOut) => info!("playback of '{}' timed out", target),
                Err(e) => error!("cannot play '{}': {}", target, e),
            }
        }

        info!("playback queue closed, stopping playback worker");
    }

    async fn play(&self, target: &PlaybackTarget) -> Result<PlayOutcome, PlayError> {
        // Checked at load time already, the file may have been removed since.
        if !fs::try_exists(target.as_path()).await.unwrap_or(false) {
            return Err(PlayError::MediaMissing(target.clone()));
        }

        self.player.play(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{MockPlayer, playback_queue};
    use mockall::{Sequence, predicate::eq};
    use tempfile::TempDir;

    fn media(dir: &TempDir, name: &str) -> PlaybackTarget {
        let path = dir.path().join(name);
        std::fs::write(&path, b"ID3").unwrap();
        PlaybackTarget::new(path)
    }

    #[tokio::test]
    async fn test_plays_in_queue_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = media(&dir, "a.mp3");
        let b = media(&dir, "b.mp3");

        let mut player = MockPlayer::new();
        let mut seq = Sequence::new();
        for target in [a.clone(), b.clone(), a.clone()] {
            player
                .expect_play()
                .with(eq(target))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(PlayOutcome::Finished(Some(0))));
        }

        let (queue, receiver) = playback_queue();
        queue.enqueue(a.clone());
        queue.enqueue(b);
        queue.enqueue(a);
        drop(queue);

        PlaybackWorker::new(receiver, player).run().await;
    }

    #[tokio::test]
    async fn test_missing_media_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let present = media(&dir, "present.mp3");
        let missing = PlaybackTarget::new(dir.path().join("missing.mp3"));

        let mut player = MockPlayer::new();
        player
            .expect_play()
            .with(eq(present.clone()))
            .times(1)
            .returning(|_| Ok(PlayOutcome::Finished(Some(0))));

        let (queue, receiver) = playback_queue();
        queue.enqueue(missing);
        queue.enqueue(present);
        drop(queue);

        PlaybackWorker::new(receiver, player).run().await;
    }

    #[tokio::test]
    async fn test_continues_after_timeout_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let slow = media(&dir, "slow.mp3");
        let broken = media(&dir, "broken.mp3");
        let next = media(&dir, "next.mp3");

        let mut player = MockPlayer::new();
        let mut seq = Sequence::new();
        player
            .expect_play()
            .with(eq(slow.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PlayOutcome::TimedOut));
        player
            .expect_play()
            .with(eq(broken.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(PlayError::Spawn {
                    executable: "mpg123".to_string(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                })
            });
        player
            .expect_play()
            .with(eq(next.clone()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(PlayOutcome::Finished(Some(1))));

        let (queue, receiver) = playback_queue();
        queue.enqueue(slow);
        queue.enqueue(broken);
        queue.enqueue(next);
        drop(queue);

        PlaybackWorker::new(receiver, player).run().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_frees_worker_for_next_target() {
        use crate::playback::ProcessPlayer;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("played.log");
        let script = format!("echo \"$1\" >> {:?}; exec sleep 30", log.to_str().unwrap());
        let player = ProcessPlayer::new(
            "sh",
            vec!["-c".to_string(), script, "sh".to_string()],
            Duration::from_millis(200),
        );

        let (queue, receiver) = playback_queue();
        queue.enqueue(media(&dir, "first.mp3"));
        queue.enqueue(media(&dir, "second.mp3"));
        drop(queue);

        let start = Instant::now();
        PlaybackWorker::new(receiver, player).run().await;
        assert!(start.elapsed() < Duration::from_secs(10));

        let played = std::fs::read_to_string(&log).unwrap();
        let played: Vec<&str> = played.lines().collect();
        assert_eq!(played.len(), 2);
        assert!(played[0].ends_with("first.mp3"));
        assert!(played[1].ends_with("second.mp3"));
    }
}
