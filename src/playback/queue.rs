//! Hand-off between request handlers and the playback worker.

use log::{debug, error};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::playback::PlaybackTarget;

/// Producer side of the playback queue.
///
/// Cheap to clone; every request handler holds one. Enqueueing never blocks
/// and the queue is only bounded by memory.
#[derive(Clone, Debug)]
pub struct PlaybackQueue {
    sender: UnboundedSender<PlaybackTarget>,
}

/// Consumer side of the playback queue, owned by the [`PlaybackWorker`](crate::playback::PlaybackWorker).
#[derive(Debug)]
pub struct PlaybackReceiver {
    receiver: UnboundedReceiver<PlaybackTarget>,
}

/// Creates a new FIFO playback queue.
///
/// # Examples
///
/// ```
/// # use alertchime::playback::{playback_queue, PlaybackTarget};
/// # async fn example() {
/// let (queue, mut receiver) = playback_queue();
/// queue.enqueue(PlaybackTarget::from("a.mp3"));
/// queue.enqueue(PlaybackTarget::from("b.mp3"));
/// assert_eq!(receiver.next().await, Some(PlaybackTarget::from("a.mp3")));
/// # }
/// ```
pub fn playback_queue() -> (PlaybackQueue, PlaybackReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (PlaybackQueue { sender }, PlaybackReceiver { receiver })
}

impl PlaybackQueue {
    /// Appends a target at the end of the queue.
    ///
    /// The only failure is a stopped worker, in which case the target is
    /// dropped and the loss is logged.
    pub fn enqueue(&self, target: PlaybackTarget) {
        debug!("enqueue '{}'", target);
        if let Err(e) = self.sender.send(target) {
            error!("playback worker is gone, dropping '{}'", e.0);
        }
    }
}

impl PlaybackReceiver {
    /// Waits for the next target.
    ///
    /// Returns `None` once every [`PlaybackQueue`] handle has been dropped and
    /// the queue is drained.
    pub async fn next(&mut self) -> Option<PlaybackTarget> {
        self.receiver.recv().await
    }

    /// Returns the next target if one is already waiting.
    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<PlaybackTarget> {
        self.receiver.try_recv().ok()
    }
}
