//! Serialized playback of matched sound files.
//!
//! Request handlers push [`PlaybackTarget`]s on a [`PlaybackQueue`]; a single
//! [`PlaybackWorker`] task pulls them one at a time and hands them to a
//! [`Player`]. At most one player process runs at any time, so overlapping
//! alerts queue up instead of playing on top of each other.
//!
//! ```text
//! handler ─┐
//! handler ─┼─ enqueue ─▶ PlaybackQueue ─▶ PlaybackWorker ─▶ ProcessPlayer (mpg123 -q file)
//! handler ─┘
//! ```
//!
//! # Modules
//!
//! - `queue` - unbounded FIFO shared by the request handlers
//! - `player` - the [`Player`] trait and its subprocess implementation
//! - `worker` - the consumer loop

use std::{
    fmt,
    path::{Path, PathBuf},
};

mod player;
mod queue;
mod worker;

#[cfg(test)]
pub use crate::playback::player::MockPlayer;
pub use crate::playback::player::{PlayError, PlayOutcome, Player, ProcessPlayer};
pub use crate::playback::queue::{PlaybackQueue, PlaybackReceiver, playback_queue};
pub use crate::playback::worker::PlaybackWorker;

/// Path of a sound file waiting to be played.
///
/// Targets are not deduplicated: a file enqueued twice plays twice.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PlaybackTarget(PathBuf);

impl PlaybackTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PlaybackTarget(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl From<&str> for PlaybackTarget {
    fn from(path: &str) -> Self {
        PlaybackTarget::new(path)
    }
}

impl fmt::Display for PlaybackTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}
