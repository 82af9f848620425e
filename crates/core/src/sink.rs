//! Where gameplay reports progress.

use std::time::Duration;

/// Receiver of level and timing changes.
///
/// Calls must return immediately. Implementations that talk to a remote
/// store start their own background work and never report back into the
/// game.
pub trait ProgressSink: Send + Sync {
    /// The level changed (either direction, including staying at the floor).
    fn level_changed(&self, level: u32);

    /// The game reached its end after `elapsed` play time.
    fn game_finished(&self, elapsed: Duration);
}

/// Sink for offline play.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn level_changed(&self, _level: u32) {}

    fn game_finished(&self, _elapsed: Duration) {}
}
