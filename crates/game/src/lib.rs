//! mathtiles gameplay.
//!
//! The round state machine, its pacing and the loop that drives it from
//! player events and timers.

#![warn(missing_docs)]

pub mod clock;
pub mod display;
pub mod runner;
pub mod state;
pub mod timing;

#[cfg(test)]
mod testing;

pub use clock::SessionClock;
pub use display::GameDisplay;
pub use runner::{GameRunner, GameSummary};
pub use state::{feedback, GameState, RoundPhase, Scheduled, TimerAction};
pub use timing::RoundTiming;
