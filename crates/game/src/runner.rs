//! The game loop.

use std::time::Duration;

use mathtiles_core::GameEvent;
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::state::{GameState, RoundPhase, Scheduled, TimerAction};

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSummary {
    /// Level when the game ended
    pub level: u32,
    /// Rounds started
    pub rounds: u64,
    /// Play time
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    at: Instant,
    action: TimerAction,
}

impl Pending {
    fn arm(scheduled: Scheduled) -> Self {
        Self {
            at: Instant::now() + scheduled.delay,
            action: scheduled.action,
        }
    }
}

/// Drives a [`GameState`] from player events and its own timers.
///
/// Events and timer firings are handled one at a time on the calling task,
/// so no two transitions ever overlap. At most one timer is pending.
pub struct GameRunner {
    state: GameState,
}

impl GameRunner {
    /// Create a runner.
    pub fn new(state: GameState) -> Self {
        Self { state }
    }

    /// The game state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Play until the game finishes.
    ///
    /// The first round starts immediately. The game finishes on
    /// [`GameEvent::GameFinished`] or when `events` closes.
    pub async fn run(mut self, mut events: mpsc::Receiver<GameEvent>) -> GameSummary {
        info!("Starting game at level {}", self.state.level());
        let mut pending = Some(Pending::arm(self.state.start_round()));

        while self.state.phase() != RoundPhase::Finished {
            let deadline = pending.map(|p| p.at);

            tokio::select! {
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some(timer) = pending.take() {
                        pending = self.state.on_timer(timer.action).map(Pending::arm);
                    }
                }
                event = events.recv() => match event {
                    Some(event) => {
                        debug!("Handling {:?}", event);
                        if let Some(next) = self.state.handle(event) {
                            pending = Some(Pending::arm(next));
                        }
                    }
                    None => {
                        info!("Event source closed");
                        self.state.on_game_finished();
                    }
                },
            }
        }

        GameSummary {
            level: self.state.level(),
            rounds: self.state.rounds(),
            elapsed: self.state.elapsed(),
        }
    }
}
