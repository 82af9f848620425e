//! Round state machine.
//!
//! [`GameState`] reacts to one input at a time: a player event or a timer
//! firing. It never sleeps itself; any delay it needs comes back to the
//! caller as a [`Scheduled`] action, which the caller feeds to
//! [`GameState::on_timer`] once the delay has passed.

use std::sync::Arc;
use std::time::Duration;

use mathtiles_core::{
    DifficultyProfile, ExpressionEngine, FailurePolicy, GameEvent, ProgressSink, Sequence,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::clock::SessionClock;
use crate::display::GameDisplay;
use crate::timing::RoundTiming;

/// Player-facing feedback lines.
pub mod feedback {
    /// Shown once the whole sequence has been revealed.
    pub const CLICK_TILES: &str = "Click the tiles in the order you remember!";
    /// Shown once every tile was clicked in order.
    pub const SOLVE: &str = "Now solve the math problem!";
    /// Shown when an answer arrives before the tiles.
    pub const CLICK_FIRST: &str = "First, click the tiles in order!";
    /// Shown when the answer is not a number.
    pub const ENTER_NUMBER: &str = "Please enter a number.";
    /// Shown on a correct answer.
    pub const CORRECT: &str = "Correct! Level up!";
    /// Wrong tile, decrement policy.
    pub const WRONG_TILE: &str = "Wrong! Level down!";
    /// Wrong answer, decrement policy.
    pub const WRONG_ANSWER: &str = "Math answer is wrong. Level down!";
    /// Wrong tile, reset policy.
    pub const WRONG_TILE_RESET: &str = "Wrong! Game Over.";
    /// Wrong answer, reset policy.
    pub const WRONG_ANSWER_RESET: &str = "Math answer is wrong. Game Over.";
}

/// Where the current round is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Operands are being highlighted
    Showing,
    /// Waiting for the operands to be clicked back in order
    AwaitingTileInput,
    /// Waiting for the value of the expression
    AwaitingAnswer,
    /// Cooling down after a mistake
    Transitioning,
    /// The game is over; every event is ignored
    Finished,
}

/// Work the state machine wants done after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Highlight operand `n`, or finish the reveal when `n` is past the end
    Reveal(usize),
    /// Start the next round
    NextRound,
}

/// A [`TimerAction`] and how long to wait before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled {
    /// Wait before running
    pub delay: Duration,
    /// What to run
    pub action: TimerAction,
}

#[derive(Debug, Clone, Copy)]
enum Mistake {
    WrongTile,
    WrongAnswer,
}

/// Game state for one player session.
pub struct GameState {
    engine: ExpressionEngine,
    profile: DifficultyProfile,
    policy: FailurePolicy,
    timing: RoundTiming,
    tiles: Vec<u32>,
    phase: RoundPhase,
    phase_tx: watch::Sender<RoundPhase>,
    sequence: Sequence,
    player_input: Vec<u32>,
    rounds: u64,
    rng: StdRng,
    clock: SessionClock,
    display: Arc<dyn GameDisplay>,
    sink: Arc<dyn ProgressSink>,
}

impl GameState {
    /// New game at level 1 with default tiles, timing and policy.
    pub fn new(display: Arc<dyn GameDisplay>, sink: Arc<dyn ProgressSink>) -> Self {
        let (phase_tx, _) = watch::channel(RoundPhase::Showing);
        Self {
            engine: ExpressionEngine::default(),
            profile: DifficultyProfile::default(),
            policy: FailurePolicy::default(),
            timing: RoundTiming::default(),
            tiles: (1..=9).collect(),
            phase: RoundPhase::Showing,
            phase_tx,
            sequence: Sequence::default(),
            player_input: Vec::new(),
            rounds: 0,
            rng: StdRng::from_os_rng(),
            clock: SessionClock::start(),
            display,
            sink,
        }
    }

    /// Start at `level` instead of 1.
    pub fn with_level(mut self, level: u32) -> Self {
        self.profile = DifficultyProfile::new(level);
        self
    }

    /// Set the failure policy.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the round timing.
    pub fn with_timing(mut self, timing: RoundTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set the expression engine.
    pub fn with_engine(mut self, engine: ExpressionEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Set the tiles present on the board.
    pub fn with_tiles(mut self, tiles: impl IntoIterator<Item = u32>) -> Self {
        self.tiles = tiles.into_iter().collect();
        self
    }

    /// Draw sequences from a seeded generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Watch phase changes from another task.
    pub fn subscribe_phase(&self) -> watch::Receiver<RoundPhase> {
        self.phase_tx.subscribe()
    }

    /// Current level.
    pub fn level(&self) -> u32 {
        self.profile.level()
    }

    /// Current difficulty.
    pub fn profile(&self) -> DifficultyProfile {
        self.profile
    }

    /// Sequence of the current round.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Tiles clicked so far this round.
    pub fn player_input(&self) -> &[u32] {
        &self.player_input
    }

    /// Rounds started so far.
    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Play time so far.
    pub fn elapsed(&self) -> Duration {
        self.clock.elapsed()
    }

    /// Start a round with a freshly drawn sequence.
    pub fn start_round(&mut self) -> Scheduled {
        let sequence = self
            .engine
            .generate(self.profile.sequence_length(), &mut self.rng);
        self.start_round_with(sequence)
    }

    /// Start a round with a given sequence.
    pub fn start_round_with(&mut self, sequence: Sequence) -> Scheduled {
        self.rounds += 1;
        info!(
            "Starting round {} at level {} ({} tiles)",
            self.rounds,
            self.profile.level(),
            sequence.len()
        );

        self.sequence = sequence;
        self.player_input.clear();
        self.display.show_problem("");
        self.display.update_level_display(self.profile.level());
        self.set_phase(RoundPhase::Showing);

        Scheduled {
            delay: self.timing.lead_in(),
            action: TimerAction::Reveal(0),
        }
    }

    /// Run a previously scheduled action.
    ///
    /// Actions that no longer match the phase are dropped.
    pub fn on_timer(&mut self, action: TimerAction) -> Option<Scheduled> {
        match (action, self.phase) {
            (TimerAction::Reveal(index), RoundPhase::Showing) => {
                match self.sequence.operands().get(index) {
                    Some(&operand) => {
                        self.highlight(operand);
                        Some(Scheduled {
                            delay: self.timing.highlight_interval(),
                            action: TimerAction::Reveal(index + 1),
                        })
                    }
                    None => {
                        self.player_input.clear();
                        self.set_phase(RoundPhase::AwaitingTileInput);
                        self.display.show_feedback(feedback::CLICK_TILES);
                        None
                    }
                }
            }
            (TimerAction::NextRound, RoundPhase::Transitioning) => Some(self.start_round()),
            (action, phase) => {
                debug!("Dropping stale {:?} in {:?}", action, phase);
                None
            }
        }
    }

    /// A tile was clicked.
    pub fn on_tile_clicked(&mut self, tile: u32) -> Option<Scheduled> {
        if self.phase != RoundPhase::AwaitingTileInput {
            debug!("Ignoring tile {} in {:?}", tile, self.phase);
            return None;
        }

        self.highlight(tile);
        self.player_input.push(tile);

        let position = self.player_input.len() - 1;
        if self.sequence.operands().get(position) != Some(&tile) {
            return Some(self.fail(Mistake::WrongTile));
        }

        if self.player_input.len() == self.sequence.len() {
            self.set_phase(RoundPhase::AwaitingAnswer);
            self.display
                .show_problem(&ExpressionEngine::format(&self.sequence));
            self.display.show_feedback(feedback::SOLVE);
        }
        None
    }

    /// An answer was submitted as raw text.
    pub fn on_answer_submitted(&mut self, text: &str) -> Option<Scheduled> {
        match self.phase {
            RoundPhase::AwaitingAnswer => {}
            RoundPhase::Finished => return None,
            _ => {
                self.display.show_feedback(feedback::CLICK_FIRST);
                return None;
            }
        }

        let Some(answer) = parse_answer(text) else {
            self.display.show_feedback(feedback::ENTER_NUMBER);
            return None;
        };

        let expected = ExpressionEngine::evaluate(&self.sequence);
        if answers_match(answer, expected) {
            Some(self.succeed())
        } else {
            debug!("Answer {} does not match {}", answer, expected);
            Some(self.fail(Mistake::WrongAnswer))
        }
    }

    /// The game reached its end screen. Only the first call counts.
    pub fn on_game_finished(&mut self) {
        if self.phase == RoundPhase::Finished {
            return;
        }
        self.clock.stop();
        self.set_phase(RoundPhase::Finished);
        info!(
            "Game finished at level {} after {} rounds ({}s)",
            self.profile.level(),
            self.rounds,
            self.clock.elapsed().as_secs()
        );
        self.sink.game_finished(self.clock.elapsed());
    }

    /// Dispatch a player event.
    pub fn handle(&mut self, event: GameEvent) -> Option<Scheduled> {
        match event {
            GameEvent::TileClicked(tile) => self.on_tile_clicked(tile),
            GameEvent::AnswerSubmitted(text) => self.on_answer_submitted(&text),
            GameEvent::GameFinished => {
                self.on_game_finished();
                None
            }
        }
    }

    fn succeed(&mut self) -> Scheduled {
        self.display.show_feedback(feedback::CORRECT);
        self.profile.level_up();
        info!("Level up to {}", self.profile.level());
        self.sink.level_changed(self.profile.level());
        self.start_round()
    }

    fn fail(&mut self, mistake: Mistake) -> Scheduled {
        let message = match (mistake, self.policy) {
            (Mistake::WrongTile, FailurePolicy::DecrementWithFloor) => feedback::WRONG_TILE,
            (Mistake::WrongAnswer, FailurePolicy::DecrementWithFloor) => feedback::WRONG_ANSWER,
            (Mistake::WrongTile, FailurePolicy::ResetToFloor) => feedback::WRONG_TILE_RESET,
            (Mistake::WrongAnswer, FailurePolicy::ResetToFloor) => feedback::WRONG_ANSWER_RESET,
        };
        self.display.show_feedback(message);

        self.profile.level_down(self.policy);
        info!("{:?}, level now {}", mistake, self.profile.level());
        self.sink.level_changed(self.profile.level());
        self.set_phase(RoundPhase::Transitioning);

        Scheduled {
            delay: self.timing.cooldown(),
            action: TimerAction::NextRound,
        }
    }

    fn highlight(&self, tile: u32) {
        if self.tiles.contains(&tile) {
            self.display.highlight_tile(tile);
        } else {
            debug!("No tile {} on the board", tile);
        }
    }

    fn set_phase(&mut self, phase: RoundPhase) {
        self.phase = phase;
        self.phase_tx.send_replace(phase);
    }
}

/// Parse a submitted answer. Only finite numbers count.
fn parse_answer(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Equal up to `f64` rounding. Integer results compare exactly.
fn answers_match(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}
