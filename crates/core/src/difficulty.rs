//! Level and sequence length.

use serde::{Deserialize, Serialize};

/// Lowest level a player can be at.
pub const MIN_LEVEL: u32 = 1;

/// Fewest operands a sequence can have.
pub const MIN_SEQUENCE_LENGTH: usize = 2;

/// What a mistake does to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Drop one level, never below [`MIN_LEVEL`].
    #[default]
    DecrementWithFloor,
    /// Go straight back to [`MIN_LEVEL`].
    ResetToFloor,
}

/// Current level. The sequence length is always derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    level: u32,
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self { level: MIN_LEVEL }
    }
}

impl DifficultyProfile {
    /// Profile at `level`, clamped up to [`MIN_LEVEL`].
    pub fn new(level: u32) -> Self {
        Self {
            level: level.max(MIN_LEVEL),
        }
    }

    /// Current level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Operand count for the current level: `max(2, 2 + level)`.
    pub fn sequence_length(&self) -> usize {
        (2 + self.level as usize).max(MIN_SEQUENCE_LENGTH)
    }

    /// Raise the level by one.
    pub fn level_up(&mut self) {
        self.level = self.level.saturating_add(1);
    }

    /// Lower the level according to `policy`.
    pub fn level_down(&mut self, policy: FailurePolicy) {
        self.level = match policy {
            FailurePolicy::DecrementWithFloor => self.level.saturating_sub(1).max(MIN_LEVEL),
            FailurePolicy::ResetToFloor => MIN_LEVEL,
        };
    }
}
