//! Round pacing.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delays used while revealing a sequence and after a mistake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoundTiming {
    /// Pause before the first highlight, in milliseconds
    pub lead_in_ms: u64,

    /// Pause after each highlight, in milliseconds
    pub highlight_interval_ms: u64,

    /// Pause between a mistake and the next round, in milliseconds
    pub cooldown_ms: u64,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            lead_in_ms: 1000,
            highlight_interval_ms: 700,
            cooldown_ms: 2000,
        }
    }
}

impl RoundTiming {
    /// Pause before the first highlight.
    pub fn lead_in(&self) -> Duration {
        Duration::from_millis(self.lead_in_ms)
    }

    /// Pause after each highlight.
    pub fn highlight_interval(&self) -> Duration {
        Duration::from_millis(self.highlight_interval_ms)
    }

    /// Pause between a mistake and the next round.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Time from round start until tiles are accepted, for `length` operands.
    pub fn reveal_duration(&self, length: usize) -> Duration {
        let highlights = u32::try_from(length).unwrap_or(u32::MAX);
        self.lead_in()
            .saturating_add(self.highlight_interval().saturating_mul(highlights))
    }
}
