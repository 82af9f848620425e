//! Events exchanged with the display collaborator.

use serde::{Deserialize, Serialize};

/// Player action reported by the display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A numbered tile was clicked.
    TileClicked(u32),
    /// The answer field was submitted with this raw text.
    AnswerSubmitted(String),
    /// The terminal screen was reached.
    GameFinished,
}
