//! Rendering seam.

/// Renders game state for the player.
///
/// Implementations only draw; they never call back into the game. Player
/// actions arrive separately as [`mathtiles_core::GameEvent`]s.
pub trait GameDisplay: Send + Sync {
    /// Show a short feedback line.
    fn show_feedback(&self, message: &str);

    /// Show the problem text; an empty string clears it.
    fn show_problem(&self, problem: &str);

    /// Flash the tile with this number.
    fn highlight_tile(&self, tile: u32);

    /// Show the current level.
    fn update_level_display(&self, level: u32);
}
