//! Line-based terminal front end.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use mathtiles_core::GameEvent;
use mathtiles_game::{GameDisplay, RoundPhase};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Command that ends the game.
pub const QUIT: &str = "quit";

/// Draws the game as plain lines on a writer.
///
/// Highlights are drawn over each other on one line so earlier tiles do not
/// stay readable.
pub struct TerminalDisplay<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalDisplay<io::Stdout> {
    /// Display on standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalDisplay<W> {
    /// Display on `out`.
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            debug!("Display write failed: {}", e);
        }
    }
}

impl<W: Write + Send> GameDisplay for TerminalDisplay<W> {
    fn show_feedback(&self, message: &str) {
        self.write(&format!("\r\x1b[K{}\n", message));
    }

    fn show_problem(&self, problem: &str) {
        if !problem.is_empty() {
            self.write(&format!("\r\x1b[K  {}\n", problem));
        }
    }

    fn highlight_tile(&self, tile: u32) {
        self.write(&format!("\r\x1b[K  [ {} ]", tile));
    }

    fn update_level_display(&self, level: u32) {
        self.write(&format!("\r\x1b[K-- Level {} --\n", level));
    }
}

/// Turn one input line into events for the current phase.
///
/// While tiles are awaited a line of whitespace-separated numbers is a run of
/// tile clicks; anything else is an answer.
pub fn parse_line(line: &str, phase: RoundPhase) -> Vec<GameEvent> {
    let line = line.trim();
    if line.is_empty() {
        return Vec::new();
    }
    if line.eq_ignore_ascii_case(QUIT) {
        return vec![GameEvent::GameFinished];
    }

    if phase == RoundPhase::AwaitingTileInput {
        let tiles: Option<Vec<u32>> = line
            .split_whitespace()
            .map(|token| token.parse().ok())
            .collect();
        if let Some(tiles) = tiles {
            return tiles.into_iter().map(GameEvent::TileClicked).collect();
        }
    }

    vec![GameEvent::AnswerSubmitted(line.to_string())]
}

/// Forward lines from `reader` as events until `quit` or end of input.
///
/// End of input also finishes the game.
pub async fn read_events<R>(
    reader: R,
    phase: watch::Receiver<RoundPhase>,
    events: mpsc::Sender<GameEvent>,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let current = *phase.borrow();
        for event in parse_line(&line, current) {
            let finished = event == GameEvent::GameFinished;
            if events.send(event).await.is_err() || finished {
                return Ok(());
            }
        }
    }

    debug!("Input closed");
    let _ = events.send(GameEvent::GameFinished).await;
    Ok(())
}
