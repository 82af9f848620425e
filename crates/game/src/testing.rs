//! Recording fakes shared by the crate's tests.

use std::sync::Mutex;
use std::time::Duration;

use mathtiles_core::ProgressSink;

use crate::display::GameDisplay;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Feedback(String),
    Problem(String),
    Highlight(u32),
    Level(u32),
}

#[derive(Default)]
pub struct RecordingDisplay {
    calls: Mutex<Vec<Call>>,
}

impl RecordingDisplay {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn highlights(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Highlight(tile) => Some(tile),
                _ => None,
            })
            .collect()
    }

    pub fn last_feedback(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Feedback(message) => Some(message),
            _ => None,
        })
    }

    pub fn last_problem(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Problem(problem) => Some(problem),
            _ => None,
        })
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl GameDisplay for RecordingDisplay {
    fn show_feedback(&self, message: &str) {
        self.push(Call::Feedback(message.to_string()));
    }

    fn show_problem(&self, problem: &str) {
        self.push(Call::Problem(problem.to_string()));
    }

    fn highlight_tile(&self, tile: u32) {
        self.push(Call::Highlight(tile));
    }

    fn update_level_display(&self, level: u32) {
        self.push(Call::Level(level));
    }
}

#[derive(Default)]
pub struct RecordingSink {
    levels: Mutex<Vec<u32>>,
    finished: Mutex<Vec<Duration>>,
}

impl RecordingSink {
    pub fn levels(&self) -> Vec<u32> {
        self.levels.lock().unwrap().clone()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.lock().unwrap().len()
    }

    pub fn finished_elapsed(&self) -> Option<Duration> {
        self.finished.lock().unwrap().first().copied()
    }
}

impl ProgressSink for RecordingSink {
    fn level_changed(&self, level: u32) {
        self.levels.lock().unwrap().push(level);
    }

    fn game_finished(&self, elapsed: Duration) {
        self.finished.lock().unwrap().push(elapsed);
    }
}
