//! Play time of a session.

use std::time::Duration;

use tokio::time::Instant;

/// Stopwatch started when the game starts.
#[derive(Debug, Clone, Copy)]
pub struct SessionClock {
    started: Instant,
    stopped: Option<Instant>,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::start()
    }
}

impl SessionClock {
    /// A running clock starting now.
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            stopped: None,
        }
    }

    /// Freeze the elapsed time. Stopping twice keeps the first stop.
    pub fn stop(&mut self) {
        if self.stopped.is_none() {
            self.stopped = Some(Instant::now());
        }
    }

    /// Restart from zero.
    pub fn reset(&mut self) {
        *self = Self::start();
    }

    /// Whether the clock is still running.
    pub fn is_running(&self) -> bool {
        self.stopped.is_none()
    }

    /// Time since start, up to the stop if stopped.
    pub fn elapsed(&self) -> Duration {
        let end = self.stopped.unwrap_or_else(Instant::now);
        end.saturating_duration_since(self.started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_stop_freezes_elapsed() {
        let mut clock = SessionClock::start();
        tokio::time::advance(Duration::from_secs(65)).await;
        clock.stop();
        tokio::time::advance(Duration::from_secs(10)).await;
        clock.stop();

        assert!(!clock.is_running());
        assert_eq!(clock.elapsed().as_secs(), 65);

        clock.reset();
        assert!(clock.is_running());
        assert_eq!(clock.elapsed().as_secs(), 0);
    }
}
