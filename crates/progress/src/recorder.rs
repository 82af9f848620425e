//! Fire-and-forget persistence of gameplay progress.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use mathtiles_core::{PlayerIdentity, ProgressSink};
use mathtiles_storage::FieldValue;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::ledger::{ProgressLedger, SessionHandle};

/// [`ProgressSink`] that writes to the ledger on background tasks.
///
/// Each notification spawns its own task and returns at once. Failures are
/// logged and dropped; nothing is retried and nothing flows back into
/// gameplay. Writes may land in any order (last write wins).
pub struct LedgerSink {
    ledger: Arc<ProgressLedger>,
    player: PlayerIdentity,
    session: Option<SessionHandle>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl LedgerSink {
    /// Create a sink for `player`. Without a session only the account level
    /// is written.
    pub fn new(
        ledger: Arc<ProgressLedger>,
        player: PlayerIdentity,
        session: Option<SessionHandle>,
    ) -> Self {
        Self {
            ledger,
            player,
            session,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Session being updated, if one was created.
    pub fn session(&self) -> Option<&SessionHandle> {
        self.session.as_ref()
    }

    /// Wait for every write started so far.
    pub async fn drain(&self) {
        let pending = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        debug!("Waiting for {} persistence tasks", pending.len());
        for handle in pending {
            if let Err(e) = handle.await {
                warn!("Persistence task failed: {}", e);
            }
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime, progress not saved");
            return;
        };
        let handle = runtime.spawn(task);
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }
}

impl ProgressSink for LedgerSink {
    fn level_changed(&self, level: u32) {
        let ledger = self.ledger.clone();
        let player = self.player.clone();
        let session = self.session.clone();

        self.spawn(async move {
            let schema = ledger.schema();
            if let Err(e) = ledger
                .patch_account_field(&player, &schema.level_field, FieldValue::from(level))
                .await
            {
                warn!("Level {} not saved for {}: {}", level, player, e);
            }

            if let Some(session) = session {
                let gain = i64::from(level) - i64::from(session.starting_level);
                if let Err(e) = ledger
                    .patch_session_field(&session, &schema.level_gain_field, FieldValue::Integer(gain))
                    .await
                {
                    warn!("Level gain not saved for session {}: {}", session.number, e);
                }
            }
        });
    }

    fn game_finished(&self, elapsed: Duration) {
        let Some(session) = self.session.clone() else {
            warn!("No session, elapsed time of {}s not saved", elapsed.as_secs());
            return;
        };
        let ledger = self.ledger.clone();

        self.spawn(async move {
            let seconds = FieldValue::from(elapsed.as_secs());
            if let Err(e) = ledger
                .patch_session_field(&session, &ledger.schema().elapsed_field, seconds)
                .await
            {
                warn!("Elapsed time not saved for session {}: {}", session.number, e);
            }
        });
    }
}
