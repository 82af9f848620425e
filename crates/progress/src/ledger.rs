//! Progress ledger: sessions and account level in the remote store.
//!
//! The store has no transactions. Session numbers are picked as the highest
//! existing number plus one, so two sessions started at the same moment for
//! the same player can pick the same number; the later write then replaces
//! the earlier document. That is accepted, not detected.

use std::sync::Arc;

use mathtiles_core::{PlayerIdentity, SessionNumber, MIN_LEVEL};
use mathtiles_storage::{
    fields, Document, DocumentStore, EqualityQuery, FieldValue, Fields, ResponseParser,
    StorageError,
};
use tracing::{debug, error, info, warn};

use crate::schema::LedgerSchema;

/// Error type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while reading or writing progress.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Store call failed
    #[error("store error: {0}")]
    Storage(#[from] StorageError),

    /// No account matches the player identity
    #[error("no account found for {0}")]
    AccountNotFound(String),

    /// No player is logged in
    #[error("no player identity")]
    NoPlayer,

    /// The highest stored session number cannot be followed
    #[error("no session number after {0}")]
    SessionNumbersExhausted(u64),
}

/// A created session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Owner of the session
    pub player: PlayerIdentity,

    /// Full name of the owning account document
    pub account_name: String,

    /// Session number (document id)
    pub number: SessionNumber,

    /// Full name of the session document
    pub document_name: String,

    /// Level when the session started
    pub starting_level: u32,
}

/// Client for the progress records of players.
pub struct ProgressLedger {
    store: Arc<dyn DocumentStore>,
    schema: LedgerSchema,
}

impl ProgressLedger {
    /// Create a ledger over `store` with the default schema.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            schema: LedgerSchema::default(),
        }
    }

    /// Use another schema.
    pub fn with_schema(mut self, schema: LedgerSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Names in use.
    pub fn schema(&self) -> &LedgerSchema {
        &self.schema
    }

    /// Full name of the player's account document.
    ///
    /// A document-id identity is addressed directly; a username is looked up
    /// with an equality query, and `None` means no account matched.
    pub async fn account_name(&self, player: &PlayerIdentity) -> Result<Option<String>> {
        match player {
            _ if player.is_empty() => Err(LedgerError::NoPlayer),
            PlayerIdentity::DocumentId(id) => Ok(Some(format!(
                "{}/{}/{}",
                self.store.documents_root(),
                self.schema.accounts_collection,
                id
            ))),
            PlayerIdentity::Username(_) => {
                let reply = self.store.run_query(&self.identity_query(player)).await?;
                Ok(ResponseParser::new(reply).first_document_name())
            }
        }
    }

    /// Start a new session numbered one above the player's highest.
    ///
    /// A player with no sessions gets [`SessionNumber::FIRST`]. The record
    /// stores `starting_level`, zeroed progress and the creation time.
    pub async fn resolve_or_create_session(
        &self,
        player: &PlayerIdentity,
        starting_level: u32,
    ) -> Result<SessionHandle> {
        let account_name = self.require_account(player).await?;
        let sessions = &self.schema.sessions_collection;

        let reply = self
            .store
            .list_documents(&account_name, sessions, Some(self.schema.session_page_size))
            .await?;
        let highest = ResponseParser::new(reply).max_trailing_id(sessions);
        debug!("Highest session for {}: {:?}", player, highest);
        let number = SessionNumber::next_after(highest)
            .ok_or(LedgerError::SessionNumbersExhausted(highest.unwrap_or(u64::MAX)))?;

        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let record: Fields = fields([
            (self.schema.elapsed_field.clone(), FieldValue::Integer(0)),
            (self.schema.level_gain_field.clone(), FieldValue::Integer(0)),
            (self.schema.start_level_field.clone(), FieldValue::from(starting_level)),
            (self.schema.start_time_field.clone(), FieldValue::String(now.clone())),
            (self.schema.updated_field.clone(), FieldValue::String(now)),
        ]);

        let id = number.to_string();
        let reply = self
            .store
            .create_document(&account_name, sessions, Some(&id), &record)
            .await?;
        let document_name = ResponseParser::new(reply)
            .first_document_name()
            .unwrap_or_else(|| format!("{}/{}/{}", account_name, sessions, id));

        info!("Created session {} for {}", number, player);
        Ok(SessionHandle {
            player: player.clone(),
            account_name,
            number,
            document_name,
            starting_level,
        })
    }

    /// Overwrite one field of a session record.
    pub async fn patch_session_field(
        &self,
        session: &SessionHandle,
        field: &str,
        value: FieldValue,
    ) -> Result<()> {
        let update = fields([(field, value)]);
        match self.store.patch_document(&session.document_name, &update).await {
            Ok(_) => {
                debug!("Session {} field {} updated", session.number, field);
                Ok(())
            }
            Err(e) => {
                error!("Failed to update session {} field {}: {}", session.number, field, e);
                Err(e.into())
            }
        }
    }

    /// Overwrite one field of the player's account record.
    pub async fn patch_account_field(
        &self,
        player: &PlayerIdentity,
        field: &str,
        value: FieldValue,
    ) -> Result<()> {
        let account_name = self.require_account(player).await?;
        let update = fields([(field, value)]);
        match self.store.patch_document(&account_name, &update).await {
            Ok(_) => {
                debug!("Account {} field {} updated", player, field);
                Ok(())
            }
            Err(e) => {
                error!("Failed to update account {} field {}: {}", player, field, e);
                Err(e.into())
            }
        }
    }

    /// Stored level of the player, or `None` when there is no account.
    ///
    /// An account without a level field gets one written with value 1 and
    /// reads as level 1; a failed repair write is logged only.
    pub async fn load_account_level(&self, player: &PlayerIdentity) -> Result<Option<u32>> {
        let Some(account) = self.fetch_account(player).await? else {
            return Ok(None);
        };
        let account_name = account.name.as_str();

        if let Some(level) = account.integer(&self.schema.level_field) {
            let level = u32::try_from(level.max(i64::from(MIN_LEVEL))).unwrap_or(u32::MAX);
            debug!("Loaded level {} for {}", level, player);
            return Ok(Some(level));
        }

        warn!(
            "Account {} has no {} field, creating it with {}",
            player, self.schema.level_field, MIN_LEVEL
        );
        let repair = fields([(self.schema.level_field.as_str(), FieldValue::from(MIN_LEVEL))]);
        if let Err(e) = self.store.patch_document(account_name, &repair).await {
            warn!("Could not create {} for {}: {}", self.schema.level_field, player, e);
        }
        Ok(Some(MIN_LEVEL))
    }

    async fn require_account(&self, player: &PlayerIdentity) -> Result<String> {
        self.account_name(player)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(player.to_string()))
    }

    /// The player's account document; the first match for a username.
    async fn fetch_account(&self, player: &PlayerIdentity) -> Result<Option<Document>> {
        let reply = match player {
            _ if player.is_empty() => return Err(LedgerError::NoPlayer),
            PlayerIdentity::DocumentId(_) => {
                let Some(name) = self.account_name(player).await? else {
                    return Ok(None);
                };
                match self.store.get_document(&name).await? {
                    Some(payload) => payload,
                    None => return Ok(None),
                }
            }
            PlayerIdentity::Username(_) => {
                self.store.run_query(&self.identity_query(player)).await?
            }
        };
        Ok(ResponseParser::new(reply).documents().into_iter().next())
    }

    fn identity_query(&self, player: &PlayerIdentity) -> EqualityQuery {
        EqualityQuery::new(
            self.schema.accounts_collection.as_str(),
            self.schema.identity_field.as_str(),
            player.as_str(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mathtiles_storage::InMemoryStore;

    async fn setup() -> (Arc<InMemoryStore>, ProgressLedger, String) {
        let store = Arc::new(InMemoryStore::new("p"));
        let account = store
            .insert("childaccounts", "acc1", fields([("username", "lizzy")]))
            .await;
        let ledger = ProgressLedger::new(store.clone());
        (store, ledger, account)
    }

    async fn seed_session(store: &InMemoryStore, account: &str, id: &str) {
        store
            .create_document(account, "lizzyprogress", Some(id), &Fields::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_first_session_is_one() {
        let (store, ledger, account) = setup().await;
        let player = PlayerIdentity::username("lizzy");

        let session = ledger.resolve_or_create_session(&player, 2).await.unwrap();

        assert_eq!(session.number, SessionNumber(1));
        assert_eq!(session.account_name, account);
        assert_eq!(session.document_name, format!("{}/lizzyprogress/1", account));

        let doc = store.document(&session.document_name).await.unwrap();
        assert_eq!(doc.get("startLevel"), Some(&FieldValue::Integer(2)));
        assert_eq!(doc.get("lprogress"), Some(&FieldValue::Integer(0)));
        assert!(doc.get("startTime").and_then(FieldValue::as_str).is_some());
        assert!(doc.get("timestamp").and_then(FieldValue::as_str).is_some());
    }

    #[tokio::test]
    async fn test_session_follows_highest() {
        let (store, ledger, account) = setup().await;
        for id in ["0", "1", "2"] {
            seed_session(&store, &account, id).await;
        }

        let session = ledger
            .resolve_or_create_session(&PlayerIdentity::username("lizzy"), 1)
            .await
            .unwrap();
        assert_eq!(session.number, SessionNumber(3));
    }

    #[tokio::test]
    async fn test_session_numbering_ignores_gaps_and_order() {
        let (store, ledger, account) = setup().await;
        for id in ["7", "10", "3"] {
            seed_session(&store, &account, id).await;
        }
        let session = ledger
            .resolve_or_create_session(&PlayerIdentity::document_id("acc1"), 1)
            .await
            .unwrap();
        assert_eq!(session.number, SessionNumber(11));
    }

    #[tokio::test]
    async fn test_session_number_at_max_is_an_error() {
        let (store, ledger, account) = setup().await;
        seed_session(&store, &account, "18446744073709551615").await;

        let err = ledger
            .resolve_or_create_session(&PlayerIdentity::username("lizzy"), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::SessionNumbersExhausted(u64::MAX)));
        assert!(store
            .document(&format!("{}/lizzyprogress/0", account))
            .await
            .is_none());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_patch_session_round_trip() {
        let (store, ledger, _account) = setup().await;
        let session = ledger
            .resolve_or_create_session(&PlayerIdentity::username("lizzy"), 4)
            .await
            .unwrap();
        let before = store.document(&session.document_name).await.unwrap();

        ledger
            .patch_session_field(&session, "lprogress", FieldValue::Integer(93))
            .await
            .unwrap();

        let after = store.document(&session.document_name).await.unwrap();
        assert_eq!(after.get("lprogress"), Some(&FieldValue::Integer(93)));
        assert_eq!(after.get("startLevel"), before.get("startLevel"));
        assert_eq!(after.get("startTime"), before.get("startTime"));
        assert_eq!(after.get("timestamp"), before.get("timestamp"));
    }

    #[tokio::test]
    async fn test_reused_number_overwrites_session() {
        let (store, ledger, account) = setup().await;
        let player = PlayerIdentity::username("lizzy");
        seed_session(&store, &account, "1").await;
        ledger
            .patch_session_field(
                &ledger.resolve_or_create_session(&player, 1).await.unwrap(),
                "lprogress",
                FieldValue::Integer(40),
            )
            .await
            .unwrap();

        // A racing start that listed before session 2 existed writes the
        // same number again and replaces the record.
        let name = format!("{}/lizzyprogress/2", account);
        store
            .create_document(&account, "lizzyprogress", Some("2"), &fields([("startLevel", 7i64)]))
            .await
            .unwrap();
        let doc = store.document(&name).await.unwrap();
        assert_eq!(doc.get("lprogress"), None);
        assert_eq!(doc.get("startLevel"), Some(&FieldValue::Integer(7)));
    }

    #[tokio::test]
    async fn test_session_for_unknown_player() {
        let (_store, ledger, _account) = setup().await;
        let err = ledger
            .resolve_or_create_session(&PlayerIdentity::username("nobody"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccountNotFound(_)));

        let err = ledger
            .resolve_or_create_session(&PlayerIdentity::username(""), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoPlayer));
    }

    #[tokio::test]
    async fn test_session_list_failure_aborts() {
        let (store, ledger, _account) = setup().await;
        store.set_offline(true);
        let err = ledger
            .resolve_or_create_session(&PlayerIdentity::document_id("acc1"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Storage(StorageError::Unavailable(_))));
        store.set_offline(false);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_patch_account_field() {
        let (store, ledger, account) = setup().await;
        let player = PlayerIdentity::username("lizzy");

        ledger
            .patch_account_field(&player, "renzolvl", FieldValue::Integer(6))
            .await
            .unwrap();

        let doc = store.document(&account).await.unwrap();
        assert_eq!(doc.get("renzolvl"), Some(&FieldValue::Integer(6)));
        assert_eq!(doc.get("username"), Some(&FieldValue::from("lizzy")));
    }

    #[tokio::test]
    async fn test_load_level_repairs_missing_field() {
        let (store, ledger, account) = setup().await;
        let player = PlayerIdentity::username("lizzy");

        assert_eq!(ledger.load_account_level(&player).await.unwrap(), Some(1));

        let doc = store.document(&account).await.unwrap();
        assert_eq!(doc.get("renzolvl"), Some(&FieldValue::Integer(1)));
    }

    #[tokio::test]
    async fn test_load_level_existing() {
        let (store, ledger, _account) = setup().await;
        store
            .insert(
                "childaccounts",
                "acc2",
                fields([
                    ("username", FieldValue::from("renzo")),
                    ("renzolvl", FieldValue::Integer(5)),
                ]),
            )
            .await;

        let by_name = ledger
            .load_account_level(&PlayerIdentity::username("renzo"))
            .await
            .unwrap();
        let by_id = ledger
            .load_account_level(&PlayerIdentity::document_id("acc2"))
            .await
            .unwrap();
        assert_eq!(by_name, Some(5));
        assert_eq!(by_id, Some(5));
    }

    #[tokio::test]
    async fn test_load_level_reads_first_match_only() {
        let (store, ledger, account) = setup().await;
        let other = store
            .insert(
                "childaccounts",
                "acc2",
                fields([
                    ("username", FieldValue::from("lizzy")),
                    ("renzolvl", FieldValue::Integer(8)),
                ]),
            )
            .await;

        let level = ledger
            .load_account_level(&PlayerIdentity::username("lizzy"))
            .await
            .unwrap();

        assert_eq!(level, Some(1));
        let first = store.document(&account).await.unwrap();
        assert_eq!(first.get("renzolvl"), Some(&FieldValue::Integer(1)));
        let second = store.document(&other).await.unwrap();
        assert_eq!(second.get("renzolvl"), Some(&FieldValue::Integer(8)));
    }

    #[tokio::test]
    async fn test_load_level_absent_account() {
        let (store, ledger, _account) = setup().await;
        assert_eq!(
            ledger
                .load_account_level(&PlayerIdentity::username("nobody"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(
            ledger
                .load_account_level(&PlayerIdentity::document_id("missing"))
                .await
                .unwrap(),
            None
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_load_level_clamps_stored_zero() {
        let (store, ledger, _account) = setup().await;
        store
            .insert(
                "childaccounts",
                "acc3",
                fields([("renzolvl", FieldValue::Integer(0))]),
            )
            .await;
        assert_eq!(
            ledger
                .load_account_level(&PlayerIdentity::document_id("acc3"))
                .await
                .unwrap(),
            Some(1)
        );
    }
}
