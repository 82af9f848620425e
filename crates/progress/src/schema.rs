//! Collection and field names of the progress records.

use serde::{Deserialize, Serialize};

/// Names used for accounts and sessions in the store.
///
/// Defaults match the records written by earlier clients, so existing data
/// keeps working.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSchema {
    /// Top-level collection of player accounts
    pub accounts_collection: String,

    /// Account field holding the username
    pub identity_field: String,

    /// Account field holding the cumulative level
    pub level_field: String,

    /// Subcollection of an account holding numbered sessions
    pub sessions_collection: String,

    /// Session field holding whole elapsed seconds
    pub elapsed_field: String,

    /// Session field holding levels gained since the session started
    pub level_gain_field: String,

    /// Session field holding the level at session start
    pub start_level_field: String,

    /// Session field holding the creation time
    pub start_time_field: String,

    /// Session field holding the creation time, as earlier clients wrote it
    pub updated_field: String,

    /// Page size when listing sessions
    pub session_page_size: u32,
}

impl Default for LedgerSchema {
    fn default() -> Self {
        Self {
            accounts_collection: "childaccounts".to_string(),
            identity_field: "username".to_string(),
            level_field: "renzolvl".to_string(),
            sessions_collection: "lizzyprogress".to_string(),
            elapsed_field: "lprogress".to_string(),
            level_gain_field: "levelGain".to_string(),
            start_level_field: "startLevel".to_string(),
            start_time_field: "startTime".to_string(),
            updated_field: "timestamp".to_string(),
            session_page_size: 1000,
        }
    }
}
