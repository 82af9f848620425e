//! Player identities used to locate progress records.

use serde::{Deserialize, Serialize};

/// Identity of the already-authenticated player.
///
/// The login flow hands over either the username typed at sign-in or the
/// account document id it resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerIdentity {
    /// Username, matched by equality against the account identity field.
    Username(String),
    /// Account document id, addressed directly.
    DocumentId(String),
}

impl PlayerIdentity {
    /// Username identity.
    pub fn username(name: impl Into<String>) -> Self {
        Self::Username(name.into())
    }

    /// Document id identity.
    pub fn document_id(id: impl Into<String>) -> Self {
        Self::DocumentId(id.into())
    }

    /// Raw identity string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Username(s) | Self::DocumentId(s) => s,
        }
    }

    /// True when the identity string is empty (no player logged in).
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl std::fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Username(name) => write!(f, "user:{}", name),
            Self::DocumentId(id) => write!(f, "doc:{}", id),
        }
    }
}

/// Per-player session number, the document id of a session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionNumber(pub u64);

impl SessionNumber {
    /// Number given to the first session of a player.
    pub const FIRST: SessionNumber = SessionNumber(1);

    /// Number following the highest existing one, or [`SessionNumber::FIRST`].
    ///
    /// `None` when `highest` is already `u64::MAX`.
    pub fn next_after(highest: Option<u64>) -> Option<Self> {
        match highest {
            Some(n) => n.checked_add(1).map(Self),
            None => Some(Self::FIRST),
        }
    }
}

impl std::fmt::Display for SessionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
