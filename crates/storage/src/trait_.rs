//! Document store abstraction.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::document::{FieldValue, Fields};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status
    #[error("store returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The store cannot be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Equality filter on one field of a top-level collection.
#[derive(Debug, Clone, PartialEq)]
pub struct EqualityQuery {
    /// Collection id
    pub collection: String,
    /// Field path to compare
    pub field: String,
    /// Value the field must equal
    pub value: FieldValue,
}

impl EqualityQuery {
    /// Create a query.
    pub fn new(
        collection: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Self {
        Self {
            collection: collection.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    /// Request body for the query endpoint.
    pub fn to_json(&self) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": self.field },
                        "op": "EQUAL",
                        "value": self.value.to_json(),
                    }
                }
            }
        })
    }
}

/// A remote document store offering only query, list, get, create and
/// field-masked patch. There are no transactions.
///
/// Every method returns the raw reply payload; callers read it with
/// [`crate::ResponseParser`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Resource name under which top-level collections live.
    fn documents_root(&self) -> &str;

    /// Documents of a top-level collection matching an equality filter.
    async fn run_query(&self, query: &EqualityQuery) -> Result<Value>;

    /// Documents of `collection` directly under `parent` (a document name,
    /// or [`DocumentStore::documents_root`]).
    async fn list_documents(
        &self,
        parent: &str,
        collection: &str,
        page_size: Option<u32>,
    ) -> Result<Value>;

    /// One document by full name; `None` if it does not exist.
    async fn get_document(&self, name: &str) -> Result<Option<Value>>;

    /// Insert a document. With an explicit `id` an existing document of the
    /// same name is overwritten; without one the store picks the id.
    async fn create_document(
        &self,
        parent: &str,
        collection: &str,
        id: Option<&str>,
        fields: &Fields,
    ) -> Result<Value>;

    /// Update exactly the fields named in `fields`, leaving all others
    /// untouched.
    async fn patch_document(&self, name: &str, fields: &Fields) -> Result<Value>;
}
