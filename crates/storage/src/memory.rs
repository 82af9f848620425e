//! In-memory document store.
//!
//! Mirrors the REST store's reply shapes and write semantics (explicit-id
//! create overwrites, patches upsert) so the ledger can be exercised without
//! a network. Can be switched offline to simulate an unreachable store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::document::{fields_to_json, FieldValue, Fields};
use crate::trait_::{DocumentStore, EqualityQuery, Result, StorageError};

/// Length of store-assigned document ids.
const AUTO_ID_LEN: usize = 20;

/// Document store held in process memory.
pub struct InMemoryStore {
    root: String,
    documents: Mutex<BTreeMap<String, Fields>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    /// Create an empty store for `project_id`.
    pub fn new(project_id: &str) -> Self {
        Self {
            root: format!("projects/{}/databases/(default)/documents", project_id),
            documents: Mutex::new(BTreeMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every following call fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Seed a document under `collection` of the root.
    pub async fn insert(&self, collection: &str, id: &str, fields: Fields) -> String {
        let name = format!("{}/{}/{}", self.root, collection, id);
        self.documents.lock().await.insert(name.clone(), fields);
        name
    }

    /// Fields of the document named `name`.
    pub async fn document(&self, name: &str) -> Option<Fields> {
        self.documents.lock().await.get(name).cloned()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    /// True when no documents are stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    fn documents_root(&self) -> &str {
        &self.root
    }

    async fn run_query(&self, query: &EqualityQuery) -> Result<Value> {
        self.check_online()?;
        let docs = self.documents.lock().await;
        let prefix = format!("{}/{}/", self.root, query.collection);
        let read_time = chrono::Utc::now().to_rfc3339();

        let mut results: Vec<Value> = docs
            .iter()
            .filter(|(name, fields)| {
                is_direct_child(name, &prefix) && fields.get(&query.field) == Some(&query.value)
            })
            .map(|(name, fields)| json!({ "document": render(name, fields), "readTime": read_time }))
            .collect();

        if results.is_empty() {
            results.push(json!({ "readTime": read_time }));
        }
        Ok(Value::Array(results))
    }

    async fn list_documents(
        &self,
        parent: &str,
        collection: &str,
        page_size: Option<u32>,
    ) -> Result<Value> {
        self.check_online()?;
        let docs = self.documents.lock().await;
        let prefix = format!("{}/{}/", parent, collection);
        let limit = page_size.map_or(usize::MAX, |n| n as usize);

        let listed: Vec<Value> = docs
            .iter()
            .filter(|(name, _)| is_direct_child(name, &prefix))
            .take(limit)
            .map(|(name, fields)| render(name, fields))
            .collect();

        if listed.is_empty() {
            return Ok(json!({}));
        }
        Ok(json!({ "documents": listed }))
    }

    async fn get_document(&self, name: &str) -> Result<Option<Value>> {
        self.check_online()?;
        let docs = self.documents.lock().await;
        Ok(docs.get(name).map(|fields| render(name, fields)))
    }

    async fn create_document(
        &self,
        parent: &str,
        collection: &str,
        id: Option<&str>,
        fields: &Fields,
    ) -> Result<Value> {
        self.check_online()?;
        let id = match id {
            Some(id) => id.to_string(),
            None => auto_id(),
        };
        let name = format!("{}/{}/{}", parent, collection, id);

        let mut docs = self.documents.lock().await;
        docs.insert(name.clone(), fields.clone());
        Ok(render(&name, fields))
    }

    async fn patch_document(&self, name: &str, fields: &Fields) -> Result<Value> {
        self.check_online()?;
        let mut docs = self.documents.lock().await;
        let doc = docs.entry(name.to_string()).or_default();
        for (field, value) in fields {
            doc.insert(field.clone(), value.clone());
        }
        Ok(render(name, doc))
    }
}

fn is_direct_child(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && !rest.contains('/'))
}

fn render(name: &str, fields: &Fields) -> Value {
    json!({ "name": name, "fields": fields_to_json(fields) })
}

fn auto_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LEN)
        .map(char::from)
        .collect()
}

/// Convenience for building seeded field maps.
pub fn fields<I, K, V>(entries: I) -> Fields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
