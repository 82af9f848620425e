//! Firestore REST v1 client.
//!
//! Talks to the documents API with a web API key and no client SDK. Reply
//! bodies are parsed leniently; status codes decide success.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::document::{fields_to_json, Fields};
use crate::parser::ResponseParser;
use crate::trait_::{DocumentStore, EqualityQuery, Result, StorageError};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1";

/// Connection settings.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// Web API key appended to every request
    pub api_key: String,

    /// Project id
    pub project_id: String,

    /// API endpoint, without trailing slash
    pub base_url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl FirestoreConfig {
    /// Settings for `project_id` against the public endpoint.
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Document store backed by the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreRestStore {
    /// HTTP client
    client: Client,

    /// Connection settings
    config: FirestoreConfig,

    /// `projects/<id>/databases/(default)/documents`
    root: String,
}

impl FirestoreRestStore {
    /// Create a store client.
    pub fn new(config: FirestoreConfig) -> Result<Self> {
        let client = ClientBuilder::new().timeout(config.timeout).build()?;
        let root = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );
        Ok(Self {
            client,
            config,
            root,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .query(&[("key", self.config.api_key.as_str())])
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("Store request failed with status {}", status);
            return Err(StorageError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(ResponseParser::parse(&text).into_payload())
    }

    fn query_request(&self, query: &EqualityQuery) -> RequestBuilder {
        let path = format!("{}:runQuery", self.root);
        self.request(Method::POST, &path).json(&query.to_json())
    }

    fn list_request(
        &self,
        parent: &str,
        collection: &str,
        page_size: Option<u32>,
    ) -> RequestBuilder {
        let request = self.request(Method::GET, &format!("{}/{}", parent, collection));
        match page_size {
            Some(size) => request.query(&[("pageSize", size)]),
            None => request,
        }
    }

    fn create_request(
        &self,
        parent: &str,
        collection: &str,
        id: Option<&str>,
        fields: &Fields,
    ) -> RequestBuilder {
        let body = json!({ "fields": fields_to_json(fields) });
        let request = match id {
            // An unmasked patch writes the whole document at a chosen id.
            Some(id) => {
                let path = format!("{}/{}/{}", parent, collection, id);
                self.request(Method::PATCH, &path)
            }
            None => self.request(Method::POST, &format!("{}/{}", parent, collection)),
        };
        request.json(&body)
    }

    fn patch_request(&self, name: &str, fields: &Fields) -> RequestBuilder {
        let mask: Vec<(&str, &str)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", field.as_str()))
            .collect();
        let body = json!({ "fields": fields_to_json(fields) });
        self.request(Method::PATCH, name).query(&mask).json(&body)
    }
}

#[async_trait]
impl DocumentStore for FirestoreRestStore {
    fn documents_root(&self) -> &str {
        &self.root
    }

    async fn run_query(&self, query: &EqualityQuery) -> Result<Value> {
        debug!(
            "Querying {} where {} == {:?}",
            query.collection, query.field, query.value
        );
        self.execute(self.query_request(query)).await
    }

    async fn list_documents(
        &self,
        parent: &str,
        collection: &str,
        page_size: Option<u32>,
    ) -> Result<Value> {
        debug!("Listing {}/{}", parent, collection);
        self.execute(self.list_request(parent, collection, page_size)).await
    }

    async fn get_document(&self, name: &str) -> Result<Option<Value>> {
        debug!("Fetching {}", name);
        match self.execute(self.request(Method::GET, name)).await {
            Ok(payload) => Ok(Some(payload)),
            Err(StorageError::Status { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create_document(
        &self,
        parent: &str,
        collection: &str,
        id: Option<&str>,
        fields: &Fields,
    ) -> Result<Value> {
        debug!("Writing document {:?} under {}/{}", id, parent, collection);
        self.execute(self.create_request(parent, collection, id, fields))
            .await
    }

    async fn patch_document(&self, name: &str, fields: &Fields) -> Result<Value> {
        debug!("Patching {} fields {:?}", name, fields.keys().collect::<Vec<_>>());
        self.execute(self.patch_request(name, fields)).await
    }
}
