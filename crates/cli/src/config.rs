//! Startup configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use mathtiles_core::{ExpressionEngine, FailurePolicy};
use mathtiles_game::RoundTiming;
use mathtiles_progress::LedgerSchema;
use mathtiles_storage::{FirestoreConfig, DEFAULT_BASE_URL};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Config file read when `--config` is not given, if present.
pub const DEFAULT_CONFIG_FILE: &str = "mathtiles.json";

/// Settings loaded once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Web API key of the document store
    pub web_api_key: Option<String>,

    /// Project id of the document store
    pub project_id: Option<String>,

    /// API endpoint
    pub base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Collection and field names
    pub schema: LedgerSchema,

    /// Round pacing
    pub timing: RoundTiming,

    /// What a mistake does to the level
    pub failure_policy: FailurePolicy,

    /// Smallest operand
    pub operand_min: u32,

    /// Largest operand
    pub operand_max: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web_api_key: None,
            project_id: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 30,
            schema: LedgerSchema::default(),
            timing: RoundTiming::default(),
            failure_policy: FailurePolicy::default(),
            operand_min: 1,
            operand_max: 9,
        }
    }
}

impl AppConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Read `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists, else
    /// use defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    /// Replace store credentials with the ones given on the command line.
    pub fn with_overrides(mut self, api_key: Option<String>, project_id: Option<String>) -> Self {
        if api_key.is_some() {
            self.web_api_key = api_key;
        }
        if project_id.is_some() {
            self.project_id = project_id;
        }
        self
    }

    /// Connection settings for the remote store.
    pub fn firestore(&self) -> Result<FirestoreConfig> {
        let (Some(api_key), Some(project_id)) = (&self.web_api_key, &self.project_id) else {
            bail!("webApiKey and projectId are required unless --offline is set");
        };
        let mut config = FirestoreConfig::new(api_key.as_str(), project_id.as_str());
        config.base_url = self.base_url.clone();
        config.timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(config)
    }

    /// Expression engine over the configured operand range.
    pub fn expression_engine(&self) -> Result<ExpressionEngine> {
        ExpressionEngine::new(self.operand_min..=self.operand_max)
            .context("Invalid operand range in config")
    }
}
