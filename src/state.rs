//! Run state shared between the main and post stages
//!
//! The main stage records whether the cache was restored and which key the
//! post stage should save under. It is an explicit key/value record written
//! to a state file, never ambient global state.

use crate::cache::CacheOutcome;
use crate::error::{SetupError, SetupResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

/// Key holding "true"/"false" for the cache hit flag
pub const CACHE_RESTORED: &str = "CACHE_RESTORED";
/// Key holding the primary cache key
pub const CACHE_KEY: &str = "CACHE_KEY";

/// Key/value record persisted for the post stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    entries: BTreeMap<String, String>,

    /// When the record was last written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
        self.updated_at = Some(Utc::now());
    }

    /// Record a restore outcome
    pub fn record_cache_outcome(&mut self, outcome: &CacheOutcome) {
        self.set(CACHE_RESTORED, outcome.restored.to_string());
        self.set(CACHE_KEY, outcome.key_used.clone());
    }

    /// Whether the main stage restored from cache
    pub fn cache_restored(&self) -> bool {
        self.get(CACHE_RESTORED) == Some("true")
    }

    /// Key the post stage saves under
    pub fn cache_key(&self) -> Option<&str> {
        self.get(CACHE_KEY).filter(|k| !k.is_empty())
    }

    /// Load state from file; a missing file is an empty state
    pub async fn load(path: &Path) -> SetupResult<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SetupError::io(format!("reading run state {}", path.display()), e))?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Save state to file
    pub async fn save(&self, path: &Path) -> SetupResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SetupError::io("creating state directory", e))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| SetupError::io(format!("writing run state {}", path.display()), e))
    }
}
