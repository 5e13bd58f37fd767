//! Restore/save against the provisioning cache
//!
//! Cache failures never fail provisioning: restore errors become a miss and
//! save errors are reported to the caller for logging only.

use crate::cache::identity::CacheIdentity;
use crate::error::SetupResult;
use crate::state::RunState;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use tracing::{info, warn};

/// Blob storage for cached paths
///
/// `restore` tries `key` first, then each fallback prefix in order, and
/// returns the key it restored from. `save` fails when the key is taken.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn restore(
        &self,
        paths: &[PathBuf],
        key: &str,
        fallback_keys: &[String],
    ) -> SetupResult<Option<String>>;

    async fn save(&self, paths: &[PathBuf], key: &str) -> SetupResult<()>;

    /// Human-readable store name for logs
    fn store_name(&self) -> &'static str;
}

/// How a restore was satisfied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheMatch {
    /// The primary key itself
    Exact,
    /// A fallback prefix matched this key
    Fallback(String),
    /// Nothing matched
    None,
    /// The store failed; treated as a miss
    Unavailable(String),
}

/// Result of a restore attempt. Written once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutcome {
    pub restored: bool,
    /// Primary key; the post stage saves under it
    pub key_used: String,
    pub matched: CacheMatch,
}

/// Result of a save attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Another run already stored this key
    AlreadyExists,
}

impl fmt::Display for SaveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => write!(f, "saved"),
            Self::AlreadyExists => write!(f, "already exists"),
        }
    }
}

/// Wraps a `CacheStore` with the run's cache paths
pub struct CacheGateway {
    store: Box<dyn CacheStore>,
    paths: Vec<PathBuf>,
}

impl CacheGateway {
    pub fn new(store: Box<dyn CacheStore>, paths: Vec<PathBuf>) -> Self {
        Self { store, paths }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn display_paths(&self) -> String {
        self.paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Restore the toolchain state for `identity` and record the outcome.
    ///
    /// Never fails: store errors are logged and reported as a miss.
    pub async fn restore(&self, identity: &CacheIdentity, state: &mut RunState) -> CacheOutcome {
        let key = identity.key();
        let fallbacks = identity.fallback_prefixes();

        info!("Attempting to restore cache with key: {}", key);
        info!("Cache paths: {}", self.display_paths());

        let matched = match self.store.restore(&self.paths, &key, &fallbacks).await {
            Ok(Some(restored_key)) if restored_key == key => {
                info!("Cache restored from key: {}", restored_key);
                CacheMatch::Exact
            }
            Ok(Some(restored_key)) => {
                info!("Cache restored from fallback key: {}", restored_key);
                CacheMatch::Fallback(restored_key)
            }
            Ok(None) => {
                info!("Cache not found");
                CacheMatch::None
            }
            Err(e) => {
                warn!("Failed to restore cache: {}", e);
                CacheMatch::Unavailable(e.to_string())
            }
        };

        let outcome = CacheOutcome {
            restored: matches!(matched, CacheMatch::Exact | CacheMatch::Fallback(_)),
            key_used: key,
            matched,
        };
        state.record_cache_outcome(&outcome);
        outcome
    }

    /// Save the cache paths under `key`.
    ///
    /// An existing entry counts as success; other errors are returned so the
    /// caller can log them.
    pub async fn save(&self, key: &str) -> SetupResult<SaveOutcome> {
        info!("Saving cache with key: {}", key);
        info!("Cache paths: {}", self.display_paths());

        match self.store.save(&self.paths, key).await {
            Ok(()) => {
                info!("Cache saved successfully");
                Ok(SaveOutcome::Saved)
            }
            Err(e) if e.is_already_exists() => {
                info!("Cache already exists, skipping save");
                Ok(SaveOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }
}
