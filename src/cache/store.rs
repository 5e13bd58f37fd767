//! Cache store implementations
//!
//! `LocalStore` keeps one gzip tarball per key in a directory, which suits
//! self-hosted runners with a persistent volume. `DisabledStore` never hits.

use crate::cache::gateway::CacheStore;
use crate::config::Config;
use crate::error::{SetupError, SetupResult};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Directory of `<key>.tar.gz` archives
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
    /// Archived paths are stored relative to this directory
    base: PathBuf,
}

impl LocalStore {
    /// Store archives in `dir`, with paths recorded relative to `/`
    pub fn new(dir: PathBuf) -> Self {
        Self::with_base(dir, PathBuf::from("/"))
    }

    /// Store archives in `dir`, with paths recorded relative to `base`
    pub fn with_base(dir: PathBuf, base: PathBuf) -> Self {
        Self { dir, base }
    }

    fn archive_path(&self, key: &str) -> SetupResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SetupError::CacheStore(format!(
                "invalid cache key {:?}",
                key
            )));
        }
        Ok(self.dir.join(format!("{}{}", key, ARCHIVE_SUFFIX)))
    }

    /// All stored keys with their modification times
    fn entries(&self) -> SetupResult<Vec<(String, SystemTime)>> {
        if !self.dir.is_dir() {
            return Ok(vec![]);
        }

        let read_dir = fs::read_dir(&self.dir).map_err(|e| store_io("listing cache", &self.dir, e))?;

        let mut entries = vec![];
        for entry in read_dir.flatten() {
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(|n| n.strip_suffix(ARCHIVE_SUFFIX)) else {
                continue;
            };
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            entries.push((key.to_string(), modified));
        }
        Ok(entries)
    }

    /// Exact key first, then the newest entry under each prefix in order.
    fn find(&self, key: &str, fallback_keys: &[String]) -> SetupResult<Option<String>> {
        if self.archive_path(key)?.is_file() {
            return Ok(Some(key.to_string()));
        }

        let entries = self.entries()?;
        for prefix in fallback_keys {
            let newest = entries
                .iter()
                .filter(|(k, _)| k.starts_with(prefix.as_str()))
                .max_by_key(|(_, modified)| *modified);
            if let Some((k, _)) = newest {
                return Ok(Some(k.clone()));
            }
        }
        Ok(None)
    }

    fn restore_blocking(&self, key: &str, fallback_keys: &[String]) -> SetupResult<Option<String>> {
        let Some(found) = self.find(key, fallback_keys)? else {
            return Ok(None);
        };

        let archive_path = self.archive_path(&found)?;
        debug!("Extracting {} into {}", archive_path.display(), self.base.display());

        let file = File::open(&archive_path).map_err(|e| store_io("opening", &archive_path, e))?;
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        archive.set_preserve_permissions(true);
        archive.set_overwrite(true);

        // Entries under root-owned directories (apt's partial/) cannot be
        // written back by an unprivileged runner; the rest still restores.
        let mut skipped = 0usize;
        let entries = archive
            .entries()
            .map_err(|e| store_io("reading", &archive_path, e))?;
        for entry in entries {
            let mut entry = entry.map_err(|e| store_io("reading", &archive_path, e))?;
            let name = entry.path().map(|p| p.into_owned()).unwrap_or_default();
            match entry.unpack_in(&self.base) {
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    debug!("Cannot restore {}: {}", name.display(), e);
                    skipped += 1;
                }
                Err(e) => return Err(store_io("extracting", &archive_path, e)),
            }
        }
        if skipped > 0 {
            warn!("Skipped {} cache entries without write permission", skipped);
        }

        Ok(Some(found))
    }

    fn save_blocking(&self, paths: &[PathBuf], key: &str) -> SetupResult<()> {
        let archive_path = self.archive_path(key)?;
        if archive_path.exists() {
            return Err(SetupError::CacheKeyExists(key.to_string()));
        }

        fs::create_dir_all(&self.dir).map_err(|e| store_io("creating", &self.dir, e))?;

        // Write under a unique name and rename so readers never see a partial archive.
        let tmp_path = self
            .dir
            .join(format!(".{}.{}.partial", key, Uuid::new_v4()));
        let result = self.write_archive(&tmp_path, paths).and_then(|()| {
            if archive_path.exists() {
                return Err(SetupError::CacheKeyExists(key.to_string()));
            }
            fs::rename(&tmp_path, &archive_path).map_err(|e| store_io("finalizing", &archive_path, e))
        });

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }

    fn write_archive(&self, dest: &Path, paths: &[PathBuf]) -> SetupResult<()> {
        let file = File::create(dest).map_err(|e| store_io("creating", dest, e))?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);

        for path in paths {
            if !path.exists() {
                debug!("Skipping missing cache path {}", path.display());
                continue;
            }
            let Ok(name) = path.strip_prefix(&self.base) else {
                warn!(
                    "Skipping cache path {} outside {}",
                    path.display(),
                    self.base.display()
                );
                continue;
            };

            append_tree(&mut builder, path, name)?;
        }

        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .map_err(|e| store_io("writing", dest, e))?;
        Ok(())
    }
}

/// Append `path` as `name`, recursing into directories.
///
/// Entries this user cannot read are left out with a warning.
fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &Path,
    name: &Path,
) -> SetupResult<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return skip_unreadable(path, e),
    };
    let file_type = metadata.file_type();

    if file_type.is_dir() {
        let read_dir = match fs::read_dir(path) {
            Ok(read_dir) => read_dir,
            Err(e) => return skip_unreadable(path, e),
        };
        builder
            .append_dir(name, path)
            .map_err(|e| store_io("archiving", path, e))?;
        for entry in read_dir {
            let entry = entry.map_err(|e| store_io("listing", path, e))?;
            append_tree(builder, &entry.path(), &name.join(entry.file_name()))?;
        }
        Ok(())
    } else if file_type.is_file() || file_type.is_symlink() {
        match builder.append_path_with_name(path, name) {
            Ok(()) => Ok(()),
            Err(e) => skip_unreadable(path, e),
        }
    } else {
        debug!("Skipping special file {}", path.display());
        Ok(())
    }
}

fn skip_unreadable(path: &Path, e: std::io::Error) -> SetupResult<()> {
    if e.kind() == ErrorKind::PermissionDenied {
        warn!("Skipping unreadable cache entry {}: {}", path.display(), e);
        Ok(())
    } else {
        Err(store_io("archiving", path, e))
    }
}

fn store_io(action: &str, path: &Path, e: std::io::Error) -> SetupError {
    SetupError::CacheStore(format!("{} {}: {}", action, path.display(), e))
}

#[async_trait]
impl CacheStore for LocalStore {
    async fn restore(
        &self,
        _paths: &[PathBuf],
        key: &str,
        fallback_keys: &[String],
    ) -> SetupResult<Option<String>> {
        let store = self.clone();
        let key = key.to_string();
        let fallback_keys = fallback_keys.to_vec();

        tokio::task::spawn_blocking(move || store.restore_blocking(&key, &fallback_keys))
            .await
            .map_err(|e| SetupError::CacheStore(format!("restore task failed: {}", e)))?
    }

    async fn save(&self, paths: &[PathBuf], key: &str) -> SetupResult<()> {
        let store = self.clone();
        let paths = paths.to_vec();
        let key = key.to_string();

        tokio::task::spawn_blocking(move || store.save_blocking(&paths, &key))
            .await
            .map_err(|e| SetupError::CacheStore(format!("save task failed: {}", e)))?
    }

    fn store_name(&self) -> &'static str {
        "local"
    }
}

/// Store used when caching is turned off
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

#[async_trait]
impl CacheStore for DisabledStore {
    async fn restore(
        &self,
        _paths: &[PathBuf],
        _key: &str,
        _fallback_keys: &[String],
    ) -> SetupResult<Option<String>> {
        info!("Caching disabled, skipping restore");
        Ok(None)
    }

    async fn save(&self, _paths: &[PathBuf], _key: &str) -> SetupResult<()> {
        info!("Caching disabled, skipping save");
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "disabled"
    }
}

/// Create the store selected by configuration
pub fn create_store(config: &Config, no_cache: bool) -> Box<dyn CacheStore> {
    if no_cache || !config.cache.enabled {
        Box::new(DisabledStore)
    } else {
        Box::new(LocalStore::new(config.cache.dir()))
    }
}
