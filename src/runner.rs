//! Environment export to the current process and later CI steps
//!
//! Variables are set on this process so commands spawned later in the run
//! see them. When the runner provides `GITHUB_ENV` / `GITHUB_PATH`, they are
//! also appended there so subsequent workflow steps see them too.

use crate::error::{SetupError, SetupResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Sink for exported environment variables
#[derive(Debug, Clone, Default)]
pub struct RunnerEnv {
    env_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl RunnerEnv {
    /// Pick up the runner's export files, if any
    pub fn detect() -> Self {
        Self {
            env_file: std::env::var_os("GITHUB_ENV").map(PathBuf::from),
            path_file: std::env::var_os("GITHUB_PATH").map(PathBuf::from),
        }
    }

    /// Export to explicit files
    pub fn with_files(env_file: Option<PathBuf>, path_file: Option<PathBuf>) -> Self {
        Self {
            env_file,
            path_file,
        }
    }

    /// Export `name=value`
    pub async fn export_var(&self, name: &str, value: &str) -> SetupResult<()> {
        debug!("Exporting {}={}", name, value);
        std::env::set_var(name, value);

        if let Some(ref file) = self.env_file {
            // Heredoc form keeps multi-line values intact.
            let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
            let entry = format!("{name}<<{delimiter}\n{value}\n{delimiter}\n");
            append(file, &entry).await?;
        }
        Ok(())
    }

    /// Prepend `dir` to `PATH`
    pub async fn add_path(&self, dir: &Path) -> SetupResult<()> {
        debug!("Adding {} to PATH", dir.display());

        let current = std::env::var_os("PATH").unwrap_or_default();
        let mut entries = vec![dir.to_path_buf()];
        entries.extend(std::env::split_paths(&current).filter(|p| p != dir));
        let joined: OsString = std::env::join_paths(entries)
            .map_err(|e| SetupError::Internal(format!("building PATH: {}", e)))?;
        std::env::set_var("PATH", joined);

        if let Some(ref file) = self.path_file {
            append(file, &format!("{}\n", dir.display())).await?;
        }
        Ok(())
    }
}

async fn append(path: &Path, content: &str) -> SetupResult<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| SetupError::io(format!("opening {}", path.display()), e))?;

    file.write_all(content.as_bytes())
        .await
        .map_err(|e| SetupError::io(format!("writing {}", path.display()), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[tokio::test]
    #[serial]
    async fn export_var_writes_heredoc() {
        let temp = TempDir::new().unwrap();
        let env_file = temp.path().join("github_env");
        let sink = RunnerEnv::with_files(Some(env_file.clone()), None);

        sink.export_var("ROCQ_SETUP_TEST_VAR", "a\nb").await.unwrap();

        assert_eq!(std::env::var("ROCQ_SETUP_TEST_VAR").unwrap(), "a\nb");
        let written = std::fs::read_to_string(&env_file).unwrap();
        let mut lines = written.lines();
        let header = lines.next().unwrap();
        let delimiter = header.strip_prefix("ROCQ_SETUP_TEST_VAR<<").unwrap();
        assert_eq!(lines.next(), Some("a"));
        assert_eq!(lines.next(), Some("b"));
        assert_eq!(lines.next(), Some(delimiter));
        std::env::remove_var("ROCQ_SETUP_TEST_VAR");
    }

    #[tokio::test]
    #[serial]
    async fn add_path_prepends_once() {
        let temp = TempDir::new().unwrap();
        let path_file = temp.path().join("github_path");
        let sink = RunnerEnv::with_files(None, Some(path_file.clone()));
        let saved = std::env::var_os("PATH");
        let dir = temp.path().join("bin");

        sink.add_path(&dir).await.unwrap();
        sink.add_path(&dir).await.unwrap();

        let path = std::env::var_os("PATH").unwrap();
        let entries: Vec<PathBuf> = std::env::split_paths(&path).collect();
        assert_eq!(entries[0], dir);
        assert_eq!(entries.iter().filter(|p| **p == dir).count(), 1);
        assert_eq!(
            std::fs::read_to_string(&path_file).unwrap().lines().count(),
            2
        );

        if let Some(saved) = saved {
            std::env::set_var("PATH", saved);
        }
    }
}
