//! Error types for rocq-setup
//!
//! All modules use `SetupResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for rocq-setup operations
pub type SetupResult<T> = Result<T, SetupError>;

/// All errors that can occur while provisioning
#[derive(Error, Debug)]
pub enum SetupError {
    // Environment errors
    #[error("Unsupported platform for opam binaries: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Invalid Rocq version: {0:?}")]
    InvalidVersion(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Cache errors
    #[error("Cache store error: {0}")]
    CacheStore(String),

    #[error("Cache entry already exists: {0}")]
    CacheKeyExists(String),

    #[error("No run state recorded at {0}")]
    MissingRunState(PathBuf),

    // Package errors
    #[error("Failed to install packages [{packages}]: {reason}")]
    PackageInstall { packages: String, reason: String },

    #[error("Failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    #[error("Unexpected output from {command}: {reason}")]
    UnexpectedOutput { command: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` exited with code {code}{}", stderr_suffix(.stderr))]
    CommandExit {
        command: String,
        code: i32,
        stderr: String,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

impl SetupError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a non-zero exit error
    pub fn command_exit(command: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::CommandExit {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Whether the cache store refused a save because the key is taken.
    ///
    /// Stores that cannot return a typed error report it in the message.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::CacheKeyExists(_) => true,
            Self::CacheStore(msg) => msg.contains("already exists"),
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidVersion(_) => Some("Use \"dev\", \"latest\" or a version such as 8.20.0"),
            Self::UnsupportedPlatform { .. } => {
                Some("Install opam yourself and re-run with a restored cache")
            }
            Self::ConfigInvalid { .. } => Some("Run: rocq-setup config show"),
            Self::PackageInstall { .. } => Some("Check the runner's package index (apt-get update)"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SetupError::User("X failed".to_string());
        assert_eq!(err.to_string(), "X failed");
    }

    #[test]
    fn command_exit_includes_stderr() {
        let err = SetupError::command_exit("opam init", 2, "boom\n");
        assert_eq!(err.to_string(), "Command `opam init` exited with code 2: boom");

        let err = SetupError::command_exit("opam init", 2, "  ");
        assert_eq!(err.to_string(), "Command `opam init` exited with code 2");
    }

    #[test]
    fn already_exists_detection() {
        assert!(SetupError::CacheKeyExists("k".to_string()).is_already_exists());
        assert!(
            SetupError::CacheStore("Unable to reserve cache, another job may be creating this cache: key already exists".to_string())
                .is_already_exists()
        );
        assert!(!SetupError::CacheStore("connection reset".to_string()).is_already_exists());
        assert!(!SetupError::User("already exists".to_string()).is_already_exists());
    }

    #[test]
    fn error_hint() {
        let err = SetupError::InvalidVersion("x y".to_string());
        assert!(err.hint().is_some());
        assert_eq!(SetupError::Internal("x".to_string()).hint(), None);
    }
}
