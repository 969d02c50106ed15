//! Error types for imgcache
//!
//! All modules use `ImgCacheResult<T>` as their return type. The cache
//! manager converts these into [`OperationOutcome`](crate::cache::OperationOutcome)
//! values at its public boundary, so callers never see a raw error from it.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for imgcache operations
pub type ImgCacheResult<T> = Result<T, ImgCacheError>;

/// All errors that can occur in imgcache
#[derive(Error, Debug)]
pub enum ImgCacheError {
    // Environment errors
    #[error("{} are required for caching container images but are not installed.", .names.join(", "))]
    BinaryMissing { names: Vec<String> },

    // Reachability errors
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Inaccessible { message: String },

    #[error("{message}")]
    ProbeUndecided { message: String },

    // Cache layout errors
    #[error("Invalid cache {field} '{value}': expected a relative path that stays inside the install path.")]
    InvalidKey { field: &'static str, value: String },

    #[error("{what} {} does not exist.", .path.display())]
    PathMissing { what: &'static str, path: PathBuf },

    #[error("No permission to write in install path {}.", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to create subdirectory {}. Error: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {}. Error: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Container image does not exist at the specified path: {}.", .0.display())]
    NotCached(PathBuf),

    // Process errors
    #[error(
        "Failed to import container image from {reference}. Command: {command}. Error: {stderr}. \
         Please check the container image URL and ensure that it is accessible and set up with valid credentials."
    )]
    ImportCommandFailed {
        reference: String,
        command: String,
        stderr: String,
    },

    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to acquire populate lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {}: {source}", .path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Failure classes reported back to callers inside an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Launcher or import tool missing from PATH
    BinaryMissing,
    /// Registry rejected the credentials
    Unauthorized,
    /// Network failure or invalid reference
    Inaccessible,
    /// Probe could not decide; never treated as success
    Unknown,
    /// Subdirectory or filename would leave the install root
    InvalidKey,
    /// Install root, subdirectory, or cached file absent
    PathMissing,
    /// Install root not writable
    PermissionDenied,
    DirectoryCreateError,
    ImportCommandFailed,
    RemoveError,
    /// Anything outside the cache taxonomy (config, lock, spawn failures)
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BinaryMissing => "binary missing",
            Self::Unauthorized => "unauthorized",
            Self::Inaccessible => "inaccessible",
            Self::Unknown => "unknown",
            Self::InvalidKey => "invalid key",
            Self::PathMissing => "path missing",
            Self::PermissionDenied => "permission denied",
            Self::DirectoryCreateError => "directory create error",
            Self::ImportCommandFailed => "import command failed",
            Self::RemoveError => "remove error",
            Self::Internal => "internal",
        };
        write!(f, "{}", name)
    }
}

impl FailureKind {
    /// Actionable remediation for operator-fixable failures
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::BinaryMissing => {
                Some("Run on a cluster login node where enroot and srun are on PATH")
            }
            Self::Unauthorized => Some("Add registry credentials to ~/.config/enroot/.credentials"),
            Self::PermissionDenied => Some("Choose an install path you can write to"),
            _ => None,
        }
    }
}

impl ImgCacheError {
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

    /// Classify the error for outcome reporting
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::BinaryMissing { .. } => FailureKind::BinaryMissing,
            Self::Unauthorized { .. } => FailureKind::Unauthorized,
            Self::Inaccessible { .. } => FailureKind::Inaccessible,
            Self::ProbeUndecided { .. } => FailureKind::Unknown,
            Self::InvalidKey { .. } => FailureKind::InvalidKey,
            Self::PathMissing { .. } | Self::NotCached(_) => FailureKind::PathMissing,
            Self::PermissionDenied(_) => FailureKind::PermissionDenied,
            Self::DirectoryCreate { .. } => FailureKind::DirectoryCreateError,
            Self::ImportCommandFailed { .. } => FailureKind::ImportCommandFailed,
            Self::Remove { .. } => FailureKind::RemoveError,
            _ => FailureKind::Internal,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        self.kind().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_binaries_listed_together() {
        let err = ImgCacheError::BinaryMissing {
            names: vec!["srun".to_string(), "enroot".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "srun, enroot are required for caching container images but are not installed."
        );
        assert_eq!(err.kind(), FailureKind::BinaryMissing);
    }

    #[test]
    fn path_missing_names_stage() {
        let err = ImgCacheError::PathMissing {
            what: "Install path",
            path: PathBuf::from("/cache"),
        };
        assert_eq!(err.to_string(), "Install path /cache does not exist.");
    }

    #[test]
    fn error_hint() {
        let err = ImgCacheError::Unauthorized {
            message: "denied".to_string(),
        };
        assert!(err.hint().unwrap().contains(".credentials"));
        assert_eq!(ImgCacheError::NotCached(PathBuf::from("/x")).hint(), None);
    }

    #[test]
    fn internal_kind_for_ambient_errors() {
        let err = ImgCacheError::io("reading", std::io::Error::other("boom"));
        assert_eq!(err.kind(), FailureKind::Internal);
    }
}
