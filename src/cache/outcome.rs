//! Cache keys and operation outcomes

use crate::error::{FailureKind, ImgCacheError, ImgCacheResult};
use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Address of one slot below the install root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CacheKey {
    pub subdirectory: String,
    pub filename: String,
}

impl CacheKey {
    pub fn new(subdirectory: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            subdirectory: subdirectory.into(),
            filename: filename.into(),
        }
    }

    /// Reject keys that would resolve outside the install root.
    ///
    /// The subdirectory may nest (`team/runA`) but every component must be
    /// a plain name; the filename must be exactly one plain name.
    pub fn validate(&self) -> ImgCacheResult<()> {
        let invalid = |field, value: &str| ImgCacheError::InvalidKey {
            field,
            value: value.to_string(),
        };

        if !only_normal_components(&self.subdirectory) {
            return Err(invalid("subdirectory", &self.subdirectory));
        }
        if !only_normal_components(&self.filename)
            || Path::new(&self.filename).components().count() != 1
        {
            return Err(invalid("filename", &self.filename));
        }
        Ok(())
    }
}

fn only_normal_components(value: &str) -> bool {
    let mut components = Path::new(value).components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subdirectory, self.filename)
    }
}

/// Derived state of a slot; never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSlotState {
    Absent,
    Present,
}

impl fmt::Display for CacheSlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Present => write!(f, "present"),
        }
    }
}

/// Structured result of every public cache operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub success: bool,
    /// Local path on success; the reference itself when not caching locally
    pub path: Option<PathBuf>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl OperationOutcome {
    pub fn success(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            path: Some(path.into()),
            message: message.into(),
            failure: None,
        }
    }

    pub fn failure(err: &ImgCacheError) -> Self {
        Self {
            success: false,
            path: None,
            message: err.to_string(),
            failure: Some(err.kind()),
        }
    }

    /// Failure that still names the path it concerns
    pub fn failure_at(path: impl Into<PathBuf>, err: &ImgCacheError) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::failure(err)
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl fmt::Display for OperationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
