//! Prerequisite checks before importing an image
//!
//! Missing binaries are a local environment problem and are reported
//! before (and instead of) any reachability verdict, all at once so the
//! operator fixes PATH in one go.

use crate::error::{ImgCacheError, ImgCacheResult};
use crate::probe::AccessibilityProbe;
use serde::Serialize;
use std::ffi::OsString;
use tracing::debug;

/// Result of a prerequisite check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrerequisiteCheckResult {
    pub ok: bool,
    pub message: String,
}

/// Checks required binaries, then reachability of the reference
#[derive(Clone)]
pub struct PrerequisiteValidator {
    binaries: Vec<String>,
    search_path: Option<OsString>,
    probe: AccessibilityProbe,
}

impl PrerequisiteValidator {
    /// Validator for `binaries`, resolved against `$PATH`
    pub fn new(binaries: Vec<String>, probe: AccessibilityProbe) -> Self {
        Self {
            binaries,
            search_path: None,
            probe,
        }
    }

    /// Resolve binaries against `path` instead of `$PATH`
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Names of required binaries that do not resolve, in declaration order
    pub fn missing_binaries(&self) -> Vec<String> {
        self.binaries
            .iter()
            .filter(|name| !self.resolves(name))
            .cloned()
            .collect()
    }

    fn resolves(&self, name: &str) -> bool {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        match found {
            Ok(path) => {
                debug!("Found {} at {}", name, path.display());
                true
            }
            Err(_) => false,
        }
    }

    /// Run all checks, returning a typed error for the first failing stage
    pub async fn validate(&self, reference: &str) -> ImgCacheResult<()> {
        let missing = self.missing_binaries();
        if !missing.is_empty() {
            return Err(ImgCacheError::BinaryMissing { names: missing });
        }

        self.probe.probe(reference).await.into_result()?;
        Ok(())
    }

    /// Run all checks and summarise them for display
    pub async fn check(&self, reference: &str) -> PrerequisiteCheckResult {
        match self.validate(reference).await {
            Ok(()) => PrerequisiteCheckResult {
                ok: true,
                message: "All prerequisites are met.".to_string(),
            },
            Err(e) => PrerequisiteCheckResult {
                ok: false,
                message: e.to_string(),
            },
        }
    }
}
