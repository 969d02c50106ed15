//! Image cache manager
//!
//! Ties the filesystem store, prerequisite checks, the accessibility probe
//! and the importer together. Every public operation returns an
//! [`OperationOutcome`]; errors raised inside are converted at this
//! boundary and never escape.
//!
//! # Slot lifecycle
//!
//! | From | Event | To |
//! |------|-------|----|
//! | Absent | populate ok | Present |
//! | Absent | populate failed | Absent |
//! | Present | evict | Absent |
//!
//! A present slot is never overwritten; populating it again short-circuits.

use crate::cache::lock::PopulateLock;
use crate::cache::outcome::{CacheKey, CacheSlotState, OperationOutcome};
use crate::cache::store::FilesystemCacheStore;
use crate::config::{Config, ConfigManager};
use crate::error::{ImgCacheError, ImgCacheResult};
use crate::import::{EnrootImporter, Importer};
use crate::prereq::PrerequisiteValidator;
use crate::probe::AccessibilityProbe;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const ALREADY_CACHED: &str = "Cached container image already exists.";

/// What an eviction actually changed on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Eviction {
    file_removed: bool,
    directory_removed: bool,
}

/// Manages cached container images below one install root
pub struct ArtifactCacheManager {
    install_root: PathBuf,
    cache_locally: bool,
    importer: Arc<dyn Importer>,
    probe: AccessibilityProbe,
    validator: PrerequisiteValidator,
    locks_dir: Option<PathBuf>,
}

impl ArtifactCacheManager {
    /// Create a manager around an importer
    pub fn new(
        install_root: impl Into<PathBuf>,
        cache_locally: bool,
        importer: Arc<dyn Importer>,
        probe_timeout: Option<Duration>,
    ) -> Self {
        let probe = AccessibilityProbe::new(importer.clone(), probe_timeout);
        let validator = PrerequisiteValidator::new(importer.required_binaries(), probe.clone());
        Self {
            install_root: install_root.into(),
            cache_locally,
            importer,
            probe,
            validator,
            locks_dir: None,
        }
    }

    /// Create a manager backed by enroot from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let importer: Arc<dyn Importer> = Arc::new(EnrootImporter::new(config.import.clone()));
        let manager = Self::new(
            config.cache.install_path.clone(),
            config.cache.cache_locally,
            importer,
            config.probe.timeout(),
        );
        if config.cache.serialize_populate {
            manager.with_populate_lock(ConfigManager::locks_dir())
        } else {
            manager
        }
    }

    /// Serialize populates of the same slot through lock files in `locks_dir`
    pub fn with_populate_lock(mut self, locks_dir: impl Into<PathBuf>) -> Self {
        self.locks_dir = Some(locks_dir.into());
        self
    }

    /// Resolve required binaries against `path` instead of `$PATH`
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.validator = self.validator.with_search_path(path);
        self
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn cache_locally(&self) -> bool {
        self.cache_locally
    }

    pub fn probe(&self) -> &AccessibilityProbe {
        &self.probe
    }

    pub fn prerequisites(&self) -> &PrerequisiteValidator {
        &self.validator
    }

    /// Local path of a slot
    pub fn target_path(&self, key: &CacheKey) -> PathBuf {
        FilesystemCacheStore::resolve_path(&self.install_root, &key.subdirectory, &key.filename)
    }

    fn subdirectory_path(&self, key: &CacheKey) -> PathBuf {
        self.install_root.join(&key.subdirectory)
    }

    /// Current state of a slot
    pub fn slot_state(&self, key: &CacheKey) -> CacheSlotState {
        if FilesystemCacheStore::exists(&self.target_path(key)) {
            CacheSlotState::Present
        } else {
            CacheSlotState::Absent
        }
    }

    /// Check whether the image is available without importing it
    pub async fn check_exists(&self, reference: &str, key: &CacheKey) -> OperationOutcome {
        debug!(
            "Checking if container image exists: reference={}, key={}, cache_locally={}",
            reference, key, self.cache_locally
        );

        if !self.cache_locally {
            return match self.probe.probe(reference).await.into_result() {
                Ok(message) => OperationOutcome::success(reference, message),
                Err(e) => OperationOutcome::failure(&e),
            };
        }

        let reference_path = Path::new(reference);
        if FilesystemCacheStore::exists(reference_path) {
            return OperationOutcome::success(
                reference_path,
                "Container image file path is valid.",
            );
        }

        match self.locate_cached(key) {
            Ok(path) => OperationOutcome::success(path, ALREADY_CACHED),
            Err(e) => OperationOutcome::failure(&e),
        }
    }

    fn locate_cached(&self, key: &CacheKey) -> ImgCacheResult<PathBuf> {
        key.validate()?;

        if !self.install_root.exists() {
            return Err(ImgCacheError::PathMissing {
                what: "Install path",
                path: self.install_root.clone(),
            });
        }

        let subdirectory = self.subdirectory_path(key);
        if !subdirectory.exists() {
            return Err(ImgCacheError::PathMissing {
                what: "Subdirectory path",
                path: subdirectory,
            });
        }

        let target = self.target_path(key);
        if FilesystemCacheStore::exists(&target) {
            Ok(target)
        } else {
            Err(ImgCacheError::NotCached(target))
        }
    }

    /// Make the image available, importing it on a miss when caching locally
    pub async fn ensure(&self, reference: &str, key: &CacheKey) -> OperationOutcome {
        let checked = self.check_exists(reference, key).await;
        if checked.success || !self.cache_locally {
            return checked;
        }
        self.populate(reference, key).await
    }

    /// Import the image into its slot.
    ///
    /// With local caching disabled nothing is written; the outcome is the
    /// remote reachability check instead.
    pub async fn populate(&self, reference: &str, key: &CacheKey) -> OperationOutcome {
        if !self.cache_locally {
            debug!("Local caching disabled, only checking {}", reference);
            return self.check_exists(reference, key).await;
        }
        if let Err(e) = key.validate() {
            return OperationOutcome::failure(&e);
        }

        let target = self.target_path(key);
        if FilesystemCacheStore::exists(&target) {
            return OperationOutcome::success(target, ALREADY_CACHED);
        }

        let _lock = match &self.locks_dir {
            Some(dir) => match PopulateLock::acquire(dir, &target).await {
                Ok(lock) => Some(lock),
                Err(e) => return OperationOutcome::failure(&e),
            },
            None => None,
        };

        // The previous lock holder may have filled the slot while we waited
        if FilesystemCacheStore::exists(&target) {
            return OperationOutcome::success(target, ALREADY_CACHED);
        }

        match self.populate_slot(reference, key, &target).await {
            Ok(()) => {
                info!("Cached {} at {}", reference, target.display());
                OperationOutcome::success(target, "Container image cached successfully.")
            }
            Err(e) => {
                warn!("Caching {} failed: {}", reference, e);
                OperationOutcome::failure(&e)
            }
        }
    }

    async fn populate_slot(
        &self,
        reference: &str,
        key: &CacheKey,
        target: &Path,
    ) -> ImgCacheResult<()> {
        self.validator.validate(reference).await?;

        if !self.install_root.exists() {
            return Err(ImgCacheError::PathMissing {
                what: "Install path",
                path: self.install_root.clone(),
            });
        }
        if !FilesystemCacheStore::is_writable(&self.install_root) {
            return Err(ImgCacheError::PermissionDenied(self.install_root.clone()));
        }

        let subdirectory = self.subdirectory_path(key);
        FilesystemCacheStore::ensure_directory(&subdirectory)?;

        // Private scratch dir per populate; a present slot is always complete.
        // Early returns drop it, which removes the partial image.
        let scratch = tempfile::Builder::new()
            .prefix(&format!(".{}.", key.filename))
            .suffix(".partial")
            .tempdir_in(&subdirectory)
            .map_err(|e| ImgCacheError::DirectoryCreate {
                path: subdirectory.clone(),
                source: e,
            })?;
        let partial = scratch.path().join(&key.filename);

        self.importer.import(reference, &partial).await?;

        fs::rename(&partial, target).map_err(|e| {
            ImgCacheError::io(
                format!("moving imported image into place at {}", target.display()),
                e,
            )
        })?;

        let scratch_path = scratch.path().to_path_buf();
        if let Err(e) = scratch.close() {
            warn!(
                "Failed to remove import scratch directory {}: {}",
                scratch_path.display(),
                e
            );
        }
        Ok(())
    }

    /// Remove a cached image and its subdirectory if that becomes empty
    pub fn evict(&self, key: &CacheKey) -> OperationOutcome {
        if let Err(e) = key.validate() {
            return OperationOutcome::failure(&e);
        }

        let target = self.target_path(key);
        match self.evict_slot(key) {
            Ok(eviction) if eviction.file_removed => {
                OperationOutcome::success(target, "Cached container image removed successfully.")
            }
            Ok(_) => OperationOutcome::success(target, "No cached container image found to remove."),
            Err(e) => OperationOutcome::failure_at(target, &e),
        }
    }

    /// Evict and report whether the subdirectory went with it
    pub fn uninstall(&self, key: &CacheKey) -> OperationOutcome {
        if let Err(e) = key.validate() {
            return OperationOutcome::failure(&e);
        }

        let subdirectory = self.subdirectory_path(key);
        match self.evict_slot(key) {
            Ok(eviction) if eviction.directory_removed => {
                OperationOutcome::success(subdirectory, "Subdirectory removed successfully.")
            }
            Ok(_) => OperationOutcome::success(
                subdirectory,
                "Cached container image uninstalled successfully.",
            ),
            Err(e) => OperationOutcome::failure_at(self.target_path(key), &e),
        }
    }

    fn evict_slot(&self, key: &CacheKey) -> ImgCacheResult<Eviction> {
        let target = self.target_path(key);
        if !FilesystemCacheStore::remove_file(&target)? {
            debug!("Nothing cached at {}", target.display());
            return Ok(Eviction {
                file_removed: false,
                directory_removed: false,
            });
        }

        // The image is gone at this point, so a failed rmdir is only logged
        let directory_removed =
            match FilesystemCacheStore::remove_directory_if_empty(&self.subdirectory_path(key)) {
                Ok(removed) => removed,
                Err(e) => {
                    warn!("{}", e);
                    false
                }
            };

        Ok(Eviction {
            file_removed: true,
            directory_removed,
        })
    }
}
