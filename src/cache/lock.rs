//! Per-slot advisory lock for populating
//!
//! Two processes populating the same slot on one host would both run the
//! import. When `cache.serialize_populate` is set, populate holds an
//! exclusive `flock` on a lock file derived from the slot path. Lock files
//! live under the state directory, never inside the cache tree, so they
//! do not keep slot directories alive.

use crate::error::{ImgCacheError, ImgCacheResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Exclusive lock on one cache slot, released on drop
#[derive(Debug)]
pub struct PopulateLock {
    /// Open handle keeps the flock alive
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl PopulateLock {
    /// Lock file path for a slot target
    pub fn lock_path(locks_dir: &Path, target: &Path) -> PathBuf {
        let name: String = target
            .to_string_lossy()
            .trim_start_matches('/')
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        locks_dir.join(format!("{}.lock", name))
    }

    /// Block until the slot lock is held
    pub async fn acquire(locks_dir: &Path, target: &Path) -> ImgCacheResult<Self> {
        let path = Self::lock_path(locks_dir, target);
        let lock_path = path.clone();

        tokio::task::spawn_blocking(move || Self::acquire_blocking(lock_path))
            .await
            .map_err(|e| ImgCacheError::Lock {
                path,
                source: std::io::Error::other(e),
            })?
    }

    fn acquire_blocking(path: PathBuf) -> ImgCacheResult<Self> {
        let lock_err = |source| ImgCacheError::Lock {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(lock_err)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(lock_err)?;
        file.lock_exclusive().map_err(lock_err)?;

        debug!("Acquired populate lock {}", path.display());
        Ok(Self { file, path })
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
