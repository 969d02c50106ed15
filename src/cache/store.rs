//! Filesystem layout of the image cache
//!
//! A slot lives at `<install_root>/<subdirectory>/<filename>`. Nothing else
//! is written next to it, so the presence of a regular file is the only
//! state the cache has.

use crate::error::{ImgCacheError, ImgCacheResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Stateless view over the on-disk cache tree
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemCacheStore;

impl FilesystemCacheStore {
    /// Compose the slot path. Pure; touches nothing on disk.
    pub fn resolve_path(install_root: &Path, subdirectory: &str, filename: &str) -> PathBuf {
        install_root.join(subdirectory).join(filename)
    }

    /// True only for a regular file (following symlinks).
    ///
    /// Dangling symlinks, directories and unreadable paths all report
    /// `false`; a permission error is not distinguished from absence here.
    pub fn exists(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    /// True if `path` is an existing directory
    pub fn is_dir(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
    }

    /// Whether the current user can create files in `dir`.
    ///
    /// Checked by creating (and immediately dropping) a scratch file, which
    /// also accounts for ACLs and read-only mounts.
    pub fn is_writable(dir: &Path) -> bool {
        tempfile::Builder::new()
            .prefix(".imgcache-write-check")
            .tempfile_in(dir)
            .is_ok()
    }

    /// Create `path` and any missing parents
    pub fn ensure_directory(path: &Path) -> ImgCacheResult<()> {
        if Self::is_dir(path) {
            return Ok(());
        }
        debug!("Creating directory: {}", path.display());
        fs::create_dir_all(path).map_err(|e| ImgCacheError::DirectoryCreate {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Remove a cached file. Returns `Ok(false)` if it was already absent.
    pub fn remove_file(path: &Path) -> ImgCacheResult<bool> {
        if !Self::exists(path) {
            return Ok(false);
        }
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ImgCacheError::Remove {
                path: path.to_path_buf(),
                source: e,
            }),
        }
    }

    /// Remove `path` if it is an empty directory.
    ///
    /// Returns `Ok(true)` if the directory was removed, `Ok(false)` if it
    /// was absent or still has entries.
    pub fn remove_directory_if_empty(path: &Path) -> ImgCacheResult<bool> {
        let mut entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => {
                return Err(ImgCacheError::Remove {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        if entries.next().is_some() {
            debug!("Leaving non-empty directory {}", path.display());
            return Ok(false);
        }

        fs::remove_dir(path).map_err(|e| ImgCacheError::Remove {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!("Removed empty directory {}", path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_path_composes_triple() {
        let path = FilesystemCacheStore::resolve_path(Path::new("/cache"), "runA", "img.sqsh");
        assert_eq!(path, PathBuf::from("/cache/runA/img.sqsh"));
    }

    #[test]
    fn exists_only_for_regular_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("img.sqsh");
        fs::write(&file, b"sqsh").unwrap();

        assert!(FilesystemCacheStore::exists(&file));
        assert!(!FilesystemCacheStore::exists(dir.path()));
        assert!(!FilesystemCacheStore::exists(&dir.path().join("missing")));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_absent() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("link.sqsh");
        std::os::unix::fs::symlink(dir.path().join("gone"), &link).unwrap();

        assert!(!FilesystemCacheStore::exists(&link));
    }

    #[test]
    fn ensure_directory_creates_parents() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");

        FilesystemCacheStore::ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        // second call is a no-op
        FilesystemCacheStore::ensure_directory(&nested).unwrap();
    }

    #[test]
    fn ensure_directory_under_file_fails() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, b"").unwrap();

        let err = FilesystemCacheStore::ensure_directory(&file.join("sub")).unwrap_err();
        assert!(matches!(err, ImgCacheError::DirectoryCreate { .. }));
        assert!(err.to_string().starts_with("Failed to create subdirectory"));
    }

    #[test]
    fn remove_absent_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let removed = FilesystemCacheStore::remove_file(&dir.path().join("nothing")).unwrap();
        assert!(!removed);
    }

    #[test]
    fn remove_existing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("img.sqsh");
        fs::write(&file, b"sqsh").unwrap();

        assert!(FilesystemCacheStore::remove_file(&file).unwrap());
        assert!(!file.exists());
    }

    #[test]
    fn remove_directory_only_when_empty() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("runA");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("other.txt"), b"keep").unwrap();

        assert!(!FilesystemCacheStore::remove_directory_if_empty(&sub).unwrap());
        assert!(sub.is_dir());

        fs::remove_file(sub.join("other.txt")).unwrap();
        assert!(FilesystemCacheStore::remove_directory_if_empty(&sub).unwrap());
        assert!(!sub.exists());

        // already gone
        assert!(!FilesystemCacheStore::remove_directory_if_empty(&sub).unwrap());
    }

    #[test]
    fn writable_dir_detected() {
        let dir = TempDir::new().unwrap();
        assert!(FilesystemCacheStore::is_writable(dir.path()));
        assert!(!FilesystemCacheStore::is_writable(&dir.path().join("missing")));
    }
}
