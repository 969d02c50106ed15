//! Scripted importer for unit tests
//!
//! Dry runs execute a small `sh` script with the probe target as `$1`;
//! imports write a placeholder file and count invocations.

use super::Importer;
use crate::error::{ImgCacheError, ImgCacheResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::{Child, Command};

pub(crate) struct ScriptedImporter {
    probe_script: String,
    fail_import: bool,
    import_delay: Option<Duration>,
    binaries: Vec<String>,
    import_calls: AtomicUsize,
    last_probe_target: Mutex<Option<PathBuf>>,
}

impl ScriptedImporter {
    pub(crate) fn new(probe_script: &str) -> Self {
        Self {
            probe_script: probe_script.to_string(),
            fail_import: false,
            import_delay: None,
            binaries: vec!["sh".to_string()],
            import_calls: AtomicUsize::new(0),
            last_probe_target: Mutex::new(None),
        }
    }

    /// Importer whose probe immediately reports progress
    pub(crate) fn accessible() -> Self {
        Self::new("echo 'Downloading layer ...' >&2; exec sleep 30")
    }

    pub(crate) fn failing_import(mut self) -> Self {
        self.fail_import = true;
        self
    }

    /// Write the image in two halves with a pause in between
    pub(crate) fn slow_import(mut self, delay: Duration) -> Self {
        self.import_delay = Some(delay);
        self
    }

    pub(crate) fn with_binaries(mut self, binaries: &[&str]) -> Self {
        self.binaries = binaries.iter().map(|b| b.to_string()).collect();
        self
    }

    pub(crate) fn import_calls(&self) -> usize {
        self.import_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_probe_target(&self) -> Option<PathBuf> {
        self.last_probe_target.lock().unwrap().clone()
    }
}

#[async_trait]
impl Importer for ScriptedImporter {
    fn required_binaries(&self) -> Vec<String> {
        self.binaries.clone()
    }

    fn spawn_dry_run(&self, _reference: &str, target: &Path) -> ImgCacheResult<Child> {
        *self.last_probe_target.lock().unwrap() = Some(target.to_path_buf());
        Command::new("sh")
            .arg("-c")
            .arg(&self.probe_script)
            .arg("sh")
            .arg(target)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ImgCacheError::command_failed("sh -c <probe script>", e))
    }

    async fn import(&self, reference: &str, target: &Path) -> ImgCacheResult<()> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_import {
            return Err(ImgCacheError::ImportCommandFailed {
                reference: reference.to_string(),
                command: format!("stub-import -o {}", target.display()),
                stderr: "[ERROR] disk quota exceeded".to_string(),
            });
        }
        let Some(delay) = self.import_delay else {
            return std::fs::write(target, b"hsqs")
                .map_err(|e| ImgCacheError::io("writing stub image", e));
        };

        std::fs::write(target, b"hs").map_err(|e| ImgCacheError::io("writing stub image", e))?;
        tokio::time::sleep(delay).await;
        std::fs::OpenOptions::new()
            .append(true)
            .open(target)
            .and_then(|mut file| file.write_all(b"qs"))
            .map_err(|e| ImgCacheError::io("finishing stub image", e))
    }
}
