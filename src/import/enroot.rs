//! enroot importer
//!
//! Probes run `enroot import` directly on the current host. Real imports
//! go through the cluster launcher so the transfer lands on a compute
//! node of the configured partition.

use super::{ImportCommand, Importer};
use crate::config::schema::ImportConfig;
use crate::error::{ImgCacheError, ImgCacheResult};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Child;
use tracing::{debug, info};

/// Importer backed by `enroot import`, optionally wrapped in `srun`
#[derive(Debug, Clone)]
pub struct EnrootImporter {
    config: ImportConfig,
}

impl EnrootImporter {
    /// Create a new importer from config
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    fn source_url(&self, reference: &str) -> String {
        format!("{}://{}", self.config.scheme, reference)
    }

    fn tool_args(&self, reference: &str, target: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if !self.config.subcommand.is_empty() {
            args.push(self.config.subcommand.clone());
        }
        args.push("-o".to_string());
        args.push(target.display().to_string());
        args.push(self.source_url(reference));
        args
    }

    /// Bare invocation used for probing
    pub fn probe_command(&self, reference: &str, target: &Path) -> ImportCommand {
        ImportCommand {
            program: self.config.tool.clone(),
            args: self.tool_args(reference, target),
        }
    }

    /// Launcher-wrapped invocation used for populating the cache
    pub fn import_command(&self, reference: &str, target: &Path) -> ImportCommand {
        let mut args = vec!["--export=ALL".to_string()];
        args.extend(self.config.extra_launcher_args.iter().cloned());
        args.push(format!("--partition={}", self.config.partition));
        args.push(self.config.tool.clone());
        args.extend(self.tool_args(reference, target));

        ImportCommand {
            program: self.config.launcher.clone(),
            args,
        }
    }
}

#[async_trait]
impl Importer for EnrootImporter {
    fn required_binaries(&self) -> Vec<String> {
        vec![self.config.tool.clone(), self.config.launcher.clone()]
    }

    fn spawn_dry_run(&self, reference: &str, target: &Path) -> ImgCacheResult<Child> {
        let command = self.probe_command(reference, target);
        debug!("Checking container image accessibility: {}", command);

        command
            .to_command()
            .spawn()
            .map_err(|e| ImgCacheError::command_failed(command.to_string(), e))
    }

    async fn import(&self, reference: &str, target: &Path) -> ImgCacheResult<()> {
        let command = self.import_command(reference, target);
        info!("Importing container image: {}", command);

        let output = command
            .to_command()
            .output()
            .await
            .map_err(|e| ImgCacheError::command_failed(command.to_string(), e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stderr = if stderr.is_empty() {
            format!("command exited with {}", output.status)
        } else {
            stderr
        };

        Err(ImgCacheError::ImportCommandFailed {
            reference: reference.to_string(),
            command: command.to_string(),
            stderr,
        })
    }
}
