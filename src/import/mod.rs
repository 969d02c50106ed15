//! External import capability
//!
//! The cache never transfers image data itself. It hands a reference and
//! a target path to an import tool (enroot by default) and only inspects
//! exit codes and diagnostic output.

mod enroot;
#[cfg(test)]
pub(crate) mod testing;

pub use enroot::EnrootImporter;

use crate::error::ImgCacheResult;
use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use tokio::process::{Child, Command};

/// Abstract import tool interface
///
/// Production code uses [`EnrootImporter`]; tests substitute scripted
/// implementations so no cluster tooling is needed.
#[async_trait]
pub trait Importer: Send + Sync {
    /// Binary names that must resolve on PATH before a real import
    fn required_binaries(&self) -> Vec<String>;

    /// Start a bare dry-run import into `target`.
    ///
    /// The child's stderr must be piped; stdout is not read.
    fn spawn_dry_run(&self, reference: &str, target: &Path) -> ImgCacheResult<Child>;

    /// Run a full import into `target` and wait for it to finish
    async fn import(&self, reference: &str, target: &Path) -> ImgCacheResult<()>;
}

/// A fully assembled program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ImportCommand {
    /// Build a tokio command with stdout discarded and stderr piped
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl fmt::Display for ImportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
