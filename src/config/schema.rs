//! Configuration schema for imgcache
//!
//! Configuration is stored at `~/.config/imgcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache layout and behaviour
    pub cache: CacheConfig,

    /// External import tool settings
    pub import: ImportConfig,

    /// Accessibility probe settings
    pub probe: ProbeConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory holding `<subdirectory>/<filename>` slots
    pub install_path: PathBuf,

    /// Import images into the install path (false = only verify the
    /// remote reference is reachable)
    pub cache_locally: bool,

    /// Hold a per-slot advisory lock while populating
    pub serialize_populate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            install_path: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("imgcache")
                .join("images"),
            cache_locally: true,
            serialize_populate: false,
        }
    }
}

/// Import tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Import tool binary
    pub tool: String,

    /// Subcommand of the tool that performs the import
    pub subcommand: String,

    /// Cluster job launcher wrapping real imports
    pub launcher: String,

    /// Partition passed to the launcher
    pub partition: String,

    /// URL scheme prefixed to references
    pub scheme: String,

    /// Extra launcher flags, placed before `--partition`
    pub extra_launcher_args: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            tool: "enroot".to_string(),
            subcommand: "import".to_string(),
            launcher: "srun".to_string(),
            partition: "default".to_string(),
            scheme: "docker".to_string(),
            extra_launcher_args: vec![],
        }
    }
}

/// Accessibility probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Give up on a probe that produced no decisive line after this many
    /// seconds (0 = wait for the process to exit)
    pub timeout_secs: u64,
}

impl ProbeConfig {
    /// Timeout as a duration, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}
