//! CLI argument definitions using clap derive

use crate::cache::CacheKey;
use crate::config::Config;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// imgcache - cluster container image cache
///
/// Imports remote container images with enroot into a shared install
/// path once, and checks that references are reachable before jobs run.
#[derive(Parser, Debug)]
#[command(name = "imgcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "IMGCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,
}

/// Per-invocation overrides of configuration values
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Cache install path
    #[arg(long, global = true, env = "IMGCACHE_INSTALL_PATH")]
    pub install_path: Option<PathBuf>,

    /// Only verify references are reachable; never import locally
    #[arg(long, global = true)]
    pub remote_only: bool,

    /// Partition used for imports
    #[arg(long, global = true)]
    pub partition: Option<String>,

    /// Probe timeout in seconds (0 waits for the import tool to exit)
    #[arg(long, global = true)]
    pub probe_timeout: Option<u64>,
}

impl Overrides {
    /// Apply the overrides on top of loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref path) = self.install_path {
            config.cache.install_path = path.clone();
        }
        if self.remote_only {
            config.cache.cache_locally = false;
        }
        if let Some(ref partition) = self.partition {
            config.import.partition = partition.clone();
        }
        if let Some(secs) = self.probe_timeout {
            config.probe.timeout_secs = secs;
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether an image is cached (or reachable, with --remote-only)
    Check(ReferenceSlotArgs),

    /// Check and import on a miss
    Ensure(ReferenceSlotArgs),

    /// Import an image into its slot
    Populate(ReferenceSlotArgs),

    /// Remove a cached image
    Evict(SlotOnlyArgs),

    /// Remove a cached image and report what was left behind
    Uninstall(SlotOnlyArgs),

    /// Dry-run import to test whether a reference is reachable
    Probe(ProbeArgs),

    /// Check required binaries and reachability of a reference
    Prereq(ProbeArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Cache slot address
#[derive(Args, Debug)]
pub struct SlotArgs {
    /// Subdirectory below the install path
    #[arg(short = 'd', long)]
    pub subdir: String,

    /// Image file name inside the subdirectory
    #[arg(short, long)]
    pub filename: String,
}

impl SlotArgs {
    pub fn key(&self) -> CacheKey {
        CacheKey::new(self.subdir.clone(), self.filename.clone())
    }
}

/// Arguments for commands that take a reference and a slot
#[derive(Parser, Debug)]
pub struct ReferenceSlotArgs {
    /// Image reference (e.g. nvcr.io#nvidia/pytorch:24.02-py3) or local image path
    pub reference: String,

    #[command(flatten)]
    pub slot: SlotArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for commands that only take a slot
#[derive(Parser, Debug)]
pub struct SlotOnlyArgs {
    #[command(flatten)]
    pub slot: SlotArgs,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the probe and prereq commands
#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Image reference
    pub reference: String,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}
