//! imgcache - cluster container image cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use imgcache::cli::{commands, Cli, Commands};
use imgcache::config::ConfigManager;
use imgcache::error::ImgCacheResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ImgCacheResult<bool> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let mut config = config_manager.load().await?;
    cli.overrides.apply(&mut config);

    init_logging(cli.verbose, &config.general.log_format);
    debug!("Loaded configuration from {}", config_manager.path().display());

    match cli.command {
        Commands::Probe(args) => commands::probe(args, &config).await,
        Commands::Prereq(args) => commands::prereq(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
        slot => commands::slot(slot, &config).await,
    }
}

/// 0 = warn (spinners only), 1 = info, 2+ = debug
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("imgcache=warn"),
        1 => EnvFilter::new("imgcache=info"),
        _ => EnvFilter::new("imgcache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
