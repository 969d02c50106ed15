//! Slot commands - check, ensure, populate, evict, uninstall

use super::print_outcome;
use crate::cache::ArtifactCacheManager;
use crate::cli::args::Commands;
use crate::config::Config;
use crate::error::ImgCacheResult;
use crate::ui::{TaskSpinner, UiContext};
use tracing::debug;

/// Execute a slot command, returning whether the operation succeeded
pub async fn execute(command: Commands, config: &Config) -> ImgCacheResult<bool> {
    let manager = ArtifactCacheManager::from_config(config);
    debug!(
        "Cache root {} (cache_locally={})",
        manager.install_root().display(),
        manager.cache_locally()
    );

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);

    let (outcome, format) = match command {
        Commands::Check(args) => {
            spinner.start(&format!("Checking {}", args.reference));
            let outcome = manager.check_exists(&args.reference, &args.slot.key()).await;
            (outcome, args.format)
        }
        Commands::Ensure(args) => {
            spinner.start(&format!("Ensuring {}", args.reference));
            let outcome = manager.ensure(&args.reference, &args.slot.key()).await;
            (outcome, args.format)
        }
        Commands::Populate(args) => {
            spinner.start(&format!("Importing {}", args.reference));
            let outcome = manager.populate(&args.reference, &args.slot.key()).await;
            (outcome, args.format)
        }
        Commands::Evict(args) => (manager.evict(&args.slot.key()), args.format),
        Commands::Uninstall(args) => (manager.uninstall(&args.slot.key()), args.format),
        other => unreachable!("not a slot command: {:?}", other),
    };
    spinner.clear();

    print_outcome(&outcome, format)?;
    Ok(outcome.success)
}
