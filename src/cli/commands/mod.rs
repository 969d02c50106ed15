//! CLI command implementations
//!
//! Slot and probe commands return `Ok(false)` when the operation ran but
//! reported failure, so `main` can exit non-zero without treating a cache
//! miss as an internal error.

pub mod config;
pub mod probe;
pub mod slot;

pub use config::execute as config;
pub use probe::{execute_prereq as prereq, execute_probe as probe};
pub use slot::execute as slot;

use crate::cache::OperationOutcome;
use crate::cli::args::OutputFormat;
use crate::error::ImgCacheResult;
use crate::ui::{self, UiContext};

/// Print an outcome in the requested format
pub(crate) fn print_outcome(outcome: &OperationOutcome, format: OutputFormat) -> ImgCacheResult<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(outcome)?),
        OutputFormat::Text => {
            let ctx = UiContext::detect();
            if outcome.success {
                match outcome.path() {
                    Some(path) => {
                        ui::step_ok_detail(&ctx, &outcome.message, &path.display().to_string())
                    }
                    None => ui::step_ok(&ctx, &outcome.message),
                }
            } else {
                ui::step_error(&ctx, &outcome.message);
                if let Some(hint) = outcome.failure.and_then(|kind| kind.hint()) {
                    ui::step_warn_hint(&ctx, "Hint", hint);
                }
            }
        }
    }
    Ok(())
}
