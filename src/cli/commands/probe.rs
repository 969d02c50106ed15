//! Probe and prereq commands - reachability checks without importing

use crate::cache::ArtifactCacheManager;
use crate::cli::args::{OutputFormat, ProbeArgs};
use crate::config::Config;
use crate::error::ImgCacheResult;
use crate::probe::ProbeVerdict;
use crate::ui::{self, TaskSpinner, UiContext};

/// Run only the accessibility probe
pub async fn execute_probe(args: ProbeArgs, config: &Config) -> ImgCacheResult<bool> {
    let manager = ArtifactCacheManager::from_config(config);
    let ctx = UiContext::detect();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Probing {}", args.reference));
    let report = manager.probe().probe(&args.reference).await;
    spinner.clear();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => {
            if report.verdict.is_accessible() {
                ui::step_ok(&ctx, &report.message);
            } else {
                ui::step_error_detail(&ctx, &report.verdict.to_string(), &report.message);
                if report.verdict == ProbeVerdict::Unauthorized {
                    ui::step_warn_hint(
                        &ctx,
                        "Registry credentials",
                        "Add them to ~/.config/enroot/.credentials",
                    );
                }
            }
            ui::key_value("verdict", &report.verdict.to_string());
        }
    }

    Ok(report.verdict.is_accessible())
}

/// Check binaries and reachability
pub async fn execute_prereq(args: ProbeArgs, config: &Config) -> ImgCacheResult<bool> {
    let manager = ArtifactCacheManager::from_config(config);
    let ctx = UiContext::detect();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Checking prerequisites for {}", args.reference));
    let result = manager.prerequisites().check(&args.reference).await;
    spinner.clear();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text if result.ok => ui::step_ok(&ctx, &result.message),
        OutputFormat::Text => ui::step_error(&ctx, &result.message),
    }

    Ok(result.ok)
}
