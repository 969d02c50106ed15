//! Accessibility probe for remote image references
//!
//! Starts a dry-run import into a throwaway directory and watches its
//! stderr. The first decisive line settles the verdict and the process is
//! killed straight away, so a multi-gigabyte transfer is never paid for
//! just to learn that the reference resolves.
//!
//! The scratch directory and the child process are released on every
//! path: decisive line, process exit, timeout and spawn failure.

mod classify;

pub use classify::{classify_line, watch_stream, ProbeVerdict};

use crate::error::{ImgCacheError, ImgCacheResult};
use crate::import::Importer;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Child;
use tracing::{debug, error, warn};

/// File name used for the disposable probe target
const PROBE_FILENAME: &str = "docker_image.sqsh";

/// Verdict plus the operator-facing message explaining it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub verdict: ProbeVerdict,
    pub message: String,
}

impl ProbeReport {
    fn decided(verdict: ProbeVerdict, reference: &str, line: &str) -> Self {
        let message = match verdict {
            ProbeVerdict::Accessible => {
                format!("Container image URL, {}, is accessible.", reference)
            }
            ProbeVerdict::Unauthorized => format!(
                "Failed to access container image URL: {}. Error: {}\n\
                 This error indicates that access to the container image URL is unauthorized. \
                 Please ensure you have the necessary permissions and have set up registry \
                 credentials for enroot in ~/.config/enroot/.credentials.",
                reference, line
            ),
            ProbeVerdict::Inaccessible => format!(
                "Failed to access container image URL: {}. Error: {}",
                reference, line
            ),
            ProbeVerdict::Unknown => Self::unknown_message(reference, "Unknown error."),
        };
        Self { verdict, message }
    }

    fn unknown(reference: &str, detail: &str) -> Self {
        Self {
            verdict: ProbeVerdict::Unknown,
            message: Self::unknown_message(reference, detail),
        }
    }

    fn unknown_message(reference: &str, detail: &str) -> String {
        format!("Failed to access container image URL: {}. {}", reference, detail)
    }

    /// Convert into a result; everything except `Accessible` is an error
    pub fn into_result(self) -> ImgCacheResult<String> {
        let message = self.message;
        match self.verdict {
            ProbeVerdict::Accessible => Ok(message),
            ProbeVerdict::Unauthorized => Err(ImgCacheError::Unauthorized { message }),
            ProbeVerdict::Inaccessible => Err(ImgCacheError::Inaccessible { message }),
            ProbeVerdict::Unknown => Err(ImgCacheError::ProbeUndecided { message }),
        }
    }
}

/// Dry-run prober for remote references
#[derive(Clone)]
pub struct AccessibilityProbe {
    importer: Arc<dyn Importer>,
    timeout: Option<Duration>,
}

impl AccessibilityProbe {
    /// Create a probe; `timeout = None` waits until the process exits
    pub fn new(importer: Arc<dyn Importer>, timeout: Option<Duration>) -> Self {
        Self { importer, timeout }
    }

    /// Probe `reference` and classify the result
    pub async fn probe(&self, reference: &str) -> ProbeReport {
        let scratch = match tempfile::Builder::new().prefix("imgcache-probe").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return ProbeReport::unknown(
                    reference,
                    &format!("Could not create probe directory: {}", e),
                )
            }
        };
        let target = scratch.path().join(PROBE_FILENAME);

        let report = self.run(reference, &target).await;
        discard_scratch(scratch, &target);

        debug!("Probe of {} finished: {}", reference, report.verdict);
        report
    }

    async fn run(&self, reference: &str, target: &Path) -> ProbeReport {
        let mut child = match self.importer.spawn_dry_run(reference, target) {
            Ok(child) => child,
            Err(e) => return ProbeReport::unknown(reference, &e.to_string()),
        };

        let Some(stderr) = child.stderr.take() else {
            terminate(&mut child).await;
            return ProbeReport::unknown(reference, "Probe stderr was not captured.");
        };

        let watched = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, watch_stream(stderr)).await {
                Ok(watched) => watched,
                Err(_) => {
                    warn!("Probe of {} timed out after {:?}", reference, limit);
                    terminate(&mut child).await;
                    return ProbeReport::unknown(
                        reference,
                        &format!("Probe timed out after {}s.", limit.as_secs()),
                    );
                }
            },
            None => watch_stream(stderr).await,
        };

        terminate(&mut child).await;

        match watched {
            Some((verdict, line)) => {
                debug!("Probe line for {}: {}", reference, line);
                ProbeReport::decided(verdict, reference, &line)
            }
            None => ProbeReport::unknown(reference, "Unknown error."),
        }
    }
}

/// Kill the child if it is still running and reap it
async fn terminate(child: &mut Child) {
    match child.try_wait() {
        Ok(Some(status)) => debug!("Probe process already exited: {}", status),
        Ok(None) | Err(_) => {
            if let Err(e) = child.kill().await {
                warn!("Failed to terminate probe process: {}", e);
            }
        }
    }
}

fn discard_scratch(scratch: TempDir, target: &Path) {
    if target.exists() {
        match std::fs::remove_file(target) {
            Ok(()) => debug!("Temporary image file removed: {}", target.display()),
            Err(e) => error!(
                "Failed to remove temporary image file {}. Error: {}",
                target.display(),
                e
            ),
        }
    }
    let dir = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        error!(
            "Failed to remove probe directory {}. Error: {}",
            dir.display(),
            e
        );
    }
}
