//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, error, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                package,
                destination,
            } => match destination {
                Some(dest) => info!(package = %package, dest = %dest, "Starting run"),
                None => info!(package = %package, "Planning run"),
            },
            ProgressEvent::PhaseStarted { phase } => {
                debug!(phase = %phase, "Starting phase");
            }
            ProgressEvent::PhaseComplete { phase, duration } => {
                debug!(
                    phase = %phase,
                    duration_ms = duration.as_millis(),
                    "Phase complete"
                );
            }
            ProgressEvent::FilesIgnored { count } => {
                if *count > 0 {
                    info!(count, "Files ignored");
                }
            }
            ProgressEvent::RuntimeAnnotationDetected { module } => {
                warn!(
                    module = %module,
                    "numba usage detected; module will not be compiled"
                );
            }
            ProgressEvent::ManifestSelected { modules } => {
                info!(count = modules.len(), modules = ?modules, "Modules selected for compilation");
            }
            ProgressEvent::NothingToCompile => {
                info!("No modules selected for compilation, nothing to do");
            }
            ProgressEvent::MissingArtifact { module } => {
                error!(module = %module, "Cython produced no artifact for module");
            }
            ProgressEvent::Completed {
                artifacts,
                copied,
                total_time,
            } => {
                info!(
                    artifacts,
                    copied,
                    total_time_ms = total_time.as_millis(),
                    "Run complete"
                );
            }
            ProgressEvent::Failed { error: e } => {
                error!(error = %e, "Run failed");
            }
        }
    }
}
