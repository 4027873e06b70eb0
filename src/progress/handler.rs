//! Progress handler trait and events

use std::time::Duration;

/// Events emitted while a package is being processed
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run started
    Started {
        package: String,
        destination: Option<String>,
    },

    /// A pipeline phase started
    PhaseStarted { phase: String },

    /// A pipeline phase finished
    PhaseComplete { phase: String, duration: Duration },

    /// Files dropped from the destination tree
    FilesIgnored { count: usize },

    /// A module was demoted to a plain copy because it uses numba
    RuntimeAnnotationDetected { module: String },

    /// Modules submitted for compilation
    ManifestSelected { modules: Vec<String> },

    /// The manifest was empty; nothing was built or written
    NothingToCompile,

    /// A manifest entry produced no native artifact
    MissingArtifact { module: String },

    /// Run finished successfully
    Completed {
        artifacts: usize,
        copied: usize,
        total_time: Duration,
    },

    /// Run failed
    Failed { error: String },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
