//! Native compilation behind a capability interface
//!
//! The pipeline never compiles anything itself. It hands a written manifest
//! to a [`BuildInvocation`] and later checks the source tree for the
//! artifacts the invocation promised to leave beside each module.

pub mod cython;
pub mod mock;
pub mod suffix;

pub use cython::CythonBuild;
pub use mock::{MockBehavior, MockBuild};
pub use suffix::ArtifactSuffix;

use crate::manifest::WrittenManifest;
use std::io;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },
    #[error("Build command exited unsuccessfully ({})", describe_exit(.code))]
    Failed { code: Option<i32> },
    #[error("{0}")]
    Other(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// What a completed build reports back
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub tool: String,
    pub modules: usize,
    pub duration: Duration,
}

/// Produces one native artifact per manifest entry, in place beside the
/// module's source file. Blocks until the toolchain returns.
pub trait BuildInvocation: Send + Sync {
    fn name(&self) -> &str;

    fn compile(&self, manifest: &WrittenManifest) -> Result<BuildOutcome, BuildError>;
}
