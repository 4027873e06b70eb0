//! partcy - selective Cython compilation of Python packages
//!
//! Walks a Python package, decides per file whether it is compiled to a
//! native extension module, copied as source, copied as data, or dropped,
//! runs Cython over the selected modules, and assembles a destination tree
//! in which each compiled module is replaced by its native artifact.
//!
//! # Core Concepts
//!
//! - **Classification**: every file under the package gets exactly one
//!   [`Category`]; exclusion patterns win over everything else
//! - **Manifest**: the ordered list of modules handed to the build, either
//!   every compile candidate or only those whose first line opts in
//! - **Reconciliation**: the destination is rebuilt from scratch on every
//!   run, with artifacts standing in for the modules they were built from
//!
//! # Example Usage
//!
//! ```no_run
//! use partcy::build::CythonBuild;
//! use partcy::pipeline::{PipelineOptions, PipelineOrchestrator};
//! use partcy::PartcyConfig;
//! use std::path::Path;
//!
//! fn compile() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PartcyConfig::default();
//!     let build = CythonBuild::new(config.python.clone());
//!     let options = PipelineOptions::from_config(&config, build.resolve_ext_suffix())?;
//!
//!     let report = PipelineOrchestrator::new(options, &build)
//!         .execute(Path::new("mypkg"), Path::new("dist"))?;
//!     println!("{} files written", report.written.len());
//!     Ok(())
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`classify`]: source tree discovery and per-file classification
//! - [`manifest`]: manifest selection and the generated build script
//! - [`build`]: the Cython build invocation and its test double
//! - [`reconcile`]: destination tree assembly
//! - [`clean`]: removal of build byproducts from the source tree
//! - [`pipeline`]: orchestration of the above

pub mod build;
pub mod classify;
pub mod clean;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod progress;
pub mod reconcile;
pub mod util;

pub use build::{ArtifactSuffix, BuildError, BuildInvocation, CythonBuild, MockBuild};
pub use classify::{Category, Classification, CompileMarker, FileClassifier, FileRecord, SourceTree};
pub use config::{ConfigError, PartcyConfig};
pub use error::PipelineError;
pub use manifest::{Manifest, SelectionStrategy};
pub use pipeline::{PipelineOptions, PipelineOrchestrator, Plan, RunReport, RunStatus};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
