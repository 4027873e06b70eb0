use crate::build::BuildError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Source package does not exist: {0}")]
    SourceNotFound(PathBuf),
    #[error("Source package is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Source package has no parent directory to act as project root: {0}")]
    NoProjectRoot(PathBuf),
    #[error("Destination {dest} overlaps source directory {source_dir}")]
    DestinationOverlapsSource { dest: PathBuf, source_dir: PathBuf },
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("I/O error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error(
        "Could not find compiled file for {module}. This means that cython failed to compile the file."
    )]
    MissingArtifact { module: PathBuf },
    #[error("Build invocation failed: {0}")]
    Build(#[from] BuildError),
}

impl PipelineError {
    pub(crate) fn io(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        move |source| PipelineError::Io { path, source }
    }
}
