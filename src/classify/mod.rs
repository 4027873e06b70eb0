//! Source tree discovery and per-file classification

pub mod classifier;
pub mod pattern;
pub mod record;
pub mod scan;

pub use classifier::{Classification, ClassifierRules, FileClassifier};
pub use pattern::PatternSet;
pub use record::{Category, FileRecord};
pub use scan::{CompileMarker, OPT_IN_MARKER};

use crate::error::PipelineError;
use std::path::{Path, PathBuf};

/// File name that turns a directory into an importable package
pub const PACKAGE_MARKER: &str = "__init__.py";

/// Extension of modules that are candidates for compilation
pub const MODULE_EXTENSION: &str = "py";

/// A Python package directory together with the project root that contains
/// it. Relative paths throughout the pipeline are taken from the project
/// root, so they begin with the package directory's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTree {
    package_dir: PathBuf,
    project_root: PathBuf,
}

impl SourceTree {
    pub fn open(package_dir: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let package_dir = package_dir.as_ref();
        if !package_dir.exists() {
            return Err(PipelineError::SourceNotFound(package_dir.to_path_buf()));
        }
        if !package_dir.is_dir() {
            return Err(PipelineError::NotADirectory(package_dir.to_path_buf()));
        }

        let package_dir = package_dir
            .canonicalize()
            .map_err(PipelineError::io(package_dir))?;
        let project_root = package_dir
            .parent()
            .ok_or_else(|| PipelineError::NoProjectRoot(package_dir.clone()))?
            .to_path_buf();

        Ok(Self {
            package_dir,
            project_root,
        })
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Resolves a project-relative path to an absolute one
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        self.project_root.join(relative)
    }

    /// Rejects destinations that would clobber the package or any auxiliary
    /// directory read from the project root
    pub fn check_destination(
        &self,
        dest: &Path,
        aux_dirs: &[String],
    ) -> Result<(), PipelineError> {
        let dest = absolute(dest);
        let guarded = std::iter::once(self.package_dir.clone())
            .chain(aux_dirs.iter().map(|aux| absolute(&self.project_root.join(aux))));

        for dir in guarded {
            if dest.starts_with(&dir) || dir.starts_with(&dest) {
                return Err(PipelineError::DestinationOverlapsSource {
                    dest,
                    source_dir: dir,
                });
            }
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    // The destination usually does not exist yet; anchor on its nearest
    // existing ancestor instead.
    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    loop {
        if let Ok(canonical) = current.canonicalize() {
            return missing.into_iter().rev().fold(canonical, |acc, c| acc.join(c));
        }
        match (current.file_name().map(|n| n.to_os_string()), current.parent()) {
            (Some(name), Some(parent)) => {
                missing.push(name);
                current = if parent.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    parent.to_path_buf()
                };
            }
            _ => return path.to_path_buf(),
        }
    }
}
