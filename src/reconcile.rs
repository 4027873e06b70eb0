//! Assembly of the destination tree
//!
//! Every retained record lands at its project-relative path under the
//! destination. Manifest entries are replaced by their native artifact;
//! everything else is copied byte for byte.

use crate::build::ArtifactSuffix;
use crate::classify::{Classification, SourceTree};
use crate::error::PipelineError;
use crate::manifest::Manifest;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// How a destination file was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteKind {
    Artifact,
    Verbatim,
    Auxiliary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    /// Path relative to the destination root
    pub path: PathBuf,
    pub kind: WriteKind,
}

/// A native artifact copied out of the source tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledArtifact {
    pub module: PathBuf,
    /// Absolute path of the artifact inside the source tree
    pub artifact: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconcileOutcome {
    pub written: Vec<WrittenFile>,
    pub compiled: Vec<CompiledArtifact>,
}

impl ReconcileOutcome {
    pub fn count(&self, kind: WriteKind) -> usize {
        self.written.iter().filter(|w| w.kind == kind).count()
    }
}

pub struct ArtifactReconciler<'a> {
    tree: &'a SourceTree,
    suffix: &'a ArtifactSuffix,
    aux_dirs: &'a [String],
}

impl<'a> ArtifactReconciler<'a> {
    pub fn new(tree: &'a SourceTree, suffix: &'a ArtifactSuffix, aux_dirs: &'a [String]) -> Self {
        Self {
            tree,
            suffix,
            aux_dirs,
        }
    }

    /// Rebuilds `dest` from scratch. Aborts on the first module whose
    /// artifact cannot be found, leaving the destination partially written.
    pub fn reconcile(
        &self,
        classification: &Classification,
        manifest: &Manifest,
        dest: &Path,
    ) -> Result<ReconcileOutcome, PipelineError> {
        reset_destination(dest)?;
        let mut outcome = ReconcileOutcome::default();

        for record in classification.retained() {
            if manifest.contains(&record.path) {
                let artifact = self.locate_artifact(&record.path)?;
                let file_name = artifact
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_default();
                let relative = record
                    .path
                    .parent()
                    .map(|p| p.join(&file_name))
                    .unwrap_or(file_name);

                copy_file(&artifact, &dest.join(&relative))?;
                debug!(module = %record.path.display(), artifact = %relative.display(), "Copied native artifact");

                outcome.written.push(WrittenFile {
                    path: relative,
                    kind: WriteKind::Artifact,
                });
                outcome.compiled.push(CompiledArtifact {
                    module: record.path.clone(),
                    artifact,
                });
            } else {
                copy_file(&self.tree.resolve(&record.path), &dest.join(&record.path))?;
                outcome.written.push(WrittenFile {
                    path: record.path.clone(),
                    kind: WriteKind::Verbatim,
                });
            }
        }

        for aux in self.aux_dirs {
            self.copy_auxiliary(aux, dest, &mut outcome)?;
        }

        info!(
            artifacts = outcome.count(WriteKind::Artifact),
            verbatim = outcome.count(WriteKind::Verbatim),
            auxiliary = outcome.count(WriteKind::Auxiliary),
            dest = %dest.display(),
            "Destination tree assembled"
        );

        Ok(outcome)
    }

    /// Finds the artifact built for `module`: the exact host-suffixed name
    /// first, then a sibling `<stem>.<tag>` with the same final extension.
    pub fn locate_artifact(&self, module: &Path) -> Result<PathBuf, PipelineError> {
        let source = self.tree.resolve(module);
        let missing = || {
            error!(module = %module.display(), "No compiled artifact found");
            PipelineError::MissingArtifact {
                module: module.to_path_buf(),
            }
        };

        let stem = module.file_stem().and_then(|s| s.to_str()).ok_or_else(missing)?;
        let dir = source.parent().ok_or_else(missing)?;

        let exact = dir.join(self.suffix.artifact_name(stem));
        if exact.is_file() {
            return Ok(exact);
        }

        let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
            .map_err(PipelineError::io(dir))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|name| self.suffix.matches_artifact(stem, name))
                    .unwrap_or(false)
            })
            .collect();
        candidates.sort();

        let found = candidates.into_iter().next().ok_or_else(missing)?;
        warn!(
            module = %module.display(),
            expected = %exact.display(),
            found = %found.display(),
            "Exact artifact name not found, using sibling artifact"
        );
        Ok(found)
    }

    fn copy_auxiliary(
        &self,
        name: &str,
        dest: &Path,
        outcome: &mut ReconcileOutcome,
    ) -> Result<(), PipelineError> {
        let root = self.tree.project_root().join(name);
        if !root.is_dir() {
            debug!(dir = %root.display(), "Auxiliary directory not present, skipping");
            return Ok(());
        }

        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|source| PipelineError::Walk {
                path: root.clone(),
                source,
            })?;
            if !entry.path().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(self.tree.project_root())
                .unwrap_or(entry.path())
                .to_path_buf();
            copy_file(entry.path(), &dest.join(&relative))?;
            outcome.written.push(WrittenFile {
                path: relative,
                kind: WriteKind::Auxiliary,
            });
        }
        Ok(())
    }
}

fn reset_destination(dest: &Path) -> Result<(), PipelineError> {
    if dest.exists() {
        debug!(dest = %dest.display(), "Removing previous destination tree");
        fs::remove_dir_all(dest).map_err(PipelineError::io(dest))?;
    }
    fs::create_dir_all(dest).map_err(PipelineError::io(dest))
}

fn copy_file(from: &Path, to: &Path) -> Result<(), PipelineError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(PipelineError::io(parent))?;
    }
    fs::copy(from, to).map_err(PipelineError::io(from))?;
    Ok(())
}
