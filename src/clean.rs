//! Removal of compilation byproducts from the source tree

use crate::manifest::WrittenManifest;
use crate::reconcile::CompiledArtifact;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of the C translation unit Cython writes next to each module
pub const TRANSLATION_EXTENSION: &str = "c";

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanReport {
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Deletes copied artifacts, their C translation files, and the generated
/// manifest and build script. Failures are logged and collected, never raised.
pub fn clean_source_tree(artifacts: &[CompiledArtifact], manifest: &WrittenManifest) -> CleanReport {
    let mut report = CleanReport::default();

    for compiled in artifacts {
        remove(&compiled.artifact, &mut report);
        remove(&translation_file(compiled), &mut report);
    }
    remove(&manifest.list_path, &mut report);
    remove(&manifest.script_path, &mut report);

    debug!(
        removed = report.removed.len(),
        failed = report.failed.len(),
        "Source tree cleanup finished"
    );
    report
}

fn translation_file(compiled: &CompiledArtifact) -> PathBuf {
    let dir = compiled.artifact.parent().unwrap_or_else(|| Path::new(""));
    let stem = compiled
        .module
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}.{}", stem, TRANSLATION_EXTENSION))
}

fn remove(path: &Path, report: &mut CleanReport) {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed");
            report.removed.push(path.to_path_buf());
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove build byproduct");
            report.failed.push(path.to_path_buf());
        }
    }
}
