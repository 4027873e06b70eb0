//! Selection of the modules submitted to native compilation
//!
//! The manifest is persisted next to the package as a newline-joined list of
//! project-relative paths, alongside a generated `setup_generated.py` that
//! feeds the list to `cythonize`.

use crate::classify::pattern::normalize;
use crate::classify::{Category, Classification};
use crate::error::PipelineError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MANIFEST_FILE_NAME: &str = "_obfuscate_list.txt";
pub const BUILD_SCRIPT_FILE_NAME: &str = "setup_generated.py";

const BUILD_SCRIPT: &str = r#"# Generated by partcy. Do not edit.
from pathlib import Path

from Cython.Build import cythonize
from setuptools import setup

HERE = Path(__file__).resolve().parent
MODULES = [
    line.strip()
    for line in (HERE / "_obfuscate_list.txt").read_text(encoding="utf-8").splitlines()
    if line.strip()
]

setup(
    name="partcy-generated",
    ext_modules=cythonize(MODULES, compiler_directives={"language_level": "3"}),
)
"#;

/// How compile candidates are chosen for the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Every compile candidate is submitted
    CompileAll,
    /// Only modules whose first line carries the opt-in marker are submitted
    #[default]
    Selective,
}

impl SelectionStrategy {
    pub fn from_compile_all(compile_all: bool) -> Self {
        if compile_all {
            SelectionStrategy::CompileAll
        } else {
            SelectionStrategy::Selective
        }
    }
}

/// Ordered list of project-relative module paths to compile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    entries: Vec<PathBuf>,
}

impl Manifest {
    pub fn select(classification: &Classification, strategy: SelectionStrategy) -> Self {
        let entries: Vec<PathBuf> = classification
            .with_category(Category::Compile)
            .filter(|r| match strategy {
                SelectionStrategy::CompileAll => true,
                SelectionStrategy::Selective => r.marker.is_forced(),
            })
            .map(|r| r.path.clone())
            .collect();

        debug!(?strategy, selected = entries.len(), "Manifest selected");
        Self { entries }
    }

    pub fn from_entries(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, relative: &Path) -> bool {
        self.entries.iter().any(|e| e == relative)
    }

    /// Newline-joined entries with `/` separators
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| normalize(e))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Writes the manifest and the generated build script into `project_root`
    pub fn write(self, project_root: &Path) -> Result<WrittenManifest, PipelineError> {
        let list_path = project_root.join(MANIFEST_FILE_NAME);
        let script_path = project_root.join(BUILD_SCRIPT_FILE_NAME);

        fs::write(&list_path, self.render()).map_err(PipelineError::io(&list_path))?;
        fs::write(&script_path, BUILD_SCRIPT).map_err(PipelineError::io(&script_path))?;

        info!(
            modules = self.len(),
            manifest = %list_path.display(),
            "Wrote compilation manifest"
        );

        Ok(WrittenManifest {
            manifest: self,
            project_root: project_root.to_path_buf(),
            list_path,
            script_path,
        })
    }
}

/// A manifest that has been persisted for the build invocation
#[derive(Debug, Clone)]
pub struct WrittenManifest {
    pub manifest: Manifest,
    pub project_root: PathBuf,
    pub list_path: PathBuf,
    pub script_path: PathBuf,
}

impl WrittenManifest {
    pub fn entries(&self) -> &[PathBuf] {
        self.manifest.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{CompileMarker, FileRecord};
    use tempfile::TempDir;

    fn record(path: &str, category: Category, marker: CompileMarker) -> FileRecord {
        let mut r = FileRecord::new(PathBuf::from(path), category);
        r.marker = marker;
        r
    }

    fn classification() -> Classification {
        Classification {
            records: vec![
                record("pkg/__init__.py", Category::PlainCopy, CompileMarker::NotMarked),
                record("pkg/a.py", Category::Compile, CompileMarker::ForceCompile),
                record("pkg/b.py", Category::Compile, CompileMarker::NotMarked),
                record("pkg/sub/c.py", Category::Compile, CompileMarker::ForceCompile),
                record("pkg/jit.py", Category::PlainCopy, CompileMarker::ForceCompile),
                record("pkg/info.csv", Category::DataCopy, CompileMarker::NotMarked),
            ],
            skipped_artifacts: Vec::new(),
        }
    }

    #[test]
    fn test_selective_takes_marked_modules_only() {
        let manifest = Manifest::select(&classification(), SelectionStrategy::Selective);
        assert_eq!(
            manifest.entries(),
            &[PathBuf::from("pkg/a.py"), PathBuf::from("pkg/sub/c.py")]
        );
        assert!(!manifest.contains(Path::new("pkg/b.py")));
    }

    #[test]
    fn test_compile_all_ignores_markers() {
        let manifest = Manifest::select(&classification(), SelectionStrategy::CompileAll);
        assert_eq!(manifest.len(), 3);
        assert!(manifest.contains(Path::new("pkg/b.py")));
    }

    #[test]
    fn test_downgraded_modules_never_selected() {
        for strategy in [SelectionStrategy::Selective, SelectionStrategy::CompileAll] {
            let manifest = Manifest::select(&classification(), strategy);
            assert!(!manifest.contains(Path::new("pkg/jit.py")));
            assert!(!manifest.contains(Path::new("pkg/__init__.py")));
        }
    }

    #[test]
    fn test_empty_selection() {
        let c = Classification {
            records: vec![record("pkg/b.py", Category::Compile, CompileMarker::NotMarked)],
            skipped_artifacts: Vec::new(),
        };
        assert!(Manifest::select(&c, SelectionStrategy::Selective).is_empty());
    }

    #[test]
    fn test_strategy_from_flag() {
        assert_eq!(
            SelectionStrategy::from_compile_all(true),
            SelectionStrategy::CompileAll
        );
        assert_eq!(
            SelectionStrategy::from_compile_all(false),
            SelectionStrategy::Selective
        );
        assert_eq!(SelectionStrategy::default(), SelectionStrategy::Selective);
    }

    #[test]
    fn test_render_is_newline_joined() {
        let manifest = Manifest::select(&classification(), SelectionStrategy::Selective);
        assert_eq!(manifest.render(), "pkg/a.py\npkg/sub/c.py");
    }

    #[test]
    fn test_write_creates_manifest_and_script() {
        let temp = TempDir::new().unwrap();
        let manifest = Manifest::select(&classification(), SelectionStrategy::Selective);

        let written = manifest.write(temp.path()).unwrap();

        assert_eq!(written.list_path, temp.path().join(MANIFEST_FILE_NAME));
        assert_eq!(
            fs::read_to_string(&written.list_path).unwrap(),
            "pkg/a.py\npkg/sub/c.py"
        );
        let script = fs::read_to_string(&written.script_path).unwrap();
        assert!(script.contains("cythonize"));
        assert!(script.contains(MANIFEST_FILE_NAME));
        assert_eq!(written.entries().len(), 2);
    }
}
