use super::pattern::PatternSet;
use super::record::{Category, FileRecord};
use super::scan::{decode_lossy, uses_runtime_annotation, CompileMarker};
use super::{SourceTree, MODULE_EXTENSION, PACKAGE_MARKER};
use crate::build::ArtifactSuffix;
use crate::error::PipelineError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Pattern sets and platform facts that drive classification
#[derive(Debug, Clone)]
pub struct ClassifierRules {
    pub always_exclude: PatternSet,
    pub include_data: PatternSet,
    pub never_obfuscate: PatternSet,
    pub artifact_suffix: ArtifactSuffix,
}

impl ClassifierRules {
    pub fn new(artifact_suffix: ArtifactSuffix) -> Self {
        Self {
            always_exclude: PatternSet::empty(),
            include_data: PatternSet::empty(),
            never_obfuscate: PatternSet::empty(),
            artifact_suffix,
        }
    }
}

/// Result of the single walk over the source package
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub records: Vec<FileRecord>,
    /// Pre-existing native artifacts that were skipped outright
    pub skipped_artifacts: Vec<PathBuf>,
}

impl Classification {
    pub fn with_category(&self, category: Category) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(move |r| r.category == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.with_category(category).count()
    }

    pub fn retained(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.is_retained())
    }

    pub fn ignored(&self) -> impl Iterator<Item = &FileRecord> {
        self.with_category(Category::Ignored)
    }

    /// Modules demoted to plain copies because they rely on numba's JIT
    pub fn runtime_annotated(&self) -> impl Iterator<Item = &FileRecord> {
        self.records.iter().filter(|r| r.uses_runtime_annotation)
    }

    pub fn get(&self, relative: &Path) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.path == relative)
    }
}

/// A record from the first pass; compile candidates carry their text so the
/// second pass does not have to read them again.
struct Tentative {
    record: FileRecord,
    content: Option<String>,
}

pub struct FileClassifier {
    rules: ClassifierRules,
}

impl FileClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    pub fn classify(&self, tree: &SourceTree) -> Result<Classification, PipelineError> {
        let (tentative, skipped_artifacts) = self.walk(tree)?;
        let records = screen_runtime_annotations(tentative);

        let classification = Classification {
            records,
            skipped_artifacts,
        };

        info!(
            compile = classification.count(Category::Compile),
            plain = classification.count(Category::PlainCopy),
            data = classification.count(Category::DataCopy),
            ignored = classification.count(Category::Ignored),
            "Classification complete"
        );

        Ok(classification)
    }

    fn walk(&self, tree: &SourceTree) -> Result<(Vec<Tentative>, Vec<PathBuf>), PipelineError> {
        let mut tentative = Vec::new();
        let mut skipped = Vec::new();

        for entry in WalkDir::new(tree.package_dir())
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| PipelineError::Walk {
                path: tree.package_dir().to_path_buf(),
                source,
            })?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let relative = path
                .strip_prefix(tree.project_root())
                .unwrap_or(path)
                .to_path_buf();
            let file_name = entry.file_name().to_string_lossy();

            if self.rules.artifact_suffix.is_artifact(&file_name) {
                debug!(path = %relative.display(), "Skipping pre-existing native artifact");
                skipped.push(relative);
                continue;
            }

            tentative.push(self.classify_file(path, relative, &file_name)?);
        }

        Ok((tentative, skipped))
    }

    fn classify_file(
        &self,
        path: &Path,
        relative: PathBuf,
        file_name: &str,
    ) -> Result<Tentative, PipelineError> {
        if self.rules.always_exclude.matches(&relative) {
            return Ok(Tentative {
                record: FileRecord::new(relative, Category::Ignored),
                content: None,
            });
        }

        if is_module(&relative) {
            if file_name == PACKAGE_MARKER || self.rules.never_obfuscate.matches(&relative) {
                return Ok(Tentative {
                    record: FileRecord::new(relative, Category::PlainCopy),
                    content: None,
                });
            }

            let bytes = fs::read(path).map_err(PipelineError::io(path))?;
            let content = decode_lossy(&bytes).into_owned();
            let mut record = FileRecord::new(relative, Category::Compile);
            record.marker = CompileMarker::parse(&content);
            return Ok(Tentative {
                record,
                content: Some(content),
            });
        }

        let category = if self.rules.include_data.matches(&relative) {
            Category::DataCopy
        } else {
            Category::Ignored
        };
        Ok(Tentative {
            record: FileRecord::new(relative, category),
            content: None,
        })
    }
}

/// Second pass: compile candidates that import numba cannot be compiled
/// ahead of time and are demoted to plain copies.
fn screen_runtime_annotations(tentative: Vec<Tentative>) -> Vec<FileRecord> {
    tentative
        .into_iter()
        .map(|Tentative { mut record, content }| {
            let jit = record.category == Category::Compile
                && content.as_deref().map(uses_runtime_annotation).unwrap_or(false);
            if jit {
                warn!(
                    module = %record.path.display(),
                    "Module uses numba and will be copied as plain Python instead of compiled"
                );
                record.category = Category::PlainCopy;
                record.uses_runtime_annotation = true;
            }
            record
        })
        .collect()
}

fn is_module(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MODULE_EXTENSION)
}
