//! Serializable summaries of a plan or a run

use crate::classify::{Category, Classification, FileRecord};
use crate::clean::CleanReport;
use crate::manifest::{Manifest, SelectionStrategy};
use crate::reconcile::{WriteKind, WrittenFile};
use serde::Serialize;
use std::path::PathBuf;

/// What a run would do, without building or writing anything
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub source: PathBuf,
    pub strategy: SelectionStrategy,
    #[serde(flatten)]
    pub classification: Classification,
    pub manifest: Manifest,
}

impl Plan {
    pub fn count(&self, category: Category) -> usize {
        self.classification.count(category)
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.classification.records
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    /// The manifest was empty; no build ran and the destination was not touched
    NothingToCompile,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub strategy: SelectionStrategy,
    pub status: RunStatus,
    pub manifest: Manifest,
    pub ignored: Vec<PathBuf>,
    pub skipped_artifacts: Vec<PathBuf>,
    pub runtime_annotated: Vec<PathBuf>,
    pub written: Vec<WrittenFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleaned: Option<CleanReport>,
    pub warnings: Vec<String>,
    pub duration_ms: u128,
}

impl RunReport {
    pub(crate) fn from_plan(plan: &Plan, destination: PathBuf) -> Self {
        let classification = &plan.classification;
        let runtime_annotated: Vec<PathBuf> = classification
            .runtime_annotated()
            .map(|r| r.path.clone())
            .collect();
        let warnings = runtime_annotated
            .iter()
            .map(|p| format!("{} uses numba and was copied without compiling", p.display()))
            .collect();

        Self {
            source: plan.source.clone(),
            destination,
            strategy: plan.strategy,
            status: RunStatus::NothingToCompile,
            manifest: plan.manifest.clone(),
            ignored: classification.ignored().map(|r| r.path.clone()).collect(),
            skipped_artifacts: classification.skipped_artifacts.clone(),
            runtime_annotated,
            written: Vec::new(),
            cleaned: None,
            warnings,
            duration_ms: 0,
        }
    }

    pub fn count(&self, kind: WriteKind) -> usize {
        self.written.iter().filter(|w| w.kind == kind).count()
    }

    pub fn is_nothing_to_compile(&self) -> bool {
        self.status == RunStatus::NothingToCompile
    }
}
