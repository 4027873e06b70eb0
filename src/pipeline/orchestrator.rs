use super::config::PipelineOptions;
use super::report::{Plan, RunReport, RunStatus};
use crate::build::BuildInvocation;
use crate::classify::{FileClassifier, SourceTree};
use crate::clean::clean_source_tree;
use crate::error::PipelineError;
use crate::manifest::Manifest;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::reconcile::{ArtifactReconciler, WriteKind};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Drives classify, select, build, reconcile, and the optional cleanup.
pub struct PipelineOrchestrator<'a> {
    options: PipelineOptions,
    build: &'a dyn BuildInvocation,
    progress_handler: Option<&'a dyn ProgressHandler>,
}

impl<'a> PipelineOrchestrator<'a> {
    pub fn new(options: PipelineOptions, build: &'a dyn BuildInvocation) -> Self {
        Self {
            options,
            build,
            progress_handler: None,
        }
    }

    pub fn with_progress(mut self, handler: &'a dyn ProgressHandler) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Classifies the package and selects the manifest without side effects
    pub fn plan(&self, package_dir: &Path) -> Result<Plan, PipelineError> {
        let result = SourceTree::open(package_dir).and_then(|tree| {
            self.emit(ProgressEvent::Started {
                package: tree.package_dir().display().to_string(),
                destination: None,
            });
            self.plan_tree(&tree)
        });
        self.report_failure(result)
    }

    /// Compiles the selected modules and assembles `dest`
    pub fn execute(&self, package_dir: &Path, dest: &Path) -> Result<RunReport, PipelineError> {
        let result = self.execute_inner(package_dir, dest);
        self.report_failure(result)
    }

    fn execute_inner(&self, package_dir: &Path, dest: &Path) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let tree = SourceTree::open(package_dir)?;
        tree.check_destination(dest, &self.options.aux_dirs)?;

        info!(
            package = %tree.package_dir().display(),
            dest = %dest.display(),
            build = self.build.name(),
            "Starting pipeline"
        );
        self.emit(ProgressEvent::Started {
            package: tree.package_dir().display().to_string(),
            destination: Some(dest.display().to_string()),
        });

        let plan = self.plan_tree(&tree)?;
        let mut report = RunReport::from_plan(&plan, dest.to_path_buf());

        if plan.manifest.is_empty() {
            info!("Manifest is empty; skipping build and leaving destination untouched");
            self.emit(ProgressEvent::NothingToCompile);
            report.duration_ms = start.elapsed().as_millis();
            return Ok(report);
        }

        self.emit(ProgressEvent::ManifestSelected {
            modules: plan
                .manifest
                .entries()
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
        });

        let written = self.phase("manifest", || plan.manifest.clone().write(tree.project_root()))?;

        self.phase("build", || {
            let outcome = self.build.compile(&written)?;
            debug!(
                tool = %outcome.tool,
                modules = outcome.modules,
                duration_ms = outcome.duration.as_millis(),
                "Build invocation finished"
            );
            Ok(())
        })?;

        let reconciler =
            ArtifactReconciler::new(&tree, self.options.suffix(), &self.options.aux_dirs);
        let outcome = self.phase("reconcile", || {
            reconciler.reconcile(&plan.classification, &plan.manifest, dest)
        })?;

        if self.options.clean {
            let cleaned = self.phase("clean", || Ok(clean_source_tree(&outcome.compiled, &written)))?;
            report.warnings.extend(
                cleaned
                    .failed
                    .iter()
                    .map(|p| format!("could not remove {}", p.display())),
            );
            report.cleaned = Some(cleaned);
        }

        report.status = RunStatus::Completed;
        report.written = outcome.written;
        report.duration_ms = start.elapsed().as_millis();

        self.emit(ProgressEvent::Completed {
            artifacts: report.count(WriteKind::Artifact),
            copied: report.count(WriteKind::Verbatim) + report.count(WriteKind::Auxiliary),
            total_time: start.elapsed(),
        });

        Ok(report)
    }

    fn plan_tree(&self, tree: &SourceTree) -> Result<Plan, PipelineError> {
        let classification = self.phase("classify", || {
            FileClassifier::new(self.options.rules.clone()).classify(tree)
        })?;

        self.emit(ProgressEvent::FilesIgnored {
            count: classification.ignored().count(),
        });
        for record in classification.runtime_annotated() {
            self.emit(ProgressEvent::RuntimeAnnotationDetected {
                module: record.path.display().to_string(),
            });
        }

        let manifest = self.phase("select", || {
            Ok(Manifest::select(&classification, self.options.strategy))
        })?;

        Ok(Plan {
            source: tree.package_dir().to_path_buf(),
            strategy: self.options.strategy,
            classification,
            manifest,
        })
    }

    fn phase<T>(
        &self,
        name: &str,
        run: impl FnOnce() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        debug!(phase = name, "Phase started");
        self.emit(ProgressEvent::PhaseStarted {
            phase: name.to_string(),
        });

        let phase_start = Instant::now();
        let value = run()?;

        self.emit(ProgressEvent::PhaseComplete {
            phase: name.to_string(),
            duration: phase_start.elapsed(),
        });
        Ok(value)
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = self.progress_handler {
            handler.on_progress(&event);
        }
    }

    fn report_failure<T>(&self, result: Result<T, PipelineError>) -> Result<T, PipelineError> {
        if let Err(e) = &result {
            if let PipelineError::MissingArtifact { module } = e {
                self.emit(ProgressEvent::MissingArtifact {
                    module: module.display().to_string(),
                });
            }
            self.emit(ProgressEvent::Failed {
                error: e.to_string(),
            });
        }
        result
    }
}
