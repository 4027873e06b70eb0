//! Output formatting for run reports and plans
//!
//! JSON and YAML serialize the report types directly; the human format is a
//! short summary meant for a terminal.
//!
//! # Example
//!
//! ```ignore
//! use partcy::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! println!("{}", formatter.format_report(&report)?);
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::classify::{pattern::normalize, Category};
use crate::manifest::{Manifest, SelectionStrategy};
use crate::pipeline::{Plan, RunReport, RunStatus};
use crate::reconcile::WriteKind;

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable summary
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_report(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(report, "run report"),
            OutputFormat::Yaml => to_yaml(report, "run report"),
            OutputFormat::Human => Ok(self.format_report_human(report)),
        }
    }

    pub fn format_plan(&self, plan: &Plan) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(plan, "plan"),
            OutputFormat::Yaml => to_yaml(plan, "plan"),
            OutputFormat::Human => Ok(self.format_plan_human(plan)),
        }
    }

    fn format_report_human(&self, report: &RunReport) -> String {
        let mut output = String::new();

        match report.status {
            RunStatus::Completed => output.push_str("\u{2713} Build Complete\n"),
            RunStatus::NothingToCompile => output.push_str("\u{2713} Nothing To Compile\n"),
        }
        output.push_str(RULE);
        output.push_str("\n\n");

        output.push_str(&format!("Source:       {}\n", report.source.display()));
        output.push_str(&format!("Destination:  {}\n", report.destination.display()));
        output.push_str(&format!("Strategy:     {}\n\n", strategy_label(report.strategy)));

        push_manifest(&mut output, &report.manifest);

        if report.status == RunStatus::Completed {
            output.push_str("Destination Tree:\n");
            output.push_str(&format!(
                "\u{251C}\u{2500} Native artifacts:  {}\n",
                report.count(WriteKind::Artifact)
            ));
            output.push_str(&format!(
                "\u{251C}\u{2500} Copied verbatim:   {}\n",
                report.count(WriteKind::Verbatim)
            ));
            output.push_str(&format!(
                "\u{2514}\u{2500} Auxiliary files:   {}\n\n",
                report.count(WriteKind::Auxiliary)
            ));
        } else {
            output.push_str("Destination left untouched.\n\n");
        }

        if !report.ignored.is_empty() {
            output.push_str(&format!("Ignored files: {}\n", report.ignored.len()));
        }
        if !report.skipped_artifacts.is_empty() {
            output.push_str(&format!(
                "Pre-existing native artifacts skipped: {}\n",
                report.skipped_artifacts.len()
            ));
        }
        if let Some(cleaned) = &report.cleaned {
            output.push_str(&format!(
                "Cleaned from source tree: {} file(s)\n",
                cleaned.removed.len()
            ));
        }

        if !report.warnings.is_empty() {
            output.push_str("\n\u{26A0} Warnings:\n");
            for warning in &report.warnings {
                output.push_str(&format!("  - {}\n", warning));
            }
        }

        output.push_str(&format!("\nProcessed in {}ms\n", report.duration_ms));
        output
    }

    fn format_plan_human(&self, plan: &Plan) -> String {
        let mut output = String::new();

        output.push_str("Compilation Plan\n");
        output.push_str(RULE);
        output.push_str("\n\n");
        output.push_str(&format!("Source:    {}\n", plan.source.display()));
        output.push_str(&format!("Strategy:  {}\n\n", strategy_label(plan.strategy)));

        output.push_str("Files:\n");
        for record in plan.records() {
            let note = if record.uses_runtime_annotation {
                "  (numba)"
            } else {
                ""
            };
            output.push_str(&format!(
                "  {:<8} {}{}\n",
                record.category.to_string(),
                normalize(&record.path),
                note
            ));
        }
        output.push('\n');

        output.push_str(&format!(
            "Compile candidates: {}  Plain: {}  Data: {}  Ignored: {}\n\n",
            plan.count(Category::Compile),
            plan.count(Category::PlainCopy),
            plan.count(Category::DataCopy),
            plan.count(Category::Ignored)
        ));

        push_manifest(&mut output, &plan.manifest);
        output
    }
}

fn push_manifest(output: &mut String, manifest: &Manifest) {
    if manifest.is_empty() {
        output.push_str("Manifest: (empty)\n\n");
        return;
    }
    output.push_str(&format!("Manifest ({} module(s)):\n", manifest.len()));
    for (i, entry) in manifest.entries().iter().enumerate() {
        let connector = if i == manifest.len() - 1 {
            "\u{2514}"
        } else {
            "\u{251C}"
        };
        output.push_str(&format!("{}\u{2500} {}\n", connector, normalize(entry)));
    }
    output.push('\n');
}

fn strategy_label(strategy: SelectionStrategy) -> &'static str {
    match strategy {
        SelectionStrategy::CompileAll => "compile all",
        SelectionStrategy::Selective => "selective (opt-in marker)",
    }
}

fn to_json<T: Serialize>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value).with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}
