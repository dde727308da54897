//! reportgen core library - per-student feedback reports from grader remarks

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Feedback resolution is a pure function of (section, remark, dictionary)
// - No global mutable state; input and output roots are passed in explicitly
// - No threads or async
// - Assignment folders are processed in sorted name order
// - Per-folder input problems are diagnostics, never aborts

pub mod assignment;
pub mod config;
pub mod diagnostics;
pub mod feedback;
pub mod html;
pub mod output;
pub mod report;

pub use config::ResolvedConfig;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use feedback::{resolve, FeedbackResolver, ResponseDictionary};
pub use report::{render_json, render_text, RunSummary, StudentReport};

use anyhow::Result;
use assignment::Assignment;
use diagnostics::Tally;
use output::ManifestEntry;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Where to read assignments from and where to write reports
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub manifest_name: String,
    pub title: String,
}

impl PipelineOptions {
    /// Options for an input root using the resolved config's output settings
    pub fn from_config(input_root: &Path, config: &ResolvedConfig) -> Self {
        PipelineOptions {
            input_root: input_root.to_path_buf(),
            output_root: config.output_root(input_root),
            manifest_name: config.manifest_name.clone(),
            title: config.title.clone(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.output_root.join(&self.manifest_name)
    }
}

/// Generate reports for every assignment folder under the input root
///
/// Writes one HTML file per student with a valid ID, then updates the
/// manifest: rows for questions processed in this run are replaced.
/// Fails only when the input root cannot be listed or output cannot be written.
pub fn generate_reports(
    options: &PipelineOptions,
    config: &ResolvedConfig,
    sink: &dyn DiagnosticSink,
) -> Result<RunSummary> {
    if !options.input_root.is_dir() {
        anyhow::bail!(
            "Input root is not a directory: {}",
            options.input_root.display()
        );
    }

    let tally = Tally::new(sink);
    let folders =
        assignment::discover_assignments(&options.input_root, config, Some(&options.output_root))?;

    let mut summary = RunSummary {
        output_root: options.output_root.clone(),
        manifest_path: options.manifest_path(),
        ..Default::default()
    };
    let mut manifest = Vec::new();
    let mut processed_questions = HashSet::new();
    let mut written = HashSet::new();

    for folder in folders {
        let folder_name = folder
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let reason = match assignment::load_assignment(&folder, &tally) {
            Ok(Some(loaded)) => {
                summary.folders_processed += 1;
                processed_questions.insert(loaded.question.clone());
                manifest.extend(process_assignment(
                    &loaded,
                    options,
                    &tally,
                    &mut summary,
                    &mut written,
                )?);
                continue;
            }
            Ok(None) => format!("{} is missing or empty", assignment::INPUTS_FILE),
            Err(e) => format!("{:#}", e),
        };

        tally.report(&Diagnostic::FolderSkipped {
            folder: folder_name,
            reason,
        });
        summary.folders_skipped += 1;
    }

    // Rows for questions not processed in this run stay in the manifest
    let existing = if summary.manifest_path.is_file() {
        output::read_manifest(&summary.manifest_path)?
    } else {
        Vec::new()
    };
    let manifest = output::merge_manifest(existing, &processed_questions, manifest);

    output::write_manifest(&summary.manifest_path, &manifest)?;
    summary.unmatched_remarks = tally.unmatched();
    tracing::info!(
        reports = summary.reports_written,
        rows = manifest.len(),
        manifest = %summary.manifest_path.display(),
        "manifest written"
    );

    Ok(summary)
}

/// Write reports for one loaded assignment, returning their manifest rows
///
/// `written` holds the report file names already produced in this run; a
/// student whose file name is taken is skipped instead of overwriting it.
pub fn process_assignment(
    assignment: &Assignment,
    options: &PipelineOptions,
    sink: &dyn DiagnosticSink,
    summary: &mut RunSummary,
    written: &mut HashSet<String>,
) -> Result<Vec<ManifestEntry>> {
    tracing::debug!(
        folder = %assignment.path.display(),
        question = %assignment.question,
        students = assignment.students.len(),
        "processing assignment"
    );

    let resolver = FeedbackResolver::new(&assignment.responses, sink);
    let mut entries = Vec::new();

    for student in &assignment.students {
        let Some(report) = report::build_student_report(assignment, student, &resolver) else {
            sink.report(&Diagnostic::StudentSkipped {
                folder: assignment.question.clone(),
                name: student.name(),
                reason: "missing or invalid NIAT ID".to_string(),
            });
            summary.students_skipped += 1;
            continue;
        };

        let file_name = report.file_name();
        if !written.insert(file_name.clone()) {
            sink.report(&Diagnostic::StudentSkipped {
                folder: assignment.question.clone(),
                name: report.name.clone(),
                reason: format!("report {} was already written in this run", file_name),
            });
            summary.students_skipped += 1;
            continue;
        }

        let path = options.output_root.join(&file_name);
        output::atomic_write(&path, &html::render_student_html(&report, &options.title))?;
        tracing::info!(path = %path.display(), "report generated");

        summary.reports_written += 1;
        entries.push(ManifestEntry::from(&report));
    }

    Ok(entries)
}
