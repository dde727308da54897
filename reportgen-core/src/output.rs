//! Writing reports and the manifest to the output root

use crate::report::StudentReport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Manifest column headers, in order
pub const MANIFEST_HEADERS: [&str; 4] = [
    "NIAT ID",
    "Student Name",
    "Assigned Question",
    "Report Filename",
];

/// One manifest row per written report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(rename = "NIAT ID")]
    pub student_id: String,
    #[serde(rename = "Student Name")]
    pub student_name: String,
    #[serde(rename = "Assigned Question")]
    pub question: String,
    #[serde(rename = "Report Filename")]
    pub report_filename: String,
}

impl From<&StudentReport> for ManifestEntry {
    fn from(report: &StudentReport) -> Self {
        ManifestEntry {
            student_id: report.student_id.clone(),
            student_name: report.name.clone(),
            question: report.question.clone(),
            report_filename: report.file_name(),
        }
    }
}

/// Render manifest rows as CSV, header first even when there are no rows
pub fn render_manifest(entries: &[ManifestEntry]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(MANIFEST_HEADERS)
        .context("failed to write manifest header")?;
    for entry in entries {
        writer
            .serialize(entry)
            .with_context(|| format!("failed to write manifest row for {}", entry.student_id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush manifest: {}", e.error()))?;
    String::from_utf8(bytes).context("manifest is not valid UTF-8")
}

/// Write the manifest atomically
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    atomic_write(path, &render_manifest(entries)?)
}

/// Read a manifest written by `write_manifest`
pub fn read_manifest(path: &Path) -> Result<Vec<ManifestEntry>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open manifest: {}", path.display()))?;
    reader
        .deserialize()
        .collect::<Result<Vec<ManifestEntry>, _>>()
        .with_context(|| format!("failed to parse manifest: {}", path.display()))
}

/// Combine an existing manifest with the rows from this run
///
/// Existing rows keep their order unless their question was processed in
/// this run; fresh rows follow in processing order.
pub fn merge_manifest(
    existing: Vec<ManifestEntry>,
    processed_questions: &HashSet<String>,
    fresh: Vec<ManifestEntry>,
) -> Vec<ManifestEntry> {
    existing
        .into_iter()
        .filter(|row| !processed_questions.contains(&row.question))
        .chain(fresh)
        .collect()
}

/// Write data to file atomically using temp file + rename
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    use std::fs;
    use std::io::Write;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)
        .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("failed to write to temp file: {}", temp_path.display()))?;
    file.sync_all()
        .with_context(|| format!("failed to sync temp file: {}", temp_path.display()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .with_context(|| format!("failed to rename temp file to: {}", path.display()))?;

    Ok(())
}
