//! Assignment folder discovery and loading
//!
//! One assignment folder holds the inputs for a single question:
//! `inputs.json`, `template.json`, `response.json` and optionally `links.json`.

use crate::config::ResolvedConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::feedback::{normalize, ResponseDictionary};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const INPUTS_FILE: &str = "inputs.json";
pub const TEMPLATE_FILE: &str = "template.json";
pub const RESPONSES_FILE: &str = "response.json";
pub const LINKS_FILE: &str = "links.json";

/// Stand-in remark for a student record without the section's field
pub const MISSING_REMARK: &str = "No remarks provided";
pub const UNKNOWN_STUDENT: &str = "Unknown Student";
pub const INVALID_STUDENT_ID: &str = "#N/A";
pub const DEFAULT_LINK: &str = "#";

const ID_FIELD: &str = "NIAT ID";
const NAME_FIELD: &str = "name";
const SUBMISSION_FIELD: &str = "submission";

/// Section labels per device context, from template.json
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionTemplate {
    #[serde(default)]
    pub sections: DeviceSections,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSections {
    #[serde(default)]
    pub desktop: Vec<String>,
    #[serde(default)]
    pub mobile: Vec<String>,
}

/// Folder-level links, from links.json
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreenshotLinks {
    pub desktop: String,
    pub mobile: String,
    pub submission: Option<String>,
}

impl Default for ScreenshotLinks {
    fn default() -> Self {
        ScreenshotLinks {
            desktop: DEFAULT_LINK.to_string(),
            mobile: DEFAULT_LINK.to_string(),
            submission: None,
        }
    }
}

impl ScreenshotLinks {
    /// Read links from a parsed links.json; non-string values fall back to "#"
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let link = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_LINK)
                .to_string()
        };
        Some(ScreenshotLinks {
            desktop: link("desktop"),
            mobile: link("mobile"),
            submission: obj
                .get(SUBMISSION_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// One entry of inputs.json
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    fields: Map<String, Value>,
    by_normalized_key: HashMap<String, Value>,
}

impl StudentRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        // Later fields win when two keys normalize identically
        let by_normalized_key = fields
            .iter()
            .map(|(k, v)| (normalize(k), v.clone()))
            .collect();
        StudentRecord {
            fields,
            by_normalized_key,
        }
    }

    /// Trimmed NIAT ID, or None when it is missing, blank or "#N/A"
    pub fn id(&self) -> Option<String> {
        let id = scalar_text(self.fields.get(ID_FIELD)?)?;
        let id = id.trim();
        if id.is_empty() || id == INVALID_STUDENT_ID {
            None
        } else {
            Some(id.to_string())
        }
    }

    pub fn name(&self) -> String {
        self.fields
            .get(NAME_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or(UNKNOWN_STUDENT)
            .to_string()
    }

    pub fn submission(&self) -> Option<&str> {
        self.fields
            .get(SUBMISSION_FIELD)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Raw remark for a section label
    ///
    /// A missing field yields `MISSING_REMARK`; JSON null yields None.
    pub fn remark_for(&self, section: &str) -> Option<String> {
        match self.by_normalized_key.get(&normalize(section)) {
            None => Some(MISSING_REMARK.to_string()),
            Some(value) => scalar_text(value),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Everything loaded from one assignment folder
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Folder name, used as the question identifier
    pub question: String,
    pub path: PathBuf,
    pub students: Vec<StudentRecord>,
    pub template: SectionTemplate,
    pub responses: ResponseDictionary,
    pub links: ScreenshotLinks,
}

/// Load an assignment folder
///
/// Returns `Ok(None)` when inputs.json is missing or empty. Missing or
/// malformed template.json / response.json are errors.
pub fn load_assignment(path: &Path, sink: &dyn DiagnosticSink) -> Result<Option<Assignment>> {
    let question = folder_name(path);

    let inputs_path = path.join(INPUTS_FILE);
    if !is_non_empty_file(&inputs_path) {
        return Ok(None);
    }

    let students: Vec<Map<String, Value>> = read_json(&inputs_path)?;
    let template: SectionTemplate = read_json(&path.join(TEMPLATE_FILE))?;
    let responses: ResponseDictionary = read_json(&path.join(RESPONSES_FILE))?;
    let links = load_links(&path.join(LINKS_FILE), &question, sink);

    Ok(Some(Assignment {
        question,
        path: path.to_path_buf(),
        students: students.into_iter().map(StudentRecord::new).collect(),
        template,
        responses,
        links,
    }))
}

/// Load links.json, defaulting every link to "#" when absent or malformed
pub fn load_links(path: &Path, folder: &str, sink: &dyn DiagnosticSink) -> ScreenshotLinks {
    if !is_non_empty_file(path) {
        return ScreenshotLinks::default();
    }

    let parsed = std::fs::read_to_string(path)
        .map_err(anyhow::Error::from)
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(Into::into));

    let reason = match parsed {
        Ok(value) => match ScreenshotLinks::from_value(&value) {
            Some(links) => return links,
            None => "expected a JSON object".to_string(),
        },
        Err(e) => e.to_string(),
    };

    sink.report(&Diagnostic::MalformedLinks {
        folder: folder.to_string(),
        reason,
    });
    ScreenshotLinks::default()
}

/// List assignment folders under the input root in sorted order
///
/// Follows symlinked folders. Skips hidden entries, plain files, dangling
/// links, folders rejected by the config, and `skip` (normally the output root).
pub fn discover_assignments(
    input_root: &Path,
    config: &ResolvedConfig,
    skip: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let skip = skip.and_then(|p| p.canonicalize().ok());
    let mut folders = Vec::new();

    for entry_result in std::fs::read_dir(input_root)
        .with_context(|| format!("Failed to read directory: {}", input_root.display()))?
    {
        let entry = entry_result?;
        let path = entry.path();
        // Symlinks are followed; a dangling one is skipped like a plain file
        match std::fs::metadata(&path) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                tracing::debug!(path = %path.display(), "skipping non-directory entry");
                continue;
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        }

        let name = folder_name(&path);
        if name.starts_with('.') || !config.should_include(&name) {
            continue;
        }
        if skip.is_some() && path.canonicalize().ok() == skip {
            continue;
        }
        folders.push(path);
    }

    // Sort folders for deterministic order
    folders.sort();
    Ok(folders)
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
