//! Feedback resolution
//!
//! Turns a grader's free-text remark into the feedback shown for one section.
//!
//! Global invariants enforced:
//! - Resolution is a pure function of (section, remark, dictionary)
//! - Matching is exact after normalization (trim, lower-case, strip whitespace)
//! - First dictionary key in source order wins when keys normalize identically
//! - Never panics; the only side effect is an unmatched-remark diagnostic

use crate::diagnostics::{Diagnostic, DiagnosticSink, NullSink};
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use std::fmt;

/// Placeholder substituted with the section name in feedback templates
pub const SECTION_PLACEHOLDER: &str = "{section_name}";

/// Canonical message for a section without usable feedback
pub fn fallback_message(section_name: &str) -> String {
    format!("No specific feedback available for {}.", section_name)
}

/// Normalize a remark or dictionary key for comparison
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ResponseEntry {
    key: String,
    normalized: String,
    template: String,
}

/// Remark phrase to feedback template mapping, in source order
///
/// Loaded once per assignment folder and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseDictionary {
    entries: Vec<ResponseEntry>,
}

impl ResponseDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key phrases as written in the source
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    /// Template for an already-normalized remark
    pub fn lookup(&self, normalized_remark: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.normalized == normalized_remark)
            .map(|e| e.template.as_str())
    }

    fn push(&mut self, key: String, template: String) {
        self.entries.push(ResponseEntry {
            normalized: normalize(&key),
            key,
            template,
        });
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseDictionary
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dict = ResponseDictionary::new();
        for (key, template) in iter {
            dict.push(key.into(), template.into());
        }
        dict
    }
}

impl<'de> Deserialize<'de> for ResponseDictionary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DictionaryVisitor;

        impl<'de> Visitor<'de> for DictionaryVisitor {
            type Value = ResponseDictionary;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping remark phrases to feedback templates")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut dict = ResponseDictionary::new();
                // Duplicate keys are kept; lookup returns the first
                while let Some((key, template)) = map.next_entry::<String, String>()? {
                    dict.push(key, template);
                }
                Ok(dict)
            }
        }

        deserializer.deserialize_map(DictionaryVisitor)
    }
}

/// Resolve the feedback text for one section
///
/// Absent or blank remarks return the fallback without a lookup. A remark
/// with no dictionary entry reports `Diagnostic::UnmatchedRemark` and also
/// returns the fallback. Any other string, including the
/// `"No remarks provided"` stand-in, goes through the lookup. A matched
/// template that substitutes to blank text also yields the fallback, so the
/// result is never empty.
pub fn resolve(
    section_name: &str,
    remark: Option<&str>,
    responses: &ResponseDictionary,
    sink: &dyn DiagnosticSink,
) -> String {
    let raw = match remark {
        Some(r) if !r.trim().is_empty() => r,
        _ => return fallback_message(section_name),
    };

    match responses.lookup(&normalize(raw)) {
        Some(template) => {
            let feedback = template.replace(SECTION_PLACEHOLDER, section_name);
            if feedback.trim().is_empty() {
                fallback_message(section_name)
            } else {
                feedback
            }
        }
        None => {
            sink.report(&Diagnostic::UnmatchedRemark {
                section: section_name.to_string(),
                remark: raw.to_string(),
            });
            fallback_message(section_name)
        }
    }
}

/// `resolve` without diagnostics
pub fn resolve_quiet(
    section_name: &str,
    remark: Option<&str>,
    responses: &ResponseDictionary,
) -> String {
    resolve(section_name, remark, responses, &NullSink)
}

/// A response dictionary bound to a diagnostic sink
pub struct FeedbackResolver<'a> {
    responses: &'a ResponseDictionary,
    sink: &'a dyn DiagnosticSink,
}

impl<'a> FeedbackResolver<'a> {
    pub fn new(responses: &'a ResponseDictionary, sink: &'a dyn DiagnosticSink) -> Self {
        FeedbackResolver { responses, sink }
    }

    pub fn resolve(&self, section_name: &str, remark: Option<&str>) -> String {
        resolve(section_name, remark, self.responses, self.sink)
    }
}
