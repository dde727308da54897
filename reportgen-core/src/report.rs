//! Per-student report model and run summaries
//!
//! Global invariants enforced:
//! - Sections appear in template order, desktop before mobile
//! - Report file names are a pure function of (student id, question)

use crate::assignment::{Assignment, StudentRecord};
use crate::feedback::FeedbackResolver;
use serde::Serialize;
use std::path::PathBuf;

/// Resolved feedback for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionFeedback {
    pub section: String,
    pub feedback: String,
}

/// Links shown at the top of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLinks {
    pub desktop: String,
    pub mobile: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<String>,
}

/// Everything rendered into one student's HTML file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentReport {
    pub student_id: String,
    pub name: String,
    pub question: String,
    pub links: ReportLinks,
    pub desktop: Vec<SectionFeedback>,
    pub mobile: Vec<SectionFeedback>,
}

impl StudentReport {
    /// `{studentId}_{question}.html`, with path-unsafe characters percent-encoded
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.html",
            file_safe(&self.student_id),
            file_safe(&self.question)
        )
    }
}

/// Build the report for one student, or None when the record has no usable ID
pub fn build_student_report(
    assignment: &Assignment,
    student: &StudentRecord,
    resolver: &FeedbackResolver<'_>,
) -> Option<StudentReport> {
    let student_id = student.id()?;

    let resolve_all = |sections: &[String]| -> Vec<SectionFeedback> {
        sections
            .iter()
            .map(|section| SectionFeedback {
                section: section.clone(),
                feedback: resolver.resolve(section, student.remark_for(section).as_deref()),
            })
            .collect()
    };

    let sections = &assignment.template.sections;
    Some(StudentReport {
        student_id,
        name: student.name(),
        question: assignment.question.clone(),
        links: ReportLinks {
            desktop: assignment.links.desktop.clone(),
            mobile: assignment.links.mobile.clone(),
            submission: student
                .submission()
                .map(str::to_string)
                .or_else(|| assignment.links.submission.clone()),
        },
        desktop: resolve_all(&sections.desktop),
        mobile: resolve_all(&sections.mobile),
    })
}

fn file_safe(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            out.push(c);
        } else {
            // Percent-encode so distinct IDs never share a file name
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

/// Outcome of a full generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub folders_processed: usize,
    pub folders_skipped: usize,
    pub reports_written: usize,
    pub students_skipped: usize,
    pub unmatched_remarks: usize,
    pub output_root: PathBuf,
    pub manifest_path: PathBuf,
}

/// Render a run summary as text output
pub fn render_text(summary: &RunSummary) -> String {
    let rows = [
        ("Folders processed", summary.folders_processed.to_string()),
        ("Folders skipped", summary.folders_skipped.to_string()),
        ("Reports written", summary.reports_written.to_string()),
        ("Students skipped", summary.students_skipped.to_string()),
        ("Unmatched remarks", summary.unmatched_remarks.to_string()),
        ("Output", summary.output_root.display().to_string()),
        ("Manifest", summary.manifest_path.display().to_string()),
    ];

    let mut output = String::new();
    for (label, value) in rows {
        output.push_str(&format!("{:<20} {}\n", label, value));
    }
    output
}

/// Render a run summary as JSON output
pub fn render_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{DeviceSections, ScreenshotLinks, SectionTemplate};
    use crate::diagnostics::CollectingSink;
    use crate::feedback::ResponseDictionary;
    use serde_json::{json, Value};

    fn assignment() -> Assignment {
        Assignment {
            question: "landing-page".to_string(),
            path: PathBuf::from("landing-page"),
            students: Vec::new(),
            template: SectionTemplate {
                sections: DeviceSections {
                    desktop: vec!["Nav Bar".to_string(), "Hero".to_string()],
                    mobile: vec!["Menu".to_string()],
                },
            },
            responses: [
                ("Good", "Nice work on {section_name}."),
                ("Needs Improvement", "Please revise {section_name}."),
            ]
            .into_iter()
            .collect::<ResponseDictionary>(),
            links: ScreenshotLinks {
                desktop: "https://shots/d.png".to_string(),
                mobile: "#".to_string(),
                submission: Some("https://repo/default".to_string()),
            },
        }
    }

    fn student(value: Value) -> StudentRecord {
        match value {
            Value::Object(map) => StudentRecord::new(map),
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_build_report_resolves_every_section_in_order() {
        let a = assignment();
        let sink = CollectingSink::new();
        let resolver = FeedbackResolver::new(&a.responses, &sink);
        let s = student(json!({
            "NIAT ID": "S001",
            "name": "Meera",
            "navbar": "good",
            "Hero": "needs improvement"
        }));

        let report = build_student_report(&a, &s, &resolver).unwrap();
        assert_eq!(report.student_id, "S001");
        assert_eq!(report.question, "landing-page");
        assert_eq!(
            report.desktop,
            vec![
                SectionFeedback {
                    section: "Nav Bar".to_string(),
                    feedback: "Nice work on Nav Bar.".to_string(),
                },
                SectionFeedback {
                    section: "Hero".to_string(),
                    feedback: "Please revise Hero.".to_string(),
                },
            ]
        );
        // Menu is absent from the record: sentinel remark, fallback, diagnostic
        assert_eq!(
            report.mobile[0].feedback,
            "No specific feedback available for Menu."
        );
        assert_eq!(
            sink.unmatched_remarks(),
            vec![("Menu".to_string(), "No remarks provided".to_string())]
        );
    }

    #[test]
    fn test_build_report_null_remark_is_silent_fallback() {
        let a = assignment();
        let sink = CollectingSink::new();
        let resolver = FeedbackResolver::new(&a.responses, &sink);
        let s = student(json!({
            "NIAT ID": "S002", "Nav Bar": null, "Hero": "", "Menu": "Good"
        }));

        let report = build_student_report(&a, &s, &resolver).unwrap();
        assert_eq!(
            report.desktop[0].feedback,
            "No specific feedback available for Nav Bar."
        );
        assert_eq!(
            report.desktop[1].feedback,
            "No specific feedback available for Hero."
        );
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_build_report_requires_valid_id() {
        let a = assignment();
        let resolver = FeedbackResolver::new(&a.responses, &crate::diagnostics::NullSink);
        assert!(build_student_report(&a, &student(json!({"NIAT ID": "#N/A"})), &resolver).is_none());
    }

    #[test]
    fn test_submission_link_prefers_student_record() {
        let a = assignment();
        let resolver = FeedbackResolver::new(&a.responses, &crate::diagnostics::NullSink);

        let own = student(json!({"NIAT ID": "S1", "submission": "https://repo/s1"}));
        let report = build_student_report(&a, &own, &resolver).unwrap();
        assert_eq!(report.links.submission.as_deref(), Some("https://repo/s1"));

        let none = student(json!({"NIAT ID": "S2"}));
        let report = build_student_report(&a, &none, &resolver).unwrap();
        assert_eq!(report.links.submission.as_deref(), Some("https://repo/default"));
        assert_eq!(report.links.desktop, "https://shots/d.png");
    }

    #[test]
    fn test_file_name_replaces_path_separators() {
        let a = assignment();
        let resolver = FeedbackResolver::new(&a.responses, &crate::diagnostics::NullSink);
        let report =
            build_student_report(&a, &student(json!({"NIAT ID": "N24/07 A"})), &resolver).unwrap();
        assert_eq!(report.file_name(), "N24%2F07%20A_landing-page.html");
    }

    #[test]
    fn test_file_name_keeps_distinct_ids_distinct() {
        let a = assignment();
        let resolver = FeedbackResolver::new(&a.responses, &crate::diagnostics::NullSink);
        let names: Vec<String> = ["N24/01", "N24_01", "N24%2F01"]
            .iter()
            .map(|id| {
                build_student_report(&a, &student(json!({ "NIAT ID": id })), &resolver)
                    .unwrap()
                    .file_name()
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "N24%2F01_landing-page.html",
                "N24_01_landing-page.html",
                "N24%252F01_landing-page.html",
            ]
        );
    }

    #[test]
    fn test_render_text_lists_counts() {
        let summary = RunSummary {
            folders_processed: 2,
            reports_written: 5,
            unmatched_remarks: 1,
            manifest_path: PathBuf::from("out/reports.csv"),
            ..Default::default()
        };
        let text = render_text(&summary);
        assert!(text.contains("Reports written      5"));
        assert!(text.contains("Unmatched remarks    1"));
        assert!(text.contains("out/reports.csv"));
    }

    #[test]
    fn test_render_json_fields() {
        let summary = RunSummary {
            reports_written: 3,
            ..Default::default()
        };
        let value: Value = serde_json::from_str(&render_json(&summary)).unwrap();
        assert_eq!(value["reports_written"], 3);
        assert_eq!(value["folders_skipped"], 0);
    }
}
