//! HTML report generation
//!
//! Generates one self-contained HTML page per student with embedded CSS.
//! No scripts; pages work offline.

use crate::report::{ReportLinks, SectionFeedback, StudentReport};

/// Render a student report as an HTML document
pub fn render_student_html(report: &StudentReport, title: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - {id}</title>
    <style>{css}</style>
</head>
<body>
    <div class="container">
        {header}
        {links}
        {desktop}
        {mobile}
    </div>
</body>
</html>
"#,
        title = html_escape(title),
        id = html_escape(&report.student_id),
        css = inline_css(),
        header = render_header(report, title),
        links = render_links(&report.links),
        desktop = render_section_table("Desktop Section Remarks", &report.desktop),
        mobile = render_section_table("Mobile Section Remarks", &report.mobile),
    )
}

/// Inline CSS styles
fn inline_css() -> &'static str {
    r#"
body {
    font-family: Arial, sans-serif;
    margin: 40px;
    padding: 20px;
    background-color: #f4f4f4;
}

.container {
    max-width: 900px;
    margin: auto;
    background: white;
    padding: 20px;
    border-radius: 10px;
    box-shadow: 0px 0px 15px #aaa;
}

h1, h2 {
    color: #333;
    text-align: center;
}

table {
    width: 100%;
    border-collapse: collapse;
    margin-bottom: 20px;
}

th, td {
    border: 1px solid #ddd;
    padding: 10px;
    text-align: left;
}

th {
    background-color: #3498db;
    color: white;
}

.screenshot-link {
    display: block;
    text-align: center;
    font-size: 18px;
    color: #007BFF;
    text-decoration: none;
    margin: 10px 0;
}

.screenshot-link:hover {
    text-decoration: underline;
}
"#
}

/// Render header section
fn render_header(report: &StudentReport, title: &str) -> String {
    format!(
        r#"<h1>{title}</h1>
        <p><strong>Name:</strong> {name}</p>
        <p><strong>Student ID:</strong> {id}</p>
        <p><strong>Assigned Question:</strong> {question}</p>"#,
        title = html_escape(title),
        name = html_escape(&report.name),
        id = html_escape(&report.student_id),
        question = html_escape(&report.question),
    )
}

/// Render screenshot and submission links
fn render_links(links: &ReportLinks) -> String {
    let submission = links
        .submission
        .as_deref()
        .map(|href| {
            format!(
                r#"
        <a class="screenshot-link" href="{}" target="_blank">View Submission</a>"#,
                html_escape(href)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<h2>View Screenshots</h2>
        <a class="screenshot-link" href="{desktop}" target="_blank">Desktop View</a>
        <a class="screenshot-link" href="{mobile}" target="_blank">Mobile View</a>{submission}"#,
        desktop = html_escape(&links.desktop),
        mobile = html_escape(&links.mobile),
        submission = submission,
    )
}

/// Render one remarks table, one row per section
fn render_section_table(heading: &str, rows: &[SectionFeedback]) -> String {
    let rows: String = rows
        .iter()
        .map(|row| {
            format!(
                "\n            <tr><td>{}</td><td>{}</td></tr>",
                html_escape(&row.section),
                html_escape(&row.feedback)
            )
        })
        .collect();

    format!(
        r#"<h2>{heading}</h2>
        <table>
            <tr><th>Section</th><th>Remarks</th></tr>{rows}
        </table>"#,
        heading = heading,
        rows = rows,
    )
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> StudentReport {
        StudentReport {
            student_id: "S001".to_string(),
            name: "Meera".to_string(),
            question: "landing-page".to_string(),
            links: ReportLinks {
                desktop: "https://shots/d.png".to_string(),
                mobile: "#".to_string(),
                submission: None,
            },
            desktop: vec![SectionFeedback {
                section: "Nav Bar".to_string(),
                feedback: "Nice work on Nav Bar.".to_string(),
            }],
            mobile: vec![SectionFeedback {
                section: "Menu".to_string(),
                feedback: "No specific feedback available for Menu.".to_string(),
            }],
        }
    }

    #[test]
    fn test_document_structure() {
        let html = render_student_html(&report(), "Web Development Report");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Web Development Report - S001</title>"));
        assert!(html.contains("<p><strong>Name:</strong> Meera</p>"));
        assert!(html.contains(r#"href="https://shots/d.png""#));
        assert!(html.contains(r##"href="#" target="_blank">Mobile View</a>"##));
        assert!(!html.contains("View Submission"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_tables_in_device_order() {
        let html = render_student_html(&report(), "Report");
        let desktop = html.find("Desktop Section Remarks").unwrap();
        let mobile = html.find("Mobile Section Remarks").unwrap();
        assert!(desktop < mobile);
        assert!(html.contains("<tr><td>Nav Bar</td><td>Nice work on Nav Bar.</td></tr>"));
        assert!(html.contains(
            "<tr><td>Menu</td><td>No specific feedback available for Menu.</td></tr>"
        ));
    }

    #[test]
    fn test_submission_link_rendered_when_present() {
        let mut r = report();
        r.links.submission = Some("https://repo/s1".to_string());
        let html = render_student_html(&r, "Report");
        assert!(html.contains(r#"href="https://repo/s1" target="_blank">View Submission</a>"#));
    }

    #[test]
    fn test_interpolated_text_is_escaped() {
        let mut r = report();
        r.name = "<script>alert('x')</script>".to_string();
        r.desktop[0].feedback = "Use <nav> & \"aria\" labels".to_string();
        let html = render_student_html(&r, "Report");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
        assert!(html.contains("Use &lt;nav&gt; &amp; &quot;aria&quot; labels"));
    }

    #[test]
    fn test_empty_section_lists_render_header_rows_only() {
        let mut r = report();
        r.desktop.clear();
        r.mobile.clear();
        let html = render_student_html(&r, "Report");
        assert_eq!(html.matches("<th>Section</th>").count(), 2);
        assert!(!html.contains("<td>"));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&#39;");
    }
}
