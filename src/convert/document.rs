//! Markdown document for one message: title, metadata table, attachments, body.

use std::fmt::Write as _;

use crate::config::Config;
use crate::model::address::EmailAddress;
use crate::model::message::Message;

use super::html::body_to_markdown;

/// Display value used when the received time is missing.
const UNKNOWN_DATE: &str = "Unknown";

/// Render a message as a Markdown document.
///
/// `attachment_names` are the file names the attachments were actually
/// written under, in order; each becomes a relative link.
pub fn render_message(msg: &Message, attachment_names: &[String], config: &Config) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# {}", single_line(msg.subject_or_default()));
    out.push('\n');

    let date = msg
        .received
        .map(|dt| dt.format(&config.output.display_date_format).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string());

    out.push_str("| Field | Value |\n");
    out.push_str("|-------|-------|\n");
    push_row(&mut out, "From", &msg.sender.display());
    push_row(&mut out, "To", &EmailAddress::format_list(&msg.to));
    push_row(&mut out, "CC", &EmailAddress::format_list(&msg.cc));
    push_row(&mut out, "Date", &date);
    out.push('\n');

    if !attachment_names.is_empty() {
        out.push_str("## Attachments\n\n");
        for name in attachment_names {
            let _ = writeln!(out, "- [{}]({})", escape_link_text(name), link_target(name));
        }
        out.push('\n');
    }

    out.push_str("## Content\n\n");
    let body = body_to_markdown(
        &msg.html_body,
        &msg.text_body,
        config.markdown.prefer_plain_text,
    );
    if !body.is_empty() {
        out.push_str(&body);
        out.push('\n');
    }

    out
}

/// Append a metadata row. Empty values stay as blank cells.
fn push_row(out: &mut String, field: &str, value: &str) {
    let _ = writeln!(out, "| **{field}** | {} |", escape_cell(value));
}

/// Fold a value onto one line.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .filter(|s| !s.trim().is_empty())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Make a value safe inside a table cell.
fn escape_cell(value: &str) -> String {
    single_line(value).replace('|', "\\|")
}

fn escape_link_text(name: &str) -> String {
    name.replace('[', "\\[").replace(']', "\\]")
}

/// Relative link target; names with spaces or parentheses are wrapped in
/// `<…>` so the link stays valid CommonMark.
fn link_target(name: &str) -> String {
    if name.contains([' ', '(', ')']) {
        format!("<{name}>")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attachment::Attachment;
    use chrono::NaiveDate;

    fn sample() -> Message {
        Message {
            subject: "Meeting Notes".to_string(),
            sender: EmailAddress::new("John Smith", "j@x.com"),
            to: vec![
                EmailAddress::new("Alice", "alice@x.com"),
                EmailAddress::new("", "bob@x.com"),
            ],
            cc: Vec::new(),
            received: NaiveDate::from_ymd_opt(2024, 1, 15).and_then(|d| d.and_hms_opt(14, 5, 9)),
            html_body: "<p>Agenda <em>attached</em></p>".to_string(),
            text_body: "Agenda attached".to_string(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_render_layout() {
        let md = render_message(&sample(), &[], &Config::default());
        assert!(md.starts_with("# Meeting Notes\n\n| Field | Value |\n|-------|-------|\n"));
        assert!(md.contains("| **From** | John Smith <j@x.com> |\n"));
        assert!(md.contains("| **To** | Alice <alice@x.com>, bob@x.com |\n"));
        assert!(md.contains("| **Date** | 2024-01-15 14:05:09 |\n"));
        assert!(md.contains("## Content\n\nAgenda"));
        assert!(!md.contains("## Attachments"));
    }

    #[test]
    fn test_empty_fields_keep_rows() {
        let md = render_message(&Message::default(), &[], &Config::default());
        assert!(md.contains("# No Subject\n"));
        assert!(md.contains("| **From** |  |\n"));
        assert!(md.contains("| **To** |  |\n"));
        assert!(md.contains("| **CC** |  |\n"));
        assert!(md.contains("| **Date** | Unknown |\n"));
        assert!(md.ends_with("## Content\n\n"));
    }

    #[test]
    fn test_attachment_links() {
        let mut msg = sample();
        msg.attachments = vec![
            Attachment::new("report.pdf", b"x".to_vec()),
            Attachment::new("Q1 plan (v2).xlsx", b"y".to_vec()),
        ];
        let names = vec!["report.pdf".to_string(), "Q1 plan (v2).xlsx".to_string()];
        let md = render_message(&msg, &names, &Config::default());
        assert!(md.contains("## Attachments\n\n- [report.pdf](report.pdf)\n"));
        assert!(md.contains("- [Q1 plan (v2).xlsx](<Q1 plan (v2).xlsx>)\n"));

        let att = md.find("## Attachments").unwrap();
        let content = md.find("## Content").unwrap();
        assert!(att < content);
    }

    #[test]
    fn test_cells_are_escaped() {
        let mut msg = sample();
        msg.sender = EmailAddress::new("A | B", "ab@x.com");
        msg.subject = "Line one\r\nLine two".to_string();
        let md = render_message(&msg, &[], &Config::default());
        assert!(md.contains("| **From** | A \\| B <ab@x.com> |"));
        assert!(md.starts_with("# Line one Line two\n"));
    }

    #[test]
    fn test_display_date_format_from_config() {
        let mut cfg = Config::default();
        cfg.output.display_date_format = "%d/%m/%Y".to_string();
        let md = render_message(&sample(), &[], &cfg);
        assert!(md.contains("| **Date** | 15/01/2024 |"));
    }
}
