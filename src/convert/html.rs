//! HTML body to Markdown.

use htmd::options::{BulletListMarker, HeadingStyle, Options};
use htmd::HtmlToMarkdown;

use crate::error::{PstError, Result};

/// Tags whose content never belongs in the output.
const SKIPPED_TAGS: &[&str] = &["head", "script", "style", "title"];

/// Convert an HTML body to Markdown.
///
/// Headings come out ATX-style (`#`), bullets as `-`. Elements without a
/// Markdown counterpart are reduced to their text.
pub fn html_to_markdown(html: &str) -> Result<String> {
    let converter = HtmlToMarkdown::builder()
        .skip_tags(SKIPPED_TAGS.to_vec())
        .options(Options {
            heading_style: HeadingStyle::Atx,
            bullet_list_marker: BulletListMarker::Dash,
            ..Default::default()
        })
        .build();

    converter
        .convert(html)
        .map(|md| collapse_blank_lines(&md))
        .map_err(|e| PstError::Conversion(format!("HTML conversion failed: {e}")))
}

/// Pick and convert the body of a message.
///
/// HTML wins unless `prefer_plain` is set and a plain body exists. A failed
/// HTML conversion falls back to the plain body with a warning.
pub fn body_to_markdown(html: &str, plain: &str, prefer_plain: bool) -> String {
    let has_plain = !plain.trim().is_empty();
    if html.trim().is_empty() || (prefer_plain && has_plain) {
        return normalize_plain(plain);
    }

    match html_to_markdown(html) {
        Ok(md) if !md.is_empty() || !has_plain => md,
        Ok(_) => normalize_plain(plain),
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to plain-text body");
            normalize_plain(plain)
        }
    }
}

/// Normalize line endings of a plain-text body and trim it.
fn normalize_plain(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

/// Trim trailing spaces and keep at most one blank line between blocks.
fn collapse_blank_lines(md: &str) -> String {
    let mut result = String::with_capacity(md.len());
    let mut prev_was_blank = false;

    for line in md.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            if !prev_was_blank && !result.is_empty() {
                result.push('\n');
            }
            prev_was_blank = true;
        } else {
            result.push_str(line);
            result.push('\n');
            prev_was_blank = false;
        }
    }

    result.trim_end().to_string()
}
