//! Output names: `{date}_{sender}_{subject}`, sanitized and made unique.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::{PstError, Result};
use crate::model::message::Message;

/// Characters rejected by Windows file systems, besides control characters.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Date prefix used when the received time is unknown.
const UNKNOWN_DATE: &str = "unknown-date";

/// Upper bound on `_N` suffixes tried before giving up on a name.
const MAX_COLLISIONS: usize = 100_000;

/// Replace characters that are invalid in file names and tidy the result.
///
/// - `< > : " / \ | ? *` and control characters become `_`
/// - runs of `_` collapse into one
/// - leading/trailing `.`, space and `_` are removed
/// - the result is cut to `max_len` characters
///
/// Never returns an empty string; `"unnamed"` stands in.
pub fn sanitize_filename(name: &str, max_len: usize) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_control() || INVALID_CHARS.contains(&c) {
            '_'
        } else {
            c
        };
        if c == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(c);
    }

    let trim = |s: &str| s.trim_matches(|c| c == '.' || c == ' ' || c == '_').to_string();
    let mut sanitized = trim(&sanitized);

    if sanitized.chars().count() > max_len {
        let cut: String = sanitized.chars().take(max_len).collect();
        sanitized = trim(&cut);
    }

    if sanitized.is_empty() {
        "unnamed".to_string()
    } else {
        sanitized
    }
}

/// Reduce a sender representation to the short name used in file names.
///
/// - `"The Neuron <news@neuron.com>"` → `"The Neuron"`
/// - `"john.doe@example.com"` → `"john.doe"`
/// - `"John Doe"` → `"John Doe"`
pub fn sender_name(sender: &str) -> String {
    let trimmed = sender.trim();
    if trimmed.is_empty() {
        return "unknown".to_string();
    }

    if let Some(open) = trimmed.find('<') {
        let name = trimmed[..open].trim().trim_matches('"').trim();
        if !name.is_empty() {
            return name.to_string();
        }
        // "<addr>" alone: fall through to the address rule
        let addr = trimmed[open + 1..].trim_end_matches('>').trim();
        return addr.split('@').next().unwrap_or(addr).to_string();
    }

    if let Some((local, _)) = trimmed.split_once('@') {
        return local.to_string();
    }

    trimmed.to_string()
}

/// Date prefix for file names.
pub fn filename_date(received: Option<NaiveDateTime>, format: &str) -> String {
    received
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Base name (no extension) for a message's Markdown file or folder.
pub fn message_base_name(msg: &Message, date_format: &str, max_len: usize) -> String {
    let date = filename_date(msg.received, date_format);
    let sender = sender_name(&msg.sender.display());
    sanitize_filename(
        &format!("{date}_{sender}_{}", msg.subject_or_default()),
        max_len,
    )
}

/// Split `report.pdf` into (`report`, `.pdf`). Dot-files keep their name whole.
pub fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

/// Candidate path for the `n`th attempt: `n == 0` is the plain name.
fn candidate(dir: &Path, stem: &str, ext: &str, n: usize) -> PathBuf {
    if n == 0 {
        dir.join(format!("{stem}{ext}"))
    } else {
        dir.join(format!("{stem}_{n}{ext}"))
    }
}

/// Create a new file under the first free name among `{stem}{ext}`,
/// `{stem}_1{ext}`, `{stem}_2{ext}`, …
///
/// Existence check and creation are one `create_new` call, so two writers
/// racing for the same name each get their own file.
pub fn create_unique_file(dir: &Path, stem: &str, ext: &str) -> Result<(PathBuf, File)> {
    for n in 0..MAX_COLLISIONS {
        let path = candidate(dir, stem, ext, n);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(PstError::io(path, e)),
        }
    }
    Err(PstError::InvalidPath(format!(
        "no free name for '{stem}{ext}' in {}",
        dir.display()
    )))
}

/// Create a new directory under the first free name.
pub fn create_unique_dir(dir: &Path, stem: &str) -> Result<PathBuf> {
    for n in 0..MAX_COLLISIONS {
        let path = candidate(dir, stem, "", n);
        match std::fs::create_dir(&path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(PstError::io(path, e)),
        }
    }
    Err(PstError::InvalidPath(format!(
        "no free folder name for '{stem}' in {}",
        dir.display()
    )))
}
