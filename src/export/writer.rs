//! Write a message to disk: a single `.md`, or a folder with the `.md` and
//! its attachments.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::convert::render_message;
use crate::error::{PstError, Result};
use crate::model::message::Message;

use super::filename::{
    create_unique_dir, create_unique_file, message_base_name, sanitize_filename, split_extension,
};

/// What was written for one message.
#[derive(Debug, Clone)]
pub struct WrittenMessage {
    /// Path of the Markdown file.
    pub markdown: PathBuf,
    /// Folder holding the Markdown and attachments, when there are any.
    pub folder: Option<PathBuf>,
    /// Attachment paths, in message order.
    pub attachments: Vec<PathBuf>,
    /// Total bytes written (Markdown plus attachments).
    pub bytes: u64,
}

/// Write one message under `output_dir`.
///
/// Without attachments the result is `{output_dir}/{name}.md`. With
/// attachments it is `{output_dir}/{name}/` holding `{name}.md` and one
/// file per attachment. Every name is claimed atomically and suffixed
/// `_1`, `_2`, … on collision.
pub fn write_message(msg: &Message, output_dir: &Path, config: &Config) -> Result<WrittenMessage> {
    let max_len = config.output.max_filename_length;
    let base = message_base_name(msg, &config.output.filename_date_format, max_len);

    if !msg.has_attachments() {
        let content = render_message(msg, &[], config);
        let (path, mut file) = create_unique_file(output_dir, &base, ".md")?;
        file.write_all(content.as_bytes())
            .map_err(|e| PstError::io(&path, e))?;
        tracing::debug!(path = %path.display(), "Wrote message");
        return Ok(WrittenMessage {
            markdown: path,
            folder: None,
            attachments: Vec::new(),
            bytes: content.len() as u64,
        });
    }

    let folder = create_unique_dir(output_dir, &base)?;
    match write_folder(msg, &folder, &base, config) {
        Ok(written) => Ok(written),
        Err(e) => {
            // Leave nothing half-written behind for a skipped message
            if let Err(cleanup) = std::fs::remove_dir_all(&folder) {
                tracing::warn!(
                    folder = %folder.display(),
                    error = %cleanup,
                    "Failed to remove incomplete message folder"
                );
            }
            Err(e)
        }
    }
}

/// Fill a freshly claimed message folder with the Markdown and attachments.
fn write_folder(msg: &Message, folder: &Path, base: &str, config: &Config) -> Result<WrittenMessage> {
    let max_len = config.output.max_filename_length;

    // Claim the Markdown name first so attachments cannot take it
    let (md_path, mut md_file) = create_unique_file(folder, base, ".md")?;

    let mut attachment_paths = Vec::with_capacity(msg.attachments.len());
    let mut attachment_names = Vec::with_capacity(msg.attachments.len());
    let mut bytes = 0u64;

    for (idx, att) in msg.attachments.iter().enumerate() {
        let raw_name = if att.filename.trim().is_empty() {
            format!("attachment_{}", idx + 1)
        } else {
            att.filename.clone()
        };
        let name = sanitize_filename(&raw_name, max_len);

        match write_attachment(folder, &name, &att.data) {
            Ok(path) => {
                bytes += att.size();
                let written_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| name.clone());
                attachment_names.push(written_name);
                attachment_paths.push(path);
            }
            Err(e) => {
                tracing::warn!(attachment = %name, error = %e, "Skipping attachment");
            }
        }
    }

    let content = render_message(msg, &attachment_names, config);
    md_file
        .write_all(content.as_bytes())
        .map_err(|e| PstError::io(&md_path, e))?;
    bytes += content.len() as u64;

    tracing::debug!(
        folder = %folder.display(),
        attachments = attachment_paths.len(),
        "Wrote message with attachments"
    );

    Ok(WrittenMessage {
        markdown: md_path,
        folder: Some(folder.to_path_buf()),
        attachments: attachment_paths,
        bytes,
    })
}

/// Write one attachment under a unique name. A partial file is removed.
fn write_attachment(folder: &Path, name: &str, data: &[u8]) -> Result<PathBuf> {
    let (stem, ext) = split_extension(name);
    let (path, mut file) = create_unique_file(folder, stem, ext)?;
    if let Err(e) = file.write_all(data) {
        drop(file);
        let _ = std::fs::remove_file(&path);
        return Err(PstError::io(&path, e));
    }
    Ok(path)
}
