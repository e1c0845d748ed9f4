//! Recursive folder traversal: count items, then convert and write each mail.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::export::write_message;
use crate::progress::MailboxProgress;

use super::MailFolder;

/// Totals for one mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Messages written to disk.
    pub messages: usize,
    /// Mail items that could not be read, converted, or written.
    pub skipped: usize,
    /// Attachment files written.
    pub attachments: usize,
    /// Bytes written (Markdown plus attachments).
    pub bytes: u64,
}

/// Count items in `folder` and all its subfolders.
///
/// Folders whose contents cannot be listed count as empty.
pub fn count_messages(folder: &dyn MailFolder) -> usize {
    let own = folder.item_count().unwrap_or_else(|e| {
        debug!(folder = %folder.name(), error = %e, "Could not count items");
        0
    });

    let children = match folder.subfolders() {
        Ok(subs) => subs.iter().map(|f| count_messages(f.as_ref())).sum(),
        Err(e) => {
            debug!(folder = %folder.name(), error = %e, "Could not list subfolders");
            0
        }
    };

    own + children
}

/// Convert every mail item in `folder`, then recurse into its subfolders.
///
/// Failures on single items or folders are logged and skipped; they never
/// abort the rest of the mailbox.
pub fn process_folder(
    folder: &dyn MailFolder,
    output_dir: &Path,
    config: &Config,
    progress: &MailboxProgress,
    stats: &mut ConversionStats,
) {
    let name = folder.name();
    debug!(folder = %name, "Processing folder");

    match folder.item_count() {
        Ok(count) => {
            for index in 0..count {
                process_item(folder, &name, index, output_dir, config, stats);
                progress.inc();
            }
        }
        Err(e) => warn!(folder = %name, error = %e, "Error accessing folder items"),
    }

    match folder.subfolders() {
        Ok(subs) => {
            for sub in &subs {
                process_folder(sub.as_ref(), output_dir, config, progress, stats);
            }
        }
        Err(e) => warn!(folder = %name, error = %e, "Error accessing subfolders"),
    }
}

fn process_item(
    folder: &dyn MailFolder,
    folder_name: &str,
    index: usize,
    output_dir: &Path,
    config: &Config,
    stats: &mut ConversionStats,
) {
    let msg = match folder.read_item(index) {
        Ok(Some(msg)) => msg,
        Ok(None) => return,
        Err(e) => {
            warn!(folder = %folder_name, index, error = %e, "Failed to read item");
            stats.skipped += 1;
            return;
        }
    };

    match write_message(&msg, output_dir, config) {
        Ok(written) => {
            stats.messages += 1;
            stats.attachments += written.attachments.len();
            stats.bytes += written.bytes;
        }
        Err(e) => {
            warn!(
                folder = %folder_name,
                index,
                subject = %msg.subject,
                error = %e,
                "Failed to process item"
            );
            stats.skipped += 1;
        }
    }
}
