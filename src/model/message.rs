//! The read-only message view handed out by a mailbox backend.

use chrono::NaiveDateTime;

use super::address::EmailAddress;
use super::attachment::Attachment;

/// One mail item, fully loaded.
///
/// Nothing here is persisted; a `Message` exists only between reading it
/// from the mailbox and writing its Markdown file.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Subject line. Empty when the item has none.
    pub subject: String,

    /// Sender as reported by the mail client.
    pub sender: EmailAddress,

    /// Primary recipients, in mail-client order.
    pub to: Vec<EmailAddress>,

    /// Carbon-copy recipients, in mail-client order.
    pub cc: Vec<EmailAddress>,

    /// Received time in the mail client's local time zone.
    pub received: Option<NaiveDateTime>,

    /// HTML body. Empty for plain-text only items.
    pub html_body: String,

    /// Plain-text body, used when the HTML body is missing or unusable.
    pub text_body: String,

    /// Attachments, in mail-client order.
    pub attachments: Vec<Attachment>,
}

impl Message {
    /// Subject to use for titles and file names.
    pub fn subject_or_default(&self) -> &str {
        let trimmed = self.subject.trim();
        if trimmed.is_empty() {
            "No Subject"
        } else {
            trimmed
        }
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
