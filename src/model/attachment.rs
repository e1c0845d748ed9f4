//! Attachment content as pulled out of the mailbox.

/// A single file attached to a message.
///
/// Content is held in memory for the lifetime of one message only; the
/// walker drops it once the message has been written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    /// Filename as reported by the mail client. May be empty.
    pub filename: String,

    /// Raw attachment bytes.
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
