//! Access to mailbox contents through the host mail client.
//!
//! The PST format itself is never parsed here. A [`MailClient`] mounts a PST
//! and hands back its root [`MailFolder`]; the [`walker`] drives the rest.

use std::path::Path;

use crate::error::Result;
use crate::model::message::Message;

pub mod memory;
#[cfg(windows)]
pub mod outlook;
pub mod walker;

/// A session with the mail client. One per worker; sessions are not shared
/// across threads.
pub trait MailClient {
    /// Mount the PST at `path` and return its root folder.
    fn open_store(&self, path: &Path) -> Result<Box<dyn MailFolder>>;

    /// Detach a store previously returned by [`MailClient::open_store`].
    fn close_store(&self, root: &dyn MailFolder) -> Result<()>;
}

/// One folder of a mounted store.
pub trait MailFolder {
    /// Folder display name.
    fn name(&self) -> String;

    /// Number of items directly in this folder (mail and non-mail).
    fn item_count(&self) -> Result<usize>;

    /// Load the item at `index` (0-based). `Ok(None)` for items that are not
    /// mail messages, such as meeting requests or contacts.
    fn read_item(&self, index: usize) -> Result<Option<Message>>;

    /// Direct child folders, in mail-client order.
    fn subfolders(&self) -> Result<Vec<Box<dyn MailFolder>>>;

    /// Backend handle for [`MailClient::close_store`].
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Builds a fresh [`MailClient`] on the calling thread.
pub type ClientFactory = dyn Fn() -> Result<Box<dyn MailClient>> + Send + Sync;

/// Connect to the platform mail client.
///
/// On Windows this starts (or attaches to) Outlook. Elsewhere there is no
/// mail client to talk to.
pub fn connect_default() -> Result<Box<dyn MailClient>> {
    #[cfg(windows)]
    {
        Ok(Box::new(outlook::OutlookClient::connect()?))
    }
    #[cfg(not(windows))]
    {
        Err(crate::error::PstError::MailClientUnavailable(
            "Outlook automation is only available on Windows".to_string(),
        ))
    }
}
