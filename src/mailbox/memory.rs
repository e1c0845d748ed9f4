//! An in-memory mailbox tree.
//!
//! Useful when messages are already at hand, and as the backend for tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{PstError, Result};
use crate::model::message::Message;

use super::{MailClient, MailFolder};

/// One item inside a [`MemoryFolder`].
#[derive(Debug, Clone)]
pub enum MemoryItem {
    /// A mail message.
    Mail(Message),
    /// A non-mail item (calendar entry, contact, …).
    Other,
    /// An item the mail client fails to load.
    Unreadable(String),
}

/// A folder with its items and children.
#[derive(Debug, Clone, Default)]
pub struct MemoryFolder {
    pub name: String,
    pub items: Vec<MemoryItem>,
    pub subfolders: Vec<MemoryFolder>,
}

impl MemoryFolder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style: add a mail message.
    pub fn with_message(mut self, msg: Message) -> Self {
        self.items.push(MemoryItem::Mail(msg));
        self
    }

    /// Builder-style: add any item.
    pub fn with_item(mut self, item: MemoryItem) -> Self {
        self.items.push(item);
        self
    }

    /// Builder-style: add a child folder.
    pub fn with_subfolder(mut self, folder: MemoryFolder) -> Self {
        self.subfolders.push(folder);
        self
    }
}

impl MailFolder for MemoryFolder {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn item_count(&self) -> Result<usize> {
        Ok(self.items.len())
    }

    fn read_item(&self, index: usize) -> Result<Option<Message>> {
        match self.items.get(index) {
            Some(MemoryItem::Mail(msg)) => Ok(Some(msg.clone())),
            Some(MemoryItem::Other) => Ok(None),
            Some(MemoryItem::Unreadable(reason)) => {
                Err(PstError::automation(format!("Items.Item({index})"), reason))
            }
            None => Err(PstError::automation(
                format!("Items.Item({index})"),
                "index out of range",
            )),
        }
    }

    fn subfolders(&self) -> Result<Vec<Box<dyn MailFolder>>> {
        Ok(self
            .subfolders
            .iter()
            .cloned()
            .map(|f| Box::new(f) as Box<dyn MailFolder>)
            .collect())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A mail client serving PST paths from memory.
///
/// Clones share the same store table and the same open/close log.
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    stores: Arc<HashMap<PathBuf, MemoryFolder>>,
    open: Arc<Mutex<Vec<String>>>,
}

impl MemoryClient {
    pub fn new(stores: HashMap<PathBuf, MemoryFolder>) -> Self {
        Self {
            stores: Arc::new(stores),
            open: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Names of the root folders currently mounted.
    pub fn open_stores(&self) -> Vec<String> {
        self.open.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl MailClient for MemoryClient {
    fn open_store(&self, path: &Path) -> Result<Box<dyn MailFolder>> {
        let root = self
            .stores
            .get(path)
            .cloned()
            .ok_or_else(|| PstError::StoreOpen {
                path: path.to_path_buf(),
                reason: "not a known store".to_string(),
            })?;
        if let Ok(mut open) = self.open.lock() {
            open.push(root.name.clone());
        }
        Ok(Box::new(root))
    }

    fn close_store(&self, root: &dyn MailFolder) -> Result<()> {
        let name = root.name();
        if let Ok(mut open) = self.open.lock() {
            if let Some(pos) = open.iter().position(|n| *n == name) {
                open.remove(pos);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_items() {
        let folder = MemoryFolder::new("Inbox")
            .with_message(Message::default())
            .with_item(MemoryItem::Other)
            .with_item(MemoryItem::Unreadable("RPC failed".to_string()));

        assert_eq!(folder.item_count().unwrap(), 3);
        assert!(folder.read_item(0).unwrap().is_some());
        assert!(folder.read_item(1).unwrap().is_none());
        assert!(folder.read_item(2).is_err());
        assert!(folder.read_item(3).is_err());
    }

    #[test]
    fn test_open_and_close_store() {
        let path = PathBuf::from("/mail/archive.pst");
        let mut stores = HashMap::new();
        stores.insert(path.clone(), MemoryFolder::new("Archive"));
        let client = MemoryClient::new(stores);

        let root = client.open_store(&path).unwrap();
        assert_eq!(client.open_stores(), vec!["Archive".to_string()]);
        client.close_store(root.as_ref()).unwrap();
        assert!(client.open_stores().is_empty());

        let missing = client.open_store(Path::new("/mail/other.pst"));
        assert!(matches!(missing, Err(PstError::StoreOpen { .. })));
    }
}
