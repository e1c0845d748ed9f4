//! `pst2md`: extract Outlook PST archives into Markdown files.
//!
//! The PST itself is read through the host mail client (see [`mailbox`]);
//! this crate walks the folders, renders each message as Markdown, and
//! writes it with its attachments.

pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod mailbox;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod progress;
