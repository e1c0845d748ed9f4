//! Centralized error types for pst2md.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the pst2md library.
#[derive(Error, Debug)]
pub enum PstError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified PST file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// The path exists but cannot be used as a PST input.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The host mail client is not installed or could not be started.
    #[error("Outlook not found: {0}")]
    MailClientUnavailable(String),

    /// The mail client refused to mount the PST (locked, corrupt, unreadable).
    #[error("Could not open PST '{path}': {reason}")]
    StoreOpen { path: PathBuf, reason: String },

    /// The PST was mounted but its root folder could not be located.
    #[error("Could not locate PST folder in Outlook for '{0}'")]
    StoreNotFound(PathBuf),

    /// A call through the automation interface failed.
    #[error("Automation call '{member}' failed: {reason}")]
    Automation { member: String, reason: String },

    /// A message could not be rendered to Markdown.
    #[error("Conversion error: {0}")]
    Conversion(String),
}

/// Convenience alias for `Result<T, PstError>`.
pub type Result<T> = std::result::Result<T, PstError>;

impl PstError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `Automation` variant for a named member.
    pub fn automation(member: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Automation {
            member: member.into(),
            reason: reason.to_string(),
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare, prefer `PstError::io`).
impl From<std::io::Error> for PstError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
