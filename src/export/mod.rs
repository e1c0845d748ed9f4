//! Output side: file naming, collision handling, and writing messages.

pub mod filename;
pub mod writer;

pub use writer::{write_message, WrittenMessage};
