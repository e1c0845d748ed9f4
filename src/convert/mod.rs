//! Message to Markdown conversion.

pub mod document;
pub mod html;

pub use document::render_message;
