//! Report generation and file outputs.
//!
//! # Submodules
//!
//! - [`html`]: Assembles the tag-grouped report body and the styled document
//! - [`json`]: Writes the document and a JSON snapshot of the run to disk

pub mod html;
pub mod json;
