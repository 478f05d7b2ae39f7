//! Output formatting module
//!
//! Renders run snapshots for terminals and machines.

mod formatter;

pub use formatter::{OutputFormat, ResultFormatter};
