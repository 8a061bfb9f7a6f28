//! Output formatting module

pub mod formatter;
pub mod human;
pub mod json;
pub mod messages;

pub use formatter::{format_status, OutputFormat};
pub use messages::{bad, good, warn};
