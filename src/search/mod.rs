//! Content search: regular-expression queries over subject and body text.

pub mod content;

pub use content::{ContentQuery, ContentReport, DEFAULT_PATTERN};
