//! Output format selection.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TmError;

/// Serialization format for datasets and reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pretty-printed JSON; the canonical dataset format.
    #[default]
    Json,
    /// Flattened single-level rows.
    Csv,
    Yaml,
}

impl OutputFormat {
    /// Format implied by a file extension, if recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "yml" | "yaml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Explicit choice, else the destination's extension, else `fallback`.
    pub fn resolve(explicit: Option<Self>, path: &Path, fallback: Self) -> Self {
        explicit
            .or_else(|| Self::from_path(path))
            .unwrap_or(fallback)
    }
}

impl FromStr for OutputFormat {
    type Err = TmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(TmError::UnsupportedFormat(format!(
                "'{other}' (supported: json, csv, yaml)"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Yaml => "yaml",
        })
    }
}
