//! Error types for source documents
//!
//! Two families:
//! - [`SourceError`]: a document could not be opened or decoded
//! - [`LocateMiss`]: a label query found nothing usable
//!
//! Neither is fatal to report assembly; callers degrade to an absent value.

use crate::grid::CellRef;
use crate::locator::Direction;
use std::path::PathBuf;

/// Errors while loading a document
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// IO error during file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No loader for this file type
    #[error("unsupported document type: {path}")]
    UnsupportedKind { path: PathBuf },

    /// Every candidate encoding failed
    #[error("could not decode {path} as any of: {tried}")]
    Undecodable { path: PathBuf, tried: String },

    /// Workbook could not be opened or a sheet could not be read
    #[error("workbook error in {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    /// Malformed delimited text
    #[error("malformed delimited text: {0}")]
    Delimited(#[from] csv::Error),
}

impl SourceError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create workbook error for path
    pub fn workbook(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Workbook {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Why a label query produced no value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocateMiss {
    /// No document with this identifier
    #[error("unknown document '{id}'")]
    UnknownDocument { id: String },

    /// The document is not a grid
    #[error("document '{id}' is not a grid")]
    NotAGrid { id: String },

    /// The query has no label text
    #[error("empty label query")]
    EmptyQuery,

    /// No candidate cell matched
    #[error("no cell matching '{label}'")]
    LabelNotFound { label: String },

    /// The value cell would lie outside the sheet
    #[error("'{label}' at {at}: no cell {direction:?} of it")]
    OutsideSheet {
        label: String,
        at: CellRef,
        direction: Direction,
    },

    /// The value cell is blank
    #[error("'{label}': value cell {at} is empty")]
    EmptyValue { label: String, at: CellRef },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_miss_display() {
        let miss = LocateMiss::LabelNotFound {
            label: "范围三".to_string(),
        };
        assert_eq!(miss.to_string(), "no cell matching '范围三'");

        let miss = LocateMiss::EmptyValue {
            label: "Total".to_string(),
            at: CellRef::new(5, 2),
        };
        assert_eq!(miss.to_string(), "'Total': value cell R5C2 is empty");
    }

    #[test]
    fn io_error_keeps_path() {
        let err = SourceError::io_error(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("missing.csv"));
    }
}
