//! Field provenance
//!
//! Advisory record of where each dataset field came from. Provenance never
//! influences values; it exists for diagnostics and audit output.

use ghg_source::{CellRef, DocumentId};
use indexmap::IndexMap;
use serde::Serialize;

/// Origin of one field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Label lookup in a grid
    Located {
        /// Source document
        document: DocumentId,
        /// Label cell
        label_at: CellRef,
        /// Value cell
        value_at: CellRef,
    },
    /// `parameter,value` row of a delimited document
    KeyValue {
        /// Source document
        document: DocumentId,
        /// Parameter name
        key: String,
    },
    /// Pattern search over a grid
    Pattern {
        /// Source document
        document: DocumentId,
        /// Matches combined into the value
        matches: usize,
    },
    /// Section records of a delimited document
    Sections {
        /// Source document
        document: DocumentId,
        /// Section name
        section: String,
    },
    /// Header-keyed table
    Table {
        /// Source document
        document: DocumentId,
    },
    /// Regex capture from another field
    Extracted {
        /// Field the capture was taken from
        from: String,
    },
    /// Sum of constituent fields
    Derived {
        /// Constituents that were present
        constituents: Vec<String>,
    },
    /// Copy of another field
    Alias {
        /// Field copied
        of: String,
    },
    /// Declared default
    Default,
}

impl Provenance {
    /// Whether the value was read from a source document
    #[must_use]
    pub fn is_sourced(&self) -> bool {
        matches!(
            self,
            Self::Located { .. } | Self::KeyValue { .. } | Self::Pattern { .. } | Self::Sections { .. } | Self::Table { .. }
        )
    }
}

/// Provenance per field, in population order
pub type ProvenanceMap = IndexMap<String, Provenance>;
