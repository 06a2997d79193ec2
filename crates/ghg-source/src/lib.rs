//! GHG Source Documents
//!
//! The untrusted boundary between inventory files and the dataset. Nothing
//! here assumes a fixed cell layout: values are found by label, sections by
//! title text.
//!
//! # Core Operations
//!
//! - **Load**: open workbooks (one grid per sheet) and delimited text
//!   (encoding probed) into read-only [`Document`]s
//! - **Normalize**: coerce raw cells into numbers or trimmed text
//! - **Locate**: find the value adjacent to a label cell
//! - **Sections**: split a delimited export into titled record lists
//!
//! # Architecture
//!
//! ```text
//! path → loader → Document (Grid | Delimited) → SourceSet
//!                                   │
//!          locate / locate_all ←────┼────→ SectionParser → Sections
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use ghg_source::prelude::*;
//!
//! let docs = load_path(Path::new("inventory.xlsx"), SourceRole::Secondary, &LoadOptions::default())?;
//! let mut set = SourceSet::new();
//! docs.into_iter().for_each(|d| set.insert(d));
//!
//! let id = DocumentId::sheet(Path::new("inventory.xlsx"), "温室气体盘查清册");
//! let total = set.locate(&id, &LabelQuery::new("总排放量"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod delimited;
pub mod document;
pub mod encoding;
pub mod error;
pub mod grid;
pub mod loader;
pub mod locator;
pub mod sections;
pub mod table;
pub mod value;

pub use delimited::DelimitedDocument;
pub use document::{Document, DocumentBody, DocumentId, DocumentKind, SourceRole, SourceSet, Unavailable};
pub use encoding::TextEncoding;
pub use error::{LocateMiss, SourceError};
pub use grid::{CellRef, Grid};
pub use loader::{load_path, LoadOptions};
pub use locator::{Direction, LabelQuery, Located, MatchMode, PatternQuery, SearchScope};
pub use sections::{Record, SectionMarker, SectionParser, Sections};
pub use table::{read_table, RowSource, TableOptions, TableRow};
pub use value::{format_number, normalize, normalize_str, CellValue, RawValue, UNIT_SUFFIXES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for reading source documents
    pub use crate::document::{Document, DocumentId, SourceRole, SourceSet};
    pub use crate::loader::{load_path, LoadOptions};
    pub use crate::locator::{Direction, LabelQuery, PatternQuery};
    pub use crate::sections::{Record, SectionMarker, SectionParser};
    pub use crate::value::CellValue;
    pub use std::path::Path;
}
