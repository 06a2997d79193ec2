//! GHG Dataset
//!
//! The verified field map a report is rendered from, and the assembler that
//! builds it from source documents.
//!
//! # Guarantees
//!
//! - numeric fields are finite or absent
//! - derived totals equal the sum of their constituents (within tolerance)
//! - a field populated from a source document is never overwritten
//! - a built [`Dataset`] cannot be mutated
//!
//! # Example
//!
//! ```rust,ignore
//! use ghg_dataset::{Assembler, AssemblerConfig, AggregateSpec, KeyValueImport};
//!
//! let config = AssemblerConfig::new()
//!     .with_key_values(KeyValueImport::default())
//!     .with_aggregate(AggregateSpec::sum("total", ["scope_1", "scope_2", "scope_3"]));
//! let assembly = Assembler::new(config).assemble(&sources);
//! println!("{:?}", assembly.dataset.number("total"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod assembler;
pub mod config;
pub mod dataset;
pub mod error;
pub mod field;
pub mod provenance;

pub use assembler::{Assembler, Assembly, AssemblyDiagnostic};
pub use config::{
    AggregateSpec, AliasSpec, AssemblerConfig, Combine, DocumentSelector, ExtractSpec, FieldKind, FieldSource,
    FieldSpec, KeyValueImport, RecordListSpec, SectionsSpec, SummaryRow, TableSpec, DEFAULT_TOLERANCE,
};
pub use dataset::{Dataset, DatasetBuilder};
pub use error::DatasetError;
pub use field::{format_quantity, FieldValue};
pub use provenance::{Provenance, ProvenanceMap};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
