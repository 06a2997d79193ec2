//! GHG Report
//!
//! Ties the workspace together: sources are loaded, the dataset is
//! assembled, the executive summary is written, and the result is handed to
//! an external document renderer as one JSON context.
//!
//! # Core Operations
//!
//! - **Configure**: [`ReportConfig`] from TOML, or the built-in
//!   [`ReportConfig::ghg_inventory`] layout; generator secrets from the
//!   environment
//! - **Load**: [`ReportPipeline::load_sources`]
//! - **Run**: [`ReportPipeline::run`] producing a [`Report`]
//! - **Render context**: [`Report::template_context`]
//!
//! # Example
//!
//! ```rust,ignore
//! use ghg_report::prelude::*;
//!
//! telemetry::init_tracing(false);
//! let config = ReportConfig::ghg_inventory().with_generator(GeneratorSettings::from_env());
//! let pipeline = ReportPipeline::from_config(config);
//! let report = pipeline
//!     .run_paths(&[
//!         (PathBuf::from("减排行动统计.csv"), SourceRole::Primary),
//!         (PathBuf::from("inventory.xlsx"), SourceRole::Secondary),
//!     ])
//!     .await;
//! println!("{}", report.template_context());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod preset;
pub mod telemetry;

pub use config::{GeneratorSettings, ReportConfig};
pub use error::ReportError;
pub use pipeline::{Report, ReportPipeline, SUMMARY_KEY};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a report
    pub use crate::config::{GeneratorSettings, ReportConfig};
    pub use crate::pipeline::{Report, ReportPipeline};
    pub use crate::telemetry;
    pub use ghg_source::SourceRole;
    pub use std::path::PathBuf;
}
