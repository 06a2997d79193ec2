//! Report errors
//!
//! Only configuration loading can fail; the pipeline itself degrades into
//! diagnostics and the fallback narrative.

use std::path::{Path, PathBuf};

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config text is not valid TOML for a report
    #[error("invalid report configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generator settings are unusable
    #[error("generator setup failed: {0}")]
    Generator(#[from] ghg_narrative::GenerationError),
}

impl ReportError {
    /// Create I/O error
    pub fn io_error(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
