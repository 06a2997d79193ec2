//! Dataset error types

/// Rejected dataset writes
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatasetError {
    /// Field already holds a value
    #[error("field '{field}' is already populated")]
    AlreadySet { field: String },

    /// Numbers must be finite
    #[error("field '{field}' would hold a non-finite number")]
    NonFinite { field: String },
}

impl DatasetError {
    /// Create write conflict error
    pub fn already_set(field: impl Into<String>) -> Self {
        Self::AlreadySet { field: field.into() }
    }

    /// Create non-finite error
    pub fn non_finite(field: impl Into<String>) -> Self {
        Self::NonFinite { field: field.into() }
    }
}
