//! Generation errors
//!
//! Every variant is recoverable: the narrator answers all of them with the
//! fallback narrative.

use std::time::Duration;

/// Failure of an external generation call
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API key configured
    #[error("no API key configured for {provider}")]
    MissingApiKey { provider: String },

    /// The call did not finish in time
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    /// Request could not be sent or the reply could not be read
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Reply carried no text
    #[error("empty reply")]
    EmptyReply,

    /// Invalid client settings
    #[error("invalid generator configuration: {0}")]
    Config(String),
}

impl GenerationError {
    /// Create status error
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            GenerationError::Timeout(Duration::from_secs(20)).to_string(),
            "generation timed out after 20s"
        );
        assert_eq!(GenerationError::status(429, "slow down").to_string(), "service returned 429: slow down");
    }
}
