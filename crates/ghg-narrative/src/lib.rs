//! GHG Narrative
//!
//! Executive summary for a verified dataset. Generated text is untrusted:
//! it is shown only after the validator has traced every figure back to the
//! dataset, otherwise a deterministic template takes its place.
//!
//! # Core Operations
//!
//! - **Prompt**: build the instruction pair from dataset figures
//! - **Generate**: call an external [`NarrativeGenerator`] under a timeout
//! - **Validate**: reject unverified numbers, Markdown and speculation
//! - **Fallback**: template summary that never fails
//!
//! # Example
//!
//! ```rust,ignore
//! use ghg_narrative::{Narrator, NarrativeConfig, OpenAiGenerator};
//! use std::sync::Arc;
//!
//! let narrator = Narrator::new(NarrativeConfig::default())
//!     .with_generator(Arc::new(OpenAiGenerator::new(api_key)?));
//! let summary = narrator.narrate(&dataset).await;
//! println!("{}", summary.text);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod facts;
pub mod fallback;
pub mod generator;
pub mod narrator;
pub mod prompt;
pub mod validator;

pub use config::{Constituent, NarrativeConfig, NarrativeLanguage, Sampling};
pub use error::GenerationError;
pub use facts::{Facts, ShareLine};
pub use fallback::FallbackBuilder;
pub use generator::{NarrativeGenerator, OpenAiGenerator, DEFAULT_BASE_URL};
pub use narrator::{FallbackReason, Narrative, NarrativeOrigin, Narrator, DEFAULT_TIMEOUT};
pub use prompt::{NarrativeRequest, PromptBuilder};
pub use validator::{NarrativeValidator, StructuralKind, ValidationPolicy, ValidationVerdict, Violation};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
