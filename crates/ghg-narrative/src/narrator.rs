//! Narration control flow
//!
//! ```text
//! Dataset ─→ PromptBuilder ─→ generator (timeout) ─→ validator ─→ Generated
//!                                  │                     │
//!                            error / empty             reject
//!                                  └──────→ FallbackBuilder ←┘
//! ```
//!
//! One attempt per dataset. Narration never fails: every failure path ends in
//! the fallback text with the reason recorded.

use crate::config::NarrativeConfig;
use crate::error::GenerationError;
use crate::fallback::FallbackBuilder;
use crate::generator::NarrativeGenerator;
use crate::prompt::PromptBuilder;
use crate::validator::{NarrativeValidator, ValidationPolicy, Violation};
use ghg_dataset::Dataset;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on one generation call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Why the fallback text was used
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// No generator configured
    NoGenerator,
    /// Generator did not answer in time
    Timeout,
    /// Generator returned an error
    Failed {
        /// Error text
        error: String,
    },
    /// Generator returned blank text
    Empty,
    /// Validator rejected the candidate
    Rejected {
        /// Violations found
        violations: Vec<Violation>,
    },
}

/// Where the final text came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum NarrativeOrigin {
    /// Accepted generator output
    Generated,
    /// Fallback template
    Fallback(FallbackReason),
}

/// Final narrative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Narrative {
    /// Text shown to readers
    pub text: String,
    /// Source of the text
    pub origin: NarrativeOrigin,
}

impl Narrative {
    /// Whether the generator's text was accepted
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.origin == NarrativeOrigin::Generated
    }
}

/// Produces the executive summary for a dataset
#[derive(Clone)]
pub struct Narrator {
    prompt: PromptBuilder,
    validator: NarrativeValidator,
    fallback: FallbackBuilder,
    generator: Option<Arc<dyn NarrativeGenerator>>,
    timeout: Duration,
}

impl std::fmt::Debug for Narrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Narrator {
    /// Narrator without a generator; always produces the fallback
    #[must_use]
    pub fn new(config: NarrativeConfig) -> Self {
        Self {
            prompt: PromptBuilder::new(config.clone()),
            validator: NarrativeValidator::new(&config),
            fallback: FallbackBuilder::new(config),
            generator: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// With generator
    #[inline]
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn NarrativeGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// With bound on the generation call
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// With validation thresholds
    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.validator = self.validator.with_policy(policy);
        self
    }

    /// Fallback text for a dataset
    #[must_use]
    pub fn fallback(&self, dataset: &Dataset) -> String {
        self.fallback.build(dataset)
    }

    /// Narrate a dataset
    pub async fn narrate(&self, dataset: &Dataset) -> Narrative {
        let Some(generator) = &self.generator else {
            tracing::info!("no generator configured; using fallback summary");
            return self.fall_back(dataset, FallbackReason::NoGenerator);
        };

        let request = self.prompt.build(dataset);
        let reply = tokio::time::timeout(self.timeout, generator.generate(&request))
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.timeout)));

        let candidate = match reply {
            Ok(text) if text.trim().is_empty() => return self.fall_back(dataset, FallbackReason::Empty),
            Ok(text) => text.trim().to_string(),
            Err(GenerationError::EmptyReply) => return self.fall_back(dataset, FallbackReason::Empty),
            Err(GenerationError::Timeout(after)) => {
                tracing::warn!(generator = generator.name(), ?after, "generation timed out");
                return self.fall_back(dataset, FallbackReason::Timeout);
            }
            Err(e) => {
                tracing::warn!(generator = generator.name(), "generation failed: {e}");
                return self.fall_back(dataset, FallbackReason::Failed { error: e.to_string() });
            }
        };

        let verdict = self.validator.validate(&candidate, dataset);
        if verdict.accepted {
            tracing::info!(generator = generator.name(), chars = candidate.chars().count(), "generated summary accepted");
            Narrative {
                text: candidate,
                origin: NarrativeOrigin::Generated,
            }
        } else {
            tracing::warn!(violations = verdict.violations.len(), "generated summary rejected");
            self.fall_back(
                dataset,
                FallbackReason::Rejected {
                    violations: verdict.violations,
                },
            )
        }
    }

    fn fall_back(&self, dataset: &Dataset, reason: FallbackReason) -> Narrative {
        Narrative {
            text: self.fallback.build(dataset),
            origin: NarrativeOrigin::Fallback(reason),
        }
    }
}
