//! Narrative configuration
//!
//! Names the dataset fields the summary talks about and the language it is
//! written in. The same configuration drives the prompt, the validator's
//! reference set and the fallback text, so the three always agree on which
//! figures are facts.

use serde::{Deserialize, Serialize};

/// Output language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeLanguage {
    /// English
    #[default]
    English,
    /// Simplified Chinese
    Chinese,
}

impl NarrativeLanguage {
    /// Placeholder for a missing entity name
    #[must_use]
    pub const fn entity_placeholder(self) -> &'static str {
        match self {
            Self::English => "The organisation",
            Self::Chinese => "该公司",
        }
    }

    /// Placeholder for a missing period
    #[must_use]
    pub const fn period_placeholder(self) -> &'static str {
        match self {
            Self::English => "the reporting year",
            Self::Chinese => "本年度",
        }
    }

    /// Placeholder for a missing figure
    #[must_use]
    pub const fn pending(self) -> &'static str {
        match self {
            Self::English => "data pending",
            Self::Chinese => "数据待补充",
        }
    }
}

/// Component of the total with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    /// Dataset field
    pub field: String,
    /// Label used in text
    pub label: String,
}

impl Constituent {
    /// Create a constituent
    pub fn new(field: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
        }
    }
}

/// Sampling parameters sent to the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling mass
    pub top_p: f32,
    /// Reply length cap
    pub max_tokens: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.0,
            top_p: 1.0,
            max_tokens: 300,
        }
    }
}

/// What the summary is about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeConfig {
    /// Organisation name field
    pub entity_field: String,
    /// Reporting period field
    pub period_field: String,
    /// Total field
    pub total_field: String,
    /// Parts of the total, in display order
    #[serde(default)]
    pub constituents: Vec<Constituent>,
    /// Fields whose numbers the text may quote; empty means total plus constituents
    #[serde(default)]
    pub reference_fields: Vec<String>,
    /// Unit appended to figures
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Output language
    #[serde(default)]
    pub language: NarrativeLanguage,
    /// Character limit stated in the instruction
    #[serde(default = "default_char_limit")]
    pub char_limit: usize,
    /// Sampling parameters
    #[serde(default)]
    pub sampling: Sampling,
}

fn default_unit() -> String {
    "tCO2e".to_string()
}

fn default_char_limit() -> usize {
    300
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            entity_field: "company_name".to_string(),
            period_field: "report_year".to_string(),
            total_field: "total_emission_location".to_string(),
            constituents: Vec::new(),
            reference_fields: Vec::new(),
            unit: default_unit(),
            language: NarrativeLanguage::default(),
            char_limit: default_char_limit(),
            sampling: Sampling::default(),
        }
    }
}

impl NarrativeConfig {
    /// Config over the given entity, period and total fields
    pub fn new(entity: impl Into<String>, period: impl Into<String>, total: impl Into<String>) -> Self {
        Self {
            entity_field: entity.into(),
            period_field: period.into(),
            total_field: total.into(),
            ..Self::default()
        }
    }

    /// With constituent
    #[must_use]
    pub fn with_constituent(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.constituents.push(Constituent::new(field, label));
        self
    }

    /// With explicit reference fields
    #[must_use]
    pub fn with_reference_fields<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.reference_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// With language
    #[must_use]
    pub fn with_language(mut self, language: NarrativeLanguage) -> Self {
        self.language = language;
        self
    }

    /// With unit
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// With model name
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.sampling.model = model.into();
        self
    }

    /// Fields the validator takes reference numbers from
    #[must_use]
    pub fn references(&self) -> Vec<&str> {
        if self.reference_fields.is_empty() {
            std::iter::once(self.total_field.as_str())
                .chain(self.constituents.iter().map(|c| c.field.as_str()))
                .collect()
        } else {
            self.reference_fields.iter().map(String::as_str).collect()
        }
    }
}
