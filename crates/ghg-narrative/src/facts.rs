//! Figures a narrative may state
//!
//! Read once from the dataset and shared by the prompt and the fallback so
//! both describe the same numbers the same way.

use crate::config::{NarrativeConfig, NarrativeLanguage};
use ghg_dataset::{Dataset, FieldValue};
use ghg_source::{format_number, normalize_str};

/// One constituent with its value and share of the total
#[derive(Debug, Clone, PartialEq)]
pub struct ShareLine {
    /// Display label
    pub label: String,
    /// Value
    pub value: f64,
    /// Percentage of the total, when the total is positive
    pub share: Option<f64>,
}

/// Facts extracted from a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Facts {
    /// Entity name
    pub entity: Option<String>,
    /// Reporting period
    pub period: Option<String>,
    /// Total
    pub total: Option<f64>,
    /// Present constituents in display order
    pub parts: Vec<ShareLine>,
    /// Unit label
    pub unit: String,
    /// Output language
    pub language: NarrativeLanguage,
}

/// Numeric value of a field; text fields are normalized first
#[must_use]
pub fn numeric_field(dataset: &Dataset, field: &str) -> Option<f64> {
    match dataset.get(field)? {
        FieldValue::Number(n) => Some(*n),
        FieldValue::Text(s) => normalize_str(s)?.as_number(),
        FieldValue::Records(_) | FieldValue::Table(_) => None,
    }
}

fn text_field(dataset: &Dataset, field: &str) -> Option<String> {
    dataset
        .get(field)
        .and_then(FieldValue::scalar_text)
        .filter(|s| !s.trim().is_empty())
}

impl Facts {
    /// Gather facts
    #[must_use]
    pub fn gather(config: &NarrativeConfig, dataset: &Dataset) -> Self {
        let total = numeric_field(dataset, &config.total_field);
        let parts = config
            .constituents
            .iter()
            .filter_map(|c| {
                let value = numeric_field(dataset, &c.field)?;
                let share = total.filter(|t| *t > 0.0).map(|t| value / t * 100.0);
                Some(ShareLine {
                    label: c.label.clone(),
                    value,
                    share,
                })
            })
            .collect();
        Self {
            entity: text_field(dataset, &config.entity_field),
            period: text_field(dataset, &config.period_field),
            total,
            parts,
            unit: config.unit.clone(),
            language: config.language,
        }
    }

    /// Entity or its placeholder
    #[must_use]
    pub fn entity_text(&self) -> &str {
        self.entity.as_deref().unwrap_or(self.language.entity_placeholder())
    }

    /// Period or its placeholder
    #[must_use]
    pub fn period_text(&self) -> &str {
        self.period.as_deref().unwrap_or(self.language.period_placeholder())
    }

    /// Total with unit, or the pending placeholder
    #[must_use]
    pub fn total_text(&self) -> String {
        self.total
            .map_or_else(|| self.language.pending().to_string(), |t| self.quantity(t))
    }

    /// Figure with unit
    #[must_use]
    pub fn quantity(&self, value: f64) -> String {
        match self.language {
            NarrativeLanguage::English => format!("{} {}", format_number(value), self.unit),
            NarrativeLanguage::Chinese => format!("{}{}", format_number(value), self.unit),
        }
    }

    /// Whether the total is positive
    #[must_use]
    pub fn has_positive_total(&self) -> bool {
        self.total.is_some_and(|t| t > 0.0)
    }
}

/// One decimal place percentage, e.g. `30.0%`
#[must_use]
pub fn percent(share: f64) -> String {
    format!("{share:.1}%")
}
