//! Narrative validator
//!
//! Treats generated text as untrusted. A candidate is accepted only when
//! every check passes:
//!
//! - **numbers**: each numeric token matches a dataset figure, or is a
//!   calendar year, a marked percentage, or a small ordinal
//! - **structure**: no Markdown headings, emphasis, code fences or list items
//! - **language**: no speculative wording
//!
//! Violations are reported numeric first, then structural, then speculative,
//! each group in text order.

use crate::config::NarrativeConfig;
use crate::facts::numeric_field;
use ghg_dataset::{Dataset, FieldValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Digit runs; thousands-grouped runs count as one token
static NUMBER_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("number token regex"));

/// Numbered list item at line start
static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s").expect("numbered item regex"));

/// Tunable acceptance thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// Absolute difference accepted between a token and a reference figure
    pub tolerance: f64,
    /// Inclusive year range
    pub year_range: (u32, u32),
    /// Characters either side of a token searched for a percent marker
    pub percent_window: usize,
    /// Texts that mark a percentage
    pub percent_markers: Vec<String>,
    /// Longest digit count of an ordinal
    pub ordinal_max_digits: usize,
    /// Ordinals must be below this
    pub ordinal_limit: u32,
    /// Speculative terms, matched case-insensitively
    pub speculative_terms: Vec<String>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            year_range: (1900, 2100),
            percent_window: 5,
            percent_markers: ["%", "％", "percent", "占比", "比例"].map(String::from).to_vec(),
            ordinal_max_digits: 2,
            ordinal_limit: 50,
            speculative_terms: [
                "estimat", "probabl", "approximat", "forecast", "speculat", "likely", "roughly", "predict", "预计",
                "预测", "可能", "大约", "大概", "估计", "推测",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

/// Kind of formatting found in a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralKind {
    /// `#` heading
    Heading,
    /// `*` or `__` emphasis
    Emphasis,
    /// Fenced code block
    CodeFence,
    /// Bullet or numbered list item
    ListItem,
}

/// Reason a candidate was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Violation {
    /// Number not traceable to the dataset
    UnverifiedNumber {
        /// Token as written
        token: String,
    },
    /// Markdown structure
    StructuralMarker {
        /// What was found
        kind: StructuralKind,
        /// 1-based line
        line: usize,
    },
    /// Speculative wording
    SpeculativeLanguage {
        /// Denylisted term matched
        term: String,
    },
}

/// Outcome of validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// True only with no violations
    pub accepted: bool,
    /// Ordered violations
    pub violations: Vec<Violation>,
}

impl ValidationVerdict {
    fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            accepted: violations.is_empty(),
            violations,
        }
    }
}

/// Checks candidates against the dataset
#[derive(Debug, Clone)]
pub struct NarrativeValidator {
    reference_fields: Vec<String>,
    policy: ValidationPolicy,
}

impl NarrativeValidator {
    /// Validator taking reference figures from the configured fields
    #[must_use]
    pub fn new(config: &NarrativeConfig) -> Self {
        Self {
            reference_fields: config.references().into_iter().map(String::from).collect(),
            policy: ValidationPolicy::default(),
        }
    }

    /// With policy
    #[must_use]
    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Policy in use
    #[must_use]
    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Validate a candidate
    #[must_use]
    pub fn validate(&self, candidate: &str, dataset: &Dataset) -> ValidationVerdict {
        let references = self.reference_numbers(dataset);
        let mut violations = self.unverified_numbers(candidate, &references);
        violations.extend(structural_markers(candidate));
        violations.extend(speculative_terms(candidate, &self.policy.speculative_terms));

        for v in &violations {
            tracing::warn!(violation = ?v, "narrative check failed");
        }
        ValidationVerdict::from_violations(violations)
    }

    /// Numbers the text may quote
    fn reference_numbers(&self, dataset: &Dataset) -> Vec<f64> {
        let mut numbers = Vec::new();
        for field in &self.reference_fields {
            match dataset.get(field) {
                Some(FieldValue::Number(n)) => numbers.push(*n),
                Some(FieldValue::Text(s)) => {
                    numbers.extend(numeric_field(dataset, field));
                    numbers.extend(NUMBER_TOKEN.find_iter(s).filter_map(|m| token_value(m.as_str())));
                }
                _ => {}
            }
        }
        numbers
    }

    fn unverified_numbers(&self, text: &str, references: &[f64]) -> Vec<Violation> {
        NUMBER_TOKEN
            .find_iter(text)
            .filter(|m| {
                !self.is_accepted_number(text, m.start(), m.end(), references)
                    && !self.is_accepted_enumeration(text, m.start(), m.as_str(), references)
            })
            .map(|m| Violation::UnverifiedNumber {
                token: m.as_str().to_string(),
            })
            .collect()
    }

    /// A grouped token such as `800,750` read as a comma-separated list
    fn is_accepted_enumeration(&self, text: &str, start: usize, token: &str, references: &[f64]) -> bool {
        if !token.contains(',') {
            return false;
        }
        let mut at = start;
        token.split(',').all(|part| {
            let (lo, hi) = (at, at + part.len());
            at = hi + 1;
            self.is_accepted_number(text, lo, hi, references)
        })
    }

    fn is_accepted_number(&self, text: &str, start: usize, end: usize, references: &[f64]) -> bool {
        let token = &text[start..end];
        let Some(value) = token_value(token) else {
            return false;
        };
        matches_reference(value, references, self.policy.tolerance)
            || self.is_year(token, value)
            || self.is_marked_percentage(text, start, end, value)
            || self.is_ordinal(token, value)
    }

    fn is_year(&self, token: &str, value: f64) -> bool {
        let (lo, hi) = self.policy.year_range;
        !token.contains(['.', ',']) && value >= f64::from(lo) && value <= f64::from(hi)
    }

    fn is_marked_percentage(&self, text: &str, start: usize, end: usize, value: f64) -> bool {
        if !(0.0..=100.0).contains(&value) {
            return false;
        }
        let (lo, hi) = char_window(text, start, end, self.policy.percent_window);
        self.policy.percent_markers.iter().any(|marker| {
            text.match_indices(marker.as_str())
                .any(|(at, m)| at < hi && at + m.len() > lo)
        })
    }

    fn is_ordinal(&self, token: &str, value: f64) -> bool {
        let digits = token.trim_start_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        digits.chars().all(|c| c.is_ascii_digit())
            && digits.len() <= self.policy.ordinal_max_digits
            && value < f64::from(self.policy.ordinal_limit)
    }
}

fn token_value(token: &str) -> Option<f64> {
    token.replace(',', "").parse::<f64>().ok()
}

fn matches_reference(value: f64, references: &[f64], tolerance: f64) -> bool {
    references.iter().any(|r| (value - r).abs() < tolerance)
}

/// Byte bounds of `width` characters either side of `[start, end)`
fn char_window(text: &str, start: usize, end: usize, width: usize) -> (usize, usize) {
    let lo = text[..start]
        .char_indices()
        .rev()
        .take(width)
        .last()
        .map_or(start, |(i, _)| i);
    let hi = text[end..]
        .char_indices()
        .nth(width)
        .map_or(text.len(), |(i, _)| end + i);
    (lo, hi)
}

/// Markdown structure found in the text
#[must_use]
pub fn structural_markers(text: &str) -> Vec<Violation> {
    let mut found = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim_start();
        let mut push = |kind| found.push(Violation::StructuralMarker { kind, line: i + 1 });

        if trimmed.starts_with('#') || line.contains("##") {
            push(StructuralKind::Heading);
        }
        if line.contains("```") || line.contains("~~~") {
            push(StructuralKind::CodeFence);
        }
        if is_list_item(trimmed) {
            push(StructuralKind::ListItem);
        } else if line.contains('*') || line.contains("__") {
            push(StructuralKind::Emphasis);
        }
    }
    found
}

fn is_list_item(trimmed: &str) -> bool {
    ["- ", "* ", "+ ", "• "].iter().any(|p| trimmed.starts_with(p)) || NUMBERED_ITEM.is_match(trimmed)
}

/// Denylisted terms present in the text, in order of first appearance
#[must_use]
pub fn speculative_terms(text: &str, terms: &[String]) -> Vec<Violation> {
    let lowered = text.to_lowercase();
    let mut hits: Vec<(usize, &String)> = terms
        .iter()
        .filter_map(|t| lowered.find(&t.to_lowercase()).map(|at| (at, t)))
        .collect();
    hits.sort_by_key(|(at, _)| *at);
    hits.into_iter()
        .map(|(_, t)| Violation::SpeculativeLanguage { term: t.clone() })
        .collect()
}
