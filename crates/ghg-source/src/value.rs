//! Cell value normalization
//!
//! Raw cells arrive loosely typed: numbers stored as text, thousands
//! separators, trailing units (`1,234.5 t`, `30%`, `12.8tCO2e`). Everything
//! downstream works with [`CellValue`], a finite number or a trimmed,
//! non-empty string. `None` marks an absent cell.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric prefix followed by an optional single suffix token.
///
/// Commas are only accepted as thousands separators between groups of three.
static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|\.\d+))\s*(\S*)$")
        .expect("numeric pattern compiles")
});

/// Unit suffixes stripped from numeric cells, compared case-insensitively.
pub const UNIT_SUFFIXES: &[&str] = &[
    "t", "kg", "g", "tco2e", "tco2", "tco₂e", "kgco2e", "kgco2", "kgco₂e", "co2e", "co2", "co₂e", "%", "％", "吨",
    "千克", "公斤", "kwh", "mwh", "gj", "m3", "m³", "nm3", "nm³",
];

/// Raw content of a single cell as produced by a loader
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    /// Blank cell
    #[default]
    Empty,
    /// Numeric cell
    Number(f64),
    /// Text cell (untrimmed)
    Text(String),
}

impl RawValue {
    /// Create a text cell
    #[inline]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Whether the cell holds nothing but whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// Text used when matching labels against this cell
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<CellValue> for RawValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Number(n) => Self::Number(n),
            CellValue::Text(s) => Self::Text(s),
        }
    }
}

/// Normalized cell content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Finite number
    Number(f64),
    /// Trimmed, non-empty text
    Text(String),
}

impl CellValue {
    /// Numeric view, if this is a number
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text view, if this is text
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }

    /// Whether this value is numeric
    #[inline]
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Render a number without a trailing `.0` for integral values
#[must_use]
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// Coerce a raw cell into its canonical form
///
/// Returns a number when the trimmed text parses as an integer or decimal
/// (thousands separators and one trailing unit suffix are ignored), the
/// trimmed text when it does not, and `None` for blank or non-finite cells.
/// Pure and idempotent.
#[must_use]
pub fn normalize(raw: &RawValue) -> Option<CellValue> {
    match raw {
        RawValue::Empty => None,
        RawValue::Number(n) => n.is_finite().then_some(CellValue::Number(*n)),
        RawValue::Text(s) => normalize_str(s),
    }
}

/// String form of [`normalize`]
#[must_use]
pub fn normalize_str(raw: &str) -> Option<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(parse_number(trimmed).map_or_else(|| CellValue::Text(trimmed.to_string()), CellValue::Number))
}

/// Parse a trimmed string as a number with optional separators and unit
#[must_use]
pub fn parse_number(trimmed: &str) -> Option<f64> {
    let caps = NUMERIC.captures(trimmed)?;
    let suffix = caps.get(2).map_or("", |m| m.as_str());
    if !is_unit_suffix(suffix) {
        return None;
    }
    let digits: String = caps[1].chars().filter(|c| *c != ',').collect();
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_unit_suffix(suffix: &str) -> bool {
    suffix.is_empty() || UNIT_SUFFIXES.iter().any(|unit| unit.eq_ignore_ascii_case(suffix))
}
