//! Field values and quantity formatting

use ghg_source::{format_number, CellValue, Record, TableRow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of one dataset field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Finite number
    Number(f64),
    /// Non-empty text
    Text(String),
    /// Section records
    Records(Vec<Record>),
    /// Header-keyed rows
    Table(Vec<TableRow>),
}

impl FieldValue {
    /// Numeric view
    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Records view
    #[must_use]
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Records(r) => Some(r),
            _ => None,
        }
    }

    /// Table view
    #[must_use]
    pub fn as_table(&self) -> Option<&[TableRow]> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Scalar display text; `None` for records and tables
    #[must_use]
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
            Self::Records(_) | Self::Table(_) => None,
        }
    }
}

impl From<CellValue> for FieldValue {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Number(n) => Self::Number(n),
            CellValue::Text(s) => Self::Text(s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::Text(s) => f.write_str(s),
            Self::Records(r) => write!(f, "[{} records]", r.len()),
            Self::Table(t) => write!(f, "[{} rows]", t.len()),
        }
    }
}

/// Two decimals with thousands separators, e.g. `1,234,567.89`
#[must_use]
pub fn format_quantity(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
