//! Dataset and its write-once builder
//!
//! A [`Dataset`] is the ordered mapping from field name to value handed to
//! the narrative and template stages. It is only produced by
//! [`DatasetBuilder::build`]; there is no way to change it afterwards.
//!
//! # Invariants
//!
//! - numeric fields are finite
//! - a populated field is never overwritten

use crate::error::DatasetError;
use crate::field::{format_quantity, FieldValue};
use crate::provenance::{Provenance, ProvenanceMap};
use ghg_source::Record;
use indexmap::IndexMap;
use serde::Serialize;

/// Immutable field map
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    fields: IndexMap<String, FieldValue>,
}

impl Dataset {
    /// Build from pairs, rejecting duplicates and non-finite numbers
    ///
    /// # Errors
    /// Returns the first `DatasetError` raised by the builder
    pub fn try_from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, DatasetError>
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut builder = DatasetBuilder::new();
        for (k, v) in pairs {
            builder.set(k, v.into(), Provenance::Default)?;
        }
        Ok(builder.build().0)
    }

    /// Build from pairs; rejected pairs are logged and dropped
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut builder = DatasetBuilder::new();
        for (k, v) in pairs {
            if let Err(e) = builder.set(k, v.into(), Provenance::Default) {
                tracing::warn!("pair dropped: {e}");
            }
        }
        builder.build().0
    }

    /// Value of a field
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Whether a field is present
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Numeric field
    #[must_use]
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_number)
    }

    /// Text field
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_text)
    }

    /// Records field
    #[must_use]
    pub fn records(&self, name: &str) -> Option<&[Record]> {
        self.get(name).and_then(FieldValue::as_records)
    }

    /// Fields in population order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the dataset is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Formatted scalar view for template rendering
    ///
    /// Numbers named in `quantities` are rendered with [`format_quantity`],
    /// other numbers and text as-is. Records and tables are left out. The
    /// dataset itself is untouched.
    #[must_use]
    pub fn render_view(&self, quantities: &[&str]) -> IndexMap<String, String> {
        self.fields
            .iter()
            .filter_map(|(name, value)| {
                let text = match value {
                    FieldValue::Number(n) if quantities.contains(&name.as_str()) => format_quantity(*n),
                    other => other.scalar_text()?,
                };
                Some((name.clone(), text))
            })
            .collect()
    }

    /// JSON object of all fields
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Write-once dataset builder
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    fields: IndexMap<String, FieldValue>,
    provenance: ProvenanceMap,
}

impl DatasetBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate a field
    ///
    /// # Errors
    /// - `DatasetError::AlreadySet` when the field holds a value
    /// - `DatasetError::NonFinite` for NaN or infinite numbers
    pub fn set(
        &mut self,
        name: impl Into<String>,
        value: FieldValue,
        provenance: Provenance,
    ) -> Result<(), DatasetError> {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return Err(DatasetError::already_set(name));
        }
        if matches!(value, FieldValue::Number(n) if !n.is_finite()) {
            return Err(DatasetError::non_finite(name));
        }
        tracing::debug!(field = %name, ?provenance, "field populated");
        self.provenance.insert(name.clone(), provenance);
        self.fields.insert(name, value);
        Ok(())
    }

    /// Whether a field is populated
    #[inline]
    #[must_use]
    pub fn is_set(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Current value of a field
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Provenance of a field
    #[must_use]
    pub fn provenance_of(&self, name: &str) -> Option<&Provenance> {
        self.provenance.get(name)
    }

    /// Freeze into a dataset plus provenance
    #[must_use]
    pub fn build(self) -> (Dataset, ProvenanceMap) {
        (Dataset { fields: self.fields }, self.provenance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_write_once() {
        let mut b = DatasetBuilder::new();
        b.set("scope_1", 10.0.into(), Provenance::Default).unwrap();
        let err = b.set("scope_1", 20.0.into(), Provenance::Default).unwrap_err();
        assert_eq!(err, DatasetError::already_set("scope_1"));
        let (ds, _) = b.build();
        assert_eq!(ds.number("scope_1"), Some(10.0));
    }

    #[test]
    fn non_finite_numbers_rejected() {
        let mut b = DatasetBuilder::new();
        assert!(b.set("x", f64::NAN.into(), Provenance::Default).is_err());
        assert!(b.set("y", f64::INFINITY.into(), Provenance::Default).is_err());
        assert!(!b.is_set("x"));
    }

    #[test]
    fn pairs_reject_duplicates_and_non_finite() {
        let err = Dataset::try_from_pairs([("a", 1.0), ("a", 2.0)]).unwrap_err();
        assert_eq!(err, DatasetError::already_set("a"));
        let err = Dataset::try_from_pairs([("a", f64::NAN)]).unwrap_err();
        assert_eq!(err, DatasetError::non_finite("a"));

        let ds = Dataset::from_pairs([("a", 1.0), ("a", 2.0), ("b", f64::INFINITY)]);
        assert_eq!(ds.number("a"), Some(1.0));
        assert!(!ds.contains("b"));
    }

    #[test]
    fn render_view_formats_quantities_only() {
        let ds = Dataset::from_pairs([
            ("company_name", FieldValue::from("Acme")),
            ("scope_1", FieldValue::Number(1234.5)),
            ("report_year", FieldValue::Number(2024.0)),
            ("scope1_items", FieldValue::Records(Vec::new())),
        ]);
        let view = ds.render_view(&["scope_1"]);
        assert_eq!(view["scope_1"], "1,234.50");
        assert_eq!(view["report_year"], "2024");
        assert_eq!(view["company_name"], "Acme");
        assert!(!view.contains_key("scope1_items"));
        assert_eq!(ds.number("scope_1"), Some(1234.5));
    }

    #[test]
    fn serializes_as_flat_object() {
        let ds = Dataset::from_pairs([("a", 1.0), ("b", 2.5)]);
        assert_eq!(ds.to_json(), serde_json::json!({"a": 1.0, "b": 2.5}));
    }
}
