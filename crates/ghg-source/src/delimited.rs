//! Delimited text documents
//!
//! An ordered sequence of rows split into fields. Rows keep their original
//! order; fully blank lines are dropped by the reader, rows may be ragged.

use crate::encoding::{decode_with_fallback, describe_order, TextEncoding};
use crate::error::SourceError;
use std::path::Path;

/// Parsed delimited document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelimitedDocument {
    rows: Vec<Vec<String>>,
    encoding: Option<TextEncoding>,
}

impl DelimitedDocument {
    /// Build from already-split rows
    #[must_use]
    pub fn from_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
            encoding: None,
        }
    }

    /// Parse decoded text
    ///
    /// # Errors
    /// Returns `SourceError::Delimited` for malformed quoting
    pub fn from_text(text: &str, delimiter: u8) -> Result<Self, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }
        Ok(Self {
            rows,
            encoding: None,
        })
    }

    /// Probe encodings, then parse
    ///
    /// # Errors
    /// - `SourceError::Undecodable` when no candidate encoding succeeds
    /// - `SourceError::Delimited` for malformed quoting
    pub fn from_bytes(
        path: &Path,
        bytes: &[u8],
        encodings: &[TextEncoding],
        delimiter: u8,
    ) -> Result<Self, SourceError> {
        let (text, encoding) =
            decode_with_fallback(bytes, encodings).ok_or_else(|| SourceError::Undecodable {
                path: path.to_path_buf(),
                tried: describe_order(encodings),
            })?;
        tracing::debug!(path = %path.display(), %encoding, "decoded delimited source");
        let mut doc = Self::from_text(&text, delimiter)?;
        doc.encoding = Some(encoding);
        Ok(doc)
    }

    /// All rows in order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the document has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encoding the document was decoded with, if it came from bytes
    #[inline]
    #[must_use]
    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    /// Trimmed field of a 0-based row; empty when missing
    #[must_use]
    pub fn field(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map_or("", |s| s.trim())
    }

    /// `parameter,value` pairs: first column as key, second as value
    ///
    /// Rows with an empty key are skipped; the first `skip` rows are headers.
    #[must_use]
    pub fn key_values(&self, skip: usize) -> Vec<(String, String)> {
        self.rows
            .iter()
            .enumerate()
            .skip(skip)
            .filter_map(|(i, _)| {
                let key = self.field(i, 0);
                (!key.is_empty()).then(|| (key.to_string(), self.field(i, 1).to_string()))
            })
            .collect()
    }

    /// Value of the first row whose key equals `key`
    #[must_use]
    pub fn lookup(&self, key: &str, skip: usize) -> Option<&str> {
        (skip..self.rows.len())
            .find(|i| self.field(*i, 0) == key.trim())
            .map(|i| self.field(i, 1))
    }
}

/// First non-empty trimmed field of a row
#[must_use]
pub fn first_non_empty(row: &[String]) -> Option<&str> {
    row.iter().map(|s| s.trim()).find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_ragged_rows() {
        let doc = DelimitedDocument::from_text("a,b,c\n\"x, y\",z\n\nlast\n", b',').unwrap();
        assert_eq!(doc.rows()[1], vec!["x, y".to_string(), "z".to_string()]);
        assert_eq!(doc.field(2, 0), "last");
        assert_eq!(doc.field(9, 9), "");
    }

    #[test]
    fn key_value_rows() {
        let doc = DelimitedDocument::from_text(
            "参数,值\nscope_1_emissions, 1200.5\n,orphan\ncompany_name,Acme\n",
            b',',
        )
        .unwrap();
        assert_eq!(
            doc.key_values(1),
            vec![
                ("scope_1_emissions".to_string(), "1200.5".to_string()),
                ("company_name".to_string(), "Acme".to_string()),
            ]
        );
        assert_eq!(doc.lookup("company_name", 1), Some("Acme"));
        assert_eq!(doc.lookup("参数", 1), None);
    }

    #[test]
    fn tab_delimiter() {
        let doc = DelimitedDocument::from_text("k\tv\n", b'\t').unwrap();
        assert_eq!(doc.field(0, 1), "v");
    }

    #[test]
    fn undecodable_bytes_report_candidates() {
        let err = DelimitedDocument::from_bytes(
            Path::new("broken.csv"),
            &[0xFF, 0xFE],
            &[TextEncoding::Utf8],
            b',',
        )
        .unwrap_err();
        assert!(err.to_string().contains("utf-8"));
    }

    #[test]
    fn first_non_empty_skips_blank_cells() {
        let row = vec![" ".to_string(), "范围一".to_string()];
        assert_eq!(first_non_empty(&row), Some("范围一"));
        assert_eq!(first_non_empty(&[]), None);
    }
}
