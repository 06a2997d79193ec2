//! Section parser for delimited exports
//!
//! Inventory CSVs stack several tables in one file, each introduced by a
//! title row such as `范围一直接排放源`. Section boundaries are found by
//! content, never by row number.
//!
//! # Marker attribution
//!
//! Marker definitions can overlap (one marker's text may contain another's
//! terms), so a row is attributed explicitly:
//!
//! 1. Candidates are markers whose required substrings all appear in the
//!    row's first non-empty cell and whose excluded terms do not.
//! 2. A candidate is dropped when the row contains the defining term of
//!    another marker and that term does not occur inside the candidate's own
//!    required substrings.
//! 3. One survivor wins. Several survivors: the most specific definition
//!    (longest combined required text) wins, then the earliest defining term
//!    in the row, then declaration order. No survivor although candidates
//!    existed: the candidate whose defining term appears earliest in the row.
//!
//! Only the first row attributed to a marker starts its section.

use crate::delimited::{first_non_empty, DelimitedDocument};
use crate::encoding::{decode_with_fallback, describe_order, TextEncoding};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One data row inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// First column (category)
    pub category: String,
    /// Second column; never empty, never equal to `category`
    pub detail: String,
    /// Third column, empty when missing
    pub note: String,
}

impl Record {
    /// Create a record
    pub fn new(category: impl Into<String>, detail: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            detail: detail.into(),
            note: note.into(),
        }
    }
}

/// Named predicate identifying a section title row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionMarker {
    /// Section name
    pub name: String,
    /// Substrings that must all appear
    pub required: Vec<String>,
    /// Term identifying this marker to others; defaults to the first required substring
    #[serde(default)]
    pub defining_term: Option<String>,
    /// Substrings that disqualify a row
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Records whose category contains any of these are dropped
    #[serde(default)]
    pub skip_categories: Vec<String>,
}

impl SectionMarker {
    /// Marker requiring every substring in `required`
    pub fn new<S: Into<String>>(name: impl Into<String>, required: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            required: required.into_iter().map(Into::into).collect(),
            defining_term: None,
            excluded: Vec::new(),
            skip_categories: Vec::new(),
        }
    }

    /// With explicit defining term
    #[must_use]
    pub fn with_defining_term(mut self, term: impl Into<String>) -> Self {
        self.defining_term = Some(term.into());
        self
    }

    /// With disqualifying substrings
    #[must_use]
    pub fn with_excluded<S: Into<String>>(mut self, terms: impl IntoIterator<Item = S>) -> Self {
        self.excluded = terms.into_iter().map(Into::into).collect();
        self
    }

    /// With record categories to drop
    #[must_use]
    pub fn with_skip_categories<S: Into<String>>(mut self, terms: impl IntoIterator<Item = S>) -> Self {
        self.skip_categories = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Term other markers use to recognise this one
    #[must_use]
    pub fn term(&self) -> Option<&str> {
        self.defining_term
            .as_deref()
            .or_else(|| self.required.first().map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    fn is_satisfied_by(&self, text: &str) -> bool {
        !self.required.is_empty()
            && self.required.iter().all(|r| text.contains(r.as_str()))
            && !self.excluded.iter().any(|e| text.contains(e.as_str()))
    }

    fn definition_mentions(&self, term: &str) -> bool {
        self.required.iter().any(|r| r.contains(term))
    }

    fn specificity(&self) -> usize {
        self.required.iter().map(String::len).sum()
    }

    fn term_position(&self, text: &str) -> usize {
        self.term().and_then(|t| text.find(t)).unwrap_or(usize::MAX)
    }

    fn skips_category(&self, category: &str) -> bool {
        self.skip_categories.iter().any(|s| category.contains(s.as_str()))
    }
}

/// Parsed sections: every marker name maps to its records (possibly none)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Sections {
    starts: IndexMap<String, usize>,
    records: IndexMap<String, Vec<Record>>,
}

impl Sections {
    /// Empty result with one entry per marker
    #[must_use]
    pub fn empty(markers: &[SectionMarker]) -> Self {
        Self {
            starts: IndexMap::new(),
            records: markers.iter().map(|m| (m.name.clone(), Vec::new())).collect(),
        }
    }

    /// Records of a section; empty when the marker was not found
    #[must_use]
    pub fn get(&self, name: &str) -> &[Record] {
        self.records.get(name).map_or(&[], Vec::as_slice)
    }

    /// 0-based row of a section's marker
    #[must_use]
    pub fn start_row(&self, name: &str) -> Option<usize> {
        self.starts.get(name).copied()
    }

    /// Section names and records in marker declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.records.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Consume into the name → records map
    #[must_use]
    pub fn into_records(self) -> IndexMap<String, Vec<Record>> {
        self.records
    }

    /// Total records across sections
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }
}

/// Section parser configuration and entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionParser {
    /// Markers in declaration order
    pub markers: Vec<SectionMarker>,
    /// Rows from the marker to the first data row (marker + header row)
    #[serde(default = "default_header_offset")]
    pub header_offset: usize,
    /// Literal header text in the detail column
    #[serde(default)]
    pub header_label: Option<String>,
    /// Encoding probe order for [`SectionParser::parse_bytes`]
    #[serde(default = "default_encodings")]
    pub encodings: Vec<TextEncoding>,
    /// Field separator for [`SectionParser::parse_bytes`]
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
}

fn default_header_offset() -> usize {
    2
}

fn default_encodings() -> Vec<TextEncoding> {
    TextEncoding::DEFAULT_ORDER.to_vec()
}

fn default_delimiter() -> u8 {
    b','
}

impl SectionParser {
    /// Parser for the given markers with default layout
    #[must_use]
    pub fn new(markers: Vec<SectionMarker>) -> Self {
        Self {
            markers,
            header_offset: default_header_offset(),
            header_label: None,
            encodings: default_encodings(),
            delimiter: default_delimiter(),
        }
    }

    /// With header literal
    #[must_use]
    pub fn with_header_label(mut self, label: impl Into<String>) -> Self {
        self.header_label = Some(label.into());
        self
    }

    /// With rows between marker and first record
    #[must_use]
    pub fn with_header_offset(mut self, offset: usize) -> Self {
        self.header_offset = offset;
        self
    }

    /// With encoding probe order
    #[must_use]
    pub fn with_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }

    /// Index of the marker a title text belongs to, if any
    #[must_use]
    pub fn attribute_row(&self, text: &str) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.markers.len())
            .filter(|i| self.markers[*i].is_satisfied_by(text))
            .collect();
        if candidates.is_empty() {
            return None;
        }

        let survivors: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&b| !self.claimed_elsewhere(b, text))
            .collect();

        let earliest_term = |&i: &usize| (self.markers[i].term_position(text), i);
        match survivors.as_slice() {
            [only] => Some(*only),
            [] => candidates.iter().copied().min_by_key(|i| earliest_term(i)),
            many => many
                .iter()
                .min_by_key(|&&i| {
                    let (pos, order) = earliest_term(&i);
                    (std::cmp::Reverse(self.markers[i].specificity()), pos, order)
                })
                .copied(),
        }
    }

    /// Whether another marker's defining term in `text` disqualifies `b`
    fn claimed_elsewhere(&self, b: usize, text: &str) -> bool {
        let candidate = &self.markers[b];
        self.markers
            .iter()
            .enumerate()
            .filter(|(a, _)| *a != b)
            .filter_map(|(_, other)| other.term())
            .any(|term| text.contains(term) && !candidate.definition_mentions(term))
    }

    /// Split a document into sections
    #[must_use]
    pub fn parse(&self, doc: &DelimitedDocument) -> Sections {
        let mut sections = Sections::empty(&self.markers);
        let mut starts: Vec<Option<usize>> = vec![None; self.markers.len()];
        let mut marker_rows = HashSet::new();

        for (row, fields) in doc.rows().iter().enumerate() {
            let Some(text) = first_non_empty(fields) else {
                continue;
            };
            let Some(m) = self.attribute_row(text) else {
                continue;
            };
            marker_rows.insert(row);
            if starts[m].is_none() {
                tracing::debug!(section = %self.markers[m].name, row = row + 1, "section marker found");
                starts[m] = Some(row);
            } else {
                tracing::debug!(section = %self.markers[m].name, row = row + 1, "repeated marker ignored");
            }
        }

        let mut ordered: Vec<(usize, usize)> = starts
            .iter()
            .enumerate()
            .filter_map(|(m, start)| start.map(|row| (row, m)))
            .collect();
        ordered.sort_unstable();

        for (k, &(start, m)) in ordered.iter().enumerate() {
            let end = ordered.get(k + 1).map_or(doc.len(), |&(next, _)| next);
            let marker = &self.markers[m];
            let records: Vec<Record> = (start.saturating_add(self.header_offset)..end)
                .filter(|row| !marker_rows.contains(row))
                .filter_map(|row| self.record_at(doc, row, marker))
                .collect();
            tracing::debug!(section = %marker.name, records = records.len(), "section parsed");
            sections.starts.insert(marker.name.clone(), start);
            sections.records.insert(marker.name.clone(), records);
        }

        for marker in &self.markers {
            if !sections.starts.contains_key(&marker.name) {
                tracing::warn!(section = %marker.name, "section marker not found");
            }
        }
        sections
    }

    /// Decode with the configured encodings, then parse
    ///
    /// Undecodable or malformed input yields empty sections and a logged
    /// error.
    #[must_use]
    pub fn parse_bytes(&self, bytes: &[u8]) -> Sections {
        let Some((text, encoding)) = decode_with_fallback(bytes, &self.encodings) else {
            tracing::error!(tried = %describe_order(&self.encodings), "no encoding could decode section source");
            return Sections::empty(&self.markers);
        };
        match DelimitedDocument::from_text(&text, self.delimiter) {
            Ok(doc) => {
                tracing::debug!(%encoding, rows = doc.len(), "section source decoded");
                self.parse(&doc)
            }
            Err(e) => {
                tracing::error!("section source unreadable: {e}");
                Sections::empty(&self.markers)
            }
        }
    }

    fn record_at(&self, doc: &DelimitedDocument, row: usize, marker: &SectionMarker) -> Option<Record> {
        let category = doc.field(row, 0);
        let detail = doc.field(row, 1);
        if detail.is_empty() || detail == category {
            return None;
        }
        if self.header_label.as_deref() == Some(detail) {
            return None;
        }
        if marker.skips_category(category) {
            return None;
        }
        Some(Record::new(category, detail, doc.field(row, 2)))
    }
}
