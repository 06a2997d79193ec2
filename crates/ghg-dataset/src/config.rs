//! Assembler configuration
//!
//! Declares which fields a dataset has and where each comes from. All
//! structs deserialize from TOML/JSON so a report layout can live in a file;
//! the `with_*` builders cover programmatic use.

use crate::field::FieldValue;
use ghg_source::{Direction, Document, LabelQuery, SectionParser, TableOptions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Derived totals must match sourced ones within this absolute difference
pub const DEFAULT_TOLERANCE: f64 = 0.01;

fn one() -> usize {
    1
}

fn three() -> usize {
    3
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// Chooses documents from a source set
///
/// An empty selector matches every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSelector {
    /// Document id must contain this text
    #[serde(default)]
    pub id_contains: Option<String>,
    /// Workbook sheet names accepted, in preference order
    #[serde(default)]
    pub sheets: Vec<String>,
}

impl DocumentSelector {
    /// Selector for named sheets
    pub fn sheets<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            id_contains: None,
            sheets: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a document is selected
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        let id_ok = self
            .id_contains
            .as_deref()
            .map_or(true, |needle| doc.id().to_string().contains(needle));
        let sheet_ok = self.sheets.is_empty()
            || doc
                .id()
                .sheet_name()
                .is_some_and(|sheet| self.sheets.iter().any(|s| s == sheet));
        id_ok && sheet_ok
    }

    /// Rank for ordering: position of the document's sheet in `sheets`
    pub(crate) fn rank(&self, doc: &Document) -> usize {
        doc.id()
            .sheet_name()
            .and_then(|sheet| self.sheets.iter().position(|s| s == sheet))
            .unwrap_or(0)
    }
}

/// Expected shape of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Keep whatever the source yields
    #[default]
    Any,
    /// Only numeric values are accepted
    Number,
    /// Numbers are rendered to text
    Text,
}

/// How several pattern matches become one value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combine {
    /// First match
    #[default]
    First,
    /// Sum of numeric matches
    Sum,
}

/// One place a field value may be read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "from", rename_all = "snake_case")]
pub enum FieldSource {
    /// Value adjacent to a label in a grid
    Locate {
        /// Documents searched
        #[serde(default)]
        select: DocumentSelector,
        /// Label query
        query: LabelQuery,
    },
    /// `parameter,value` row of a delimited document
    KeyValue {
        /// Documents searched
        #[serde(default)]
        select: DocumentSelector,
        /// Parameter name in the first column
        key: String,
        /// Header rows to skip
        #[serde(default = "one")]
        skip_rows: usize,
    },
    /// Regex label search collecting several values
    Pattern {
        /// Documents searched
        #[serde(default)]
        select: DocumentSelector,
        /// Case-insensitive label patterns
        patterns: Vec<String>,
        /// Value direction
        #[serde(default)]
        direction: Direction,
        /// Furthest cell inspected
        #[serde(default = "three")]
        max_distance: usize,
        /// Only numeric values
        #[serde(default)]
        numeric_only: bool,
        /// Combination of matches
        #[serde(default)]
        combine: Combine,
    },
}

impl FieldSource {
    /// Label lookup in any grid
    #[must_use]
    pub fn locate(query: LabelQuery) -> Self {
        Self::Locate {
            select: DocumentSelector::default(),
            query,
        }
    }

    /// Label lookup in named sheets
    pub fn locate_in<S: Into<String>>(sheets: impl IntoIterator<Item = S>, query: LabelQuery) -> Self {
        Self::Locate {
            select: DocumentSelector::sheets(sheets),
            query,
        }
    }

    /// Parameter lookup in any delimited document
    pub fn key_value(key: impl Into<String>) -> Self {
        Self::KeyValue {
            select: DocumentSelector::default(),
            key: key.into(),
            skip_rows: 1,
        }
    }

    pub(crate) fn selector(&self) -> &DocumentSelector {
        match self {
            Self::Locate { select, .. } | Self::KeyValue { select, .. } | Self::Pattern { select, .. } => select,
        }
    }
}

/// One dataset field resolved from sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Expected shape
    #[serde(default)]
    pub kind: FieldKind,
    /// Sources in preference order
    pub sources: Vec<FieldSource>,
}

impl FieldSpec {
    /// Field with no sources yet
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sources: Vec::new(),
        }
    }

    /// With an additional source
    #[must_use]
    pub fn with_source(mut self, source: FieldSource) -> Self {
        self.sources.push(source);
        self
    }
}

/// Bulk import of `parameter,value` rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValueImport {
    /// Documents imported
    #[serde(default)]
    pub select: DocumentSelector,
    /// Header rows to skip
    #[serde(default = "one")]
    pub skip_rows: usize,
    /// Only keys matching this regex are imported
    #[serde(default)]
    pub key_pattern: Option<String>,
}

impl Default for KeyValueImport {
    fn default() -> Self {
        Self {
            select: DocumentSelector::default(),
            skip_rows: 1,
            key_pattern: None,
        }
    }
}

/// Regex capture from another field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractSpec {
    /// Field populated
    pub field: String,
    /// Field read
    pub from: String,
    /// Regex applied to the text of `from`
    pub pattern: String,
    /// Capture group used
    #[serde(default = "one")]
    pub group: usize,
    /// Shape of the result
    #[serde(default)]
    pub kind: FieldKind,
}

/// Total derived from constituent fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    /// Total field
    pub field: String,
    /// Constituent fields
    pub constituents: Vec<String>,
    /// Field used when the sum cannot be formed
    #[serde(default)]
    pub source_field: Option<String>,
    /// Sum whatever constituents are present (at least one)
    #[serde(default)]
    pub allow_partial: bool,
}

impl AggregateSpec {
    /// Sum of all constituents
    pub fn sum<S: Into<String>>(field: impl Into<String>, constituents: impl IntoIterator<Item = S>) -> Self {
        Self {
            field: field.into(),
            constituents: constituents.into_iter().map(Into::into).collect(),
            source_field: None,
            allow_partial: false,
        }
    }

    /// Sum whatever constituents are present
    #[must_use]
    pub fn partial(mut self) -> Self {
        self.allow_partial = true;
        self
    }

    /// Fall back to another field
    #[must_use]
    pub fn or_field(mut self, field: impl Into<String>) -> Self {
        self.source_field = Some(field.into());
        self
    }
}

/// Record row built from a numeric field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    /// Category text of the row
    pub label: String,
    /// Numeric field shown as the detail
    pub field: String,
    /// Note text
    #[serde(default)]
    pub note: String,
}

impl SummaryRow {
    /// Create a summary row
    pub fn new(label: impl Into<String>, field: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            note: note.into(),
        }
    }
}

/// Dataset field holding one section's records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordListSpec {
    /// Field populated
    pub field: String,
    /// Section name
    pub section: String,
    /// Rows placed before the parsed records; absent or zero fields are skipped
    #[serde(default)]
    pub summary_rows: Vec<SummaryRow>,
}

/// Section parsing of delimited documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionsSpec {
    /// Documents parsed; the first selected document with any section wins
    #[serde(default)]
    pub select: DocumentSelector,
    /// Parser
    pub parser: SectionParser,
    /// Fields produced
    pub lists: Vec<RecordListSpec>,
}

/// Header-keyed table read into a field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Field populated
    pub field: String,
    /// Documents read; the first selected one is used
    #[serde(default)]
    pub select: DocumentSelector,
    /// Layout
    #[serde(default)]
    pub options: TableOptions,
}

/// Copy of a populated field under another name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    /// Field copied
    pub from: String,
    /// New name
    pub to: String,
}

/// Complete assembler configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    /// Bulk parameter import, if any
    #[serde(default)]
    pub key_values: Option<KeyValueImport>,
    /// Individually resolved fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Regex extractions
    #[serde(default)]
    pub extracts: Vec<ExtractSpec>,
    /// Totals
    #[serde(default)]
    pub aggregates: Vec<AggregateSpec>,
    /// Section record lists
    #[serde(default)]
    pub sections: Vec<SectionsSpec>,
    /// Tables
    #[serde(default)]
    pub tables: Vec<TableSpec>,
    /// Aliases
    #[serde(default)]
    pub aliases: Vec<AliasSpec>,
    /// Defaults for fields still absent
    #[serde(default)]
    pub defaults: IndexMap<String, FieldValue>,
    /// Aggregate consistency tolerance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            key_values: None,
            fields: Vec::new(),
            extracts: Vec::new(),
            aggregates: Vec::new(),
            sections: Vec::new(),
            tables: Vec::new(),
            aliases: Vec::new(),
            defaults: IndexMap::new(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl AssemblerConfig {
    /// Empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With bulk parameter import
    #[must_use]
    pub fn with_key_values(mut self, import: KeyValueImport) -> Self {
        self.key_values = Some(import);
        self
    }

    /// With field
    #[must_use]
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// With extraction
    #[must_use]
    pub fn with_extract(mut self, extract: ExtractSpec) -> Self {
        self.extracts.push(extract);
        self
    }

    /// With aggregate
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: AggregateSpec) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    /// With section parsing
    #[must_use]
    pub fn with_sections(mut self, sections: SectionsSpec) -> Self {
        self.sections.push(sections);
        self
    }

    /// With table
    #[must_use]
    pub fn with_table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    /// With alias
    #[must_use]
    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.aliases.push(AliasSpec {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    /// With default value
    #[must_use]
    pub fn with_default(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.defaults.insert(field.into(), value.into());
        self
    }

    /// With tolerance
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}
