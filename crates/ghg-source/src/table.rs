//! Header-keyed table extraction
//!
//! Reads a block of rows under a header row into ordered maps keyed by the
//! header text. Works over grids and delimited documents alike.

use crate::delimited::DelimitedDocument;
use crate::grid::Grid;
use crate::value::{normalize, normalize_str, CellValue};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One table row: header → normalized value (absent cells are `None`)
pub type TableRow = IndexMap<String, Option<CellValue>>;

/// Row-addressable document
pub trait RowSource {
    /// Number of rows
    fn row_count(&self) -> usize;

    /// Normalized values of a 0-based row
    fn row_values(&self, row: usize) -> Vec<Option<CellValue>>;
}

impl RowSource for Grid {
    fn row_count(&self) -> usize {
        self.height()
    }

    fn row_values(&self, row: usize) -> Vec<Option<CellValue>> {
        self.row(row + 1).iter().map(normalize).collect()
    }
}

impl RowSource for DelimitedDocument {
    fn row_count(&self) -> usize {
        self.len()
    }

    fn row_values(&self, row: usize) -> Vec<Option<CellValue>> {
        self.rows()
            .get(row)
            .map(|fields| fields.iter().map(|f| normalize_str(f)).collect())
            .unwrap_or_default()
    }
}

/// Table layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    /// 0-based header row
    #[serde(default)]
    pub header_row: usize,
    /// First data row; defaults to the row after the header
    #[serde(default)]
    pub start_row: Option<usize>,
    /// Exclusive end row; defaults to the end of the document
    #[serde(default)]
    pub end_row: Option<usize>,
    /// Drop rows with no values
    #[serde(default = "yes")]
    pub skip_empty_rows: bool,
    /// Collapse whitespace (including line breaks) inside header text
    #[serde(default = "yes")]
    pub clean_headers: bool,
}

fn yes() -> bool {
    true
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            header_row: 0,
            start_row: None,
            end_row: None,
            skip_empty_rows: true,
            clean_headers: true,
        }
    }
}

impl TableOptions {
    /// With header row
    #[must_use]
    pub fn with_header_row(mut self, row: usize) -> Self {
        self.header_row = row;
        self
    }

    /// With data row range
    #[must_use]
    pub fn with_rows(mut self, start: usize, end: Option<usize>) -> Self {
        self.start_row = Some(start);
        self.end_row = end;
        self
    }
}

/// Read rows under a header into header-keyed maps
///
/// Blank header cells become `column_{n}` (1-based). Duplicate header texts
/// keep the first column.
pub fn read_table<S: RowSource + ?Sized>(source: &S, options: &TableOptions) -> Vec<TableRow> {
    if options.header_row >= source.row_count() {
        tracing::warn!(header_row = options.header_row, "table header row beyond document");
        return Vec::new();
    }

    let headers: Vec<String> = source
        .row_values(options.header_row)
        .into_iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Some(v) => {
                let text = v.to_string();
                if options.clean_headers {
                    text.split_whitespace().collect::<Vec<_>>().join(" ")
                } else {
                    text
                }
            }
            None => format!("column_{}", i + 1),
        })
        .collect();

    let start = options.start_row.unwrap_or(options.header_row + 1);
    let end = options
        .end_row
        .map_or(source.row_count(), |e| e.min(source.row_count()));

    let mut rows = Vec::new();
    for row in start..end {
        let values = source.row_values(row);
        if options.skip_empty_rows && values.iter().all(Option::is_none) {
            continue;
        }
        let mut map = TableRow::new();
        for (i, header) in headers.iter().enumerate() {
            map.entry(header.clone())
                .or_insert_with(|| values.get(i).cloned().flatten());
        }
        rows.push(map);
    }
    tracing::debug!(rows = rows.len(), columns = headers.len(), "table read");
    rows
}
