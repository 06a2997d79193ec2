//! File loaders
//!
//! Turns paths into [`Document`]s:
//! - workbooks (`xlsx`, `xlsm`, `xls`, `xlsb`, `ods`): one grid per sheet
//! - delimited text (`csv`, `tsv`, `txt`): encoding probed, one document
//!
//! Sheet cells keep their spreadsheet coordinates even when the used range
//! does not start at `A1`.

use crate::delimited::DelimitedDocument;
use crate::document::{Document, DocumentId, SourceRole};
use crate::encoding::TextEncoding;
use crate::error::SourceError;
use crate::grid::Grid;
use crate::value::RawValue;
use calamine::{open_workbook_from_rs, Data, Ods, Range, Reader, Xls, Xlsb, Xlsx};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::io::Cursor;
use std::path::Path;

/// Loader settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Field separator for `txt` files (`csv` and `tsv` imply theirs)
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
    /// Encoding probe order for delimited text
    #[serde(default = "default_encodings")]
    pub encodings: Vec<TextEncoding>,
}

fn default_delimiter() -> u8 {
    b','
}

fn default_encodings() -> Vec<TextEncoding> {
    TextEncoding::DEFAULT_ORDER.to_vec()
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            encodings: default_encodings(),
        }
    }
}

impl LoadOptions {
    /// With encoding probe order
    #[must_use]
    pub fn with_encodings(mut self, encodings: Vec<TextEncoding>) -> Self {
        self.encodings = encodings;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Xlsx,
    Xls,
    Xlsb,
    Ods,
    Delimited(u8),
}

fn file_kind(path: &Path, options: &LoadOptions) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "xlsx" | "xlsm" => Some(FileKind::Xlsx),
        "xls" => Some(FileKind::Xls),
        "xlsb" => Some(FileKind::Xlsb),
        "ods" => Some(FileKind::Ods),
        "csv" => Some(FileKind::Delimited(b',')),
        "tsv" => Some(FileKind::Delimited(b'\t')),
        "txt" => Some(FileKind::Delimited(options.delimiter)),
        _ => None,
    }
}

/// Load a file into one or more documents
///
/// # Errors
/// - `SourceError::UnsupportedKind` for unknown extensions
/// - `SourceError::Io` when the file cannot be read
/// - `SourceError::Workbook` / `Undecodable` / `Delimited` when parsing fails
pub fn load_path(path: &Path, role: SourceRole, options: &LoadOptions) -> Result<Vec<Document>, SourceError> {
    let kind = file_kind(path, options).ok_or_else(|| SourceError::UnsupportedKind {
        path: path.to_path_buf(),
    })?;
    let bytes = std::fs::read(path).map_err(|e| SourceError::io_error(path, e))?;

    let documents = match kind {
        FileKind::Xlsx => {
            let mut workbook: Xlsx<_> = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes.clone()))
                .map_err(|e| SourceError::workbook(path, e.to_string()))?;
            read_sheets(path, &mut workbook)
        }
        FileKind::Xls => {
            let mut workbook: Xls<_> = open_workbook_from_rs::<Xls<_>, _>(Cursor::new(bytes.clone()))
                .map_err(|e| SourceError::workbook(path, e.to_string()))?;
            read_sheets(path, &mut workbook)
        }
        FileKind::Xlsb => {
            let mut workbook: Xlsb<_> = open_workbook_from_rs::<Xlsb<_>, _>(Cursor::new(bytes.clone()))
                .map_err(|e| SourceError::workbook(path, e.to_string()))?;
            read_sheets(path, &mut workbook)
        }
        FileKind::Ods => {
            let mut workbook: Ods<_> = open_workbook_from_rs::<Ods<_>, _>(Cursor::new(bytes.clone()))
                .map_err(|e| SourceError::workbook(path, e.to_string()))?;
            read_sheets(path, &mut workbook)
        }
        FileKind::Delimited(delimiter) => {
            let doc = DelimitedDocument::from_bytes(path, &bytes, &options.encodings, delimiter)?;
            vec![Document::delimited(DocumentId::path(path), doc)]
        }
    };

    tracing::info!(path = %path.display(), documents = documents.len(), ?role, "source loaded");
    Ok(documents
        .into_iter()
        .map(|d| d.with_role(role).with_checksum_of(&bytes))
        .collect())
}

/// One grid document per readable sheet; unreadable sheets are logged and skipped
fn read_sheets<W>(path: &Path, workbook: &mut W) -> Vec<Document>
where
    W: Reader<Cursor<Vec<u8>>>,
    W::Error: Display,
{
    let sheet_names: Vec<String> = workbook.sheet_names().iter().map(ToString::to_string).collect();
    let mut documents = Vec::with_capacity(sheet_names.len());
    for sheet in sheet_names {
        match workbook.worksheet_range(&sheet) {
            Ok(range) => {
                let grid = grid_from_range(&range);
                tracing::debug!(sheet = %sheet, rows = grid.height(), cols = grid.width(), "sheet read");
                documents.push(Document::grid(DocumentId::sheet(path, &sheet), grid));
            }
            Err(e) => tracing::warn!(path = %path.display(), sheet = %sheet, "sheet unreadable: {e}"),
        }
    }
    documents
}

/// Grid with cells at their absolute sheet positions
#[must_use]
pub fn grid_from_range(range: &Range<Data>) -> Grid {
    let Some((row0, col0)) = range.start() else {
        return Grid::default();
    };
    let pad = col0 as usize;
    let mut rows: Vec<Vec<RawValue>> = vec![Vec::new(); row0 as usize];
    for row in range.rows() {
        let mut cells = vec![RawValue::Empty; pad];
        cells.extend(row.iter().map(raw_from_data));
        rows.push(cells);
    }
    Grid::new(rows)
}

/// Convert a workbook cell
#[must_use]
pub fn raw_from_data(cell: &Data) -> RawValue {
    match cell {
        Data::Empty | Data::Error(_) => RawValue::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::from(s.as_str()),
        Data::Float(f) => RawValue::Number(*f),
        #[allow(clippy::cast_precision_loss)]
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Bool(b) => RawValue::text(b.to_string()),
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
    }
}
