//! Grid documents
//!
//! A grid is one worksheet: a rectangular-ish store of raw cells addressed by
//! 1-based `(row, column)` coordinates, matching how spreadsheet users refer
//! to cells.

use crate::value::{normalize, CellValue, RawValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 1-based cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// Row number, starting at 1
    pub row: usize,
    /// Column number, starting at 1
    pub col: usize,
}

impl CellRef {
    /// Create a coordinate
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}C{}", self.row, self.col)
    }
}

/// Immutable worksheet snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<RawValue>>,
    width: usize,
}

impl Grid {
    /// Build a grid from raw rows (row 1 first)
    #[must_use]
    pub fn new(rows: Vec<Vec<RawValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        Self { rows, width }
    }

    /// Build a grid from string rows; empty strings become blank cells
    #[must_use]
    pub fn from_text_rows<R, S>(rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| RawValue::from(s.as_ref())).collect())
                .collect(),
        )
    }

    /// Number of rows
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Widest row length
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Whether the grid holds no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Raw cell at a coordinate; `None` outside the grid
    #[must_use]
    pub fn cell(&self, at: CellRef) -> Option<&RawValue> {
        if at.row == 0 || at.col == 0 {
            return None;
        }
        self.rows.get(at.row - 1)?.get(at.col - 1)
    }

    /// Normalized value at a coordinate
    #[must_use]
    pub fn value(&self, at: CellRef) -> Option<CellValue> {
        self.cell(at).and_then(normalize)
    }

    /// Raw cells of one row (1-based), padded to the grid width
    #[must_use]
    pub fn row(&self, row: usize) -> Vec<RawValue> {
        let mut cells = row
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .cloned()
            .unwrap_or_default();
        cells.resize(self.width, RawValue::Empty);
        cells
    }
}
