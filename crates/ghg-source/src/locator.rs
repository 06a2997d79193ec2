//! Label locator
//!
//! Finds a label cell in a grid and returns the value next to it. Sheet
//! layouts drift between reporting years, so the locator never relies on
//! fixed coordinates.
//!
//! # Scan order
//!
//! Candidates are visited row-major: row 1 to the last scanned row, and
//! within a row column 1 to the last column. The first matching cell in that
//! order wins. This ordering is part of the contract and is covered by tests.

use crate::error::LocateMiss;
use crate::grid::{CellRef, Grid};
use crate::value::{normalize, CellValue};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// How the query text is compared with cell text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Whole (trimmed) cell text equals the label
    Exact,
    /// Cell text contains the label
    #[default]
    Substring,
}

/// Where the value sits relative to its label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Same row, next column
    #[default]
    Right,
    /// Same row, previous column
    Left,
    /// Next row, same column
    Below,
    /// Previous row, same column
    Above,
}

impl Direction {
    /// Step `distance` cells from `from`; `None` when that leaves the sheet
    #[must_use]
    pub fn step(self, from: CellRef, distance: usize) -> Option<CellRef> {
        match self {
            Self::Right => Some(CellRef::new(from.row, from.col.checked_add(distance)?)),
            Self::Left => from
                .col
                .checked_sub(distance)
                .filter(|c| *c >= 1)
                .map(|col| CellRef::new(from.row, col)),
            Self::Below => Some(CellRef::new(from.row.checked_add(distance)?, from.col)),
            Self::Above => from
                .row
                .checked_sub(distance)
                .filter(|r| *r >= 1)
                .map(|row| CellRef::new(row, from.col)),
        }
    }
}

/// Which cells are label candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Every cell of the sheet
    #[default]
    Sheet,
    /// A single 1-based column
    Column(usize),
}

impl SearchScope {
    /// Scope from a spreadsheet column name (`"A"`, `"AB"`)
    #[must_use]
    pub fn column_letters(letters: &str) -> Option<Self> {
        column_index(letters).map(Self::Column)
    }
}

/// Convert spreadsheet column letters to a 1-based index
#[must_use]
pub fn column_index(letters: &str) -> Option<usize> {
    let letters = letters.trim();
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        let c = c.to_ascii_uppercase();
        c.is_ascii_uppercase()
            .then(|| acc.checked_mul(26)?.checked_add(c as usize - 'A' as usize + 1))
            .flatten()
    })
}

/// One locate request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelQuery {
    /// Label text to look for
    pub text: String,
    /// Comparison mode
    #[serde(default)]
    pub mode: MatchMode,
    /// Case-sensitive comparison
    #[serde(default)]
    pub case_sensitive: bool,
    /// Candidate cells
    #[serde(default)]
    pub scope: SearchScope,
    /// Value position relative to the label
    #[serde(default)]
    pub direction: Direction,
    /// Scan at most this many rows
    #[serde(default)]
    pub max_rows: Option<usize>,
}

impl LabelQuery {
    /// Substring, case-insensitive, whole-sheet query reading to the right
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            mode: MatchMode::default(),
            case_sensitive: false,
            scope: SearchScope::default(),
            direction: Direction::default(),
            max_rows: None,
        }
    }

    /// Require the whole cell to equal the label
    #[inline]
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.mode = MatchMode::Exact;
        self
    }

    /// Compare case-sensitively
    #[inline]
    #[must_use]
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// With value direction
    #[inline]
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Restrict candidates to one column
    #[inline]
    #[must_use]
    pub fn in_column(mut self, col: usize) -> Self {
        self.scope = SearchScope::Column(col);
        self
    }

    /// Scan at most `rows` rows
    #[inline]
    #[must_use]
    pub fn with_max_rows(mut self, rows: usize) -> Self {
        self.max_rows = Some(rows);
        self
    }

    /// Whether the label text is blank
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn matches(&self, cell_text: &str) -> bool {
        let cell_text = cell_text.trim();
        if self.case_sensitive {
            self.compare(cell_text, &self.text)
        } else {
            self.compare(&cell_text.to_lowercase(), &self.text.to_lowercase())
        }
    }

    fn compare(&self, cell_text: &str, label: &str) -> bool {
        match self.mode {
            MatchMode::Exact => cell_text == label.trim(),
            MatchMode::Substring => cell_text.contains(label),
        }
    }
}

/// Successful locate with coordinates for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct Located {
    /// Matching label cell
    pub label_at: CellRef,
    /// Cell the value was read from
    pub value_at: CellRef,
    /// Normalized value
    pub value: CellValue,
}

impl Grid {
    /// Label cells matching `query`, in scan order; an empty label matches nothing
    pub fn matching_cells<'a>(&'a self, query: &'a LabelQuery) -> impl Iterator<Item = CellRef> + 'a {
        let last_row = if query.is_empty() {
            0
        } else {
            query.max_rows.map_or(self.height(), |max| max.min(self.height()))
        };
        let (first_col, last_col) = match query.scope {
            SearchScope::Sheet => (1, self.width()),
            SearchScope::Column(col) => (col, col),
        };
        (1..=last_row)
            .flat_map(move |row| (first_col..=last_col).map(move |col| CellRef::new(row, col)))
            .filter(move |at| {
                self.cell(*at)
                    .and_then(|raw| raw.as_text())
                    .is_some_and(|text| query.matches(&text))
            })
    }

    /// Locate with a structured miss
    ///
    /// # Errors
    /// - `LocateMiss::EmptyQuery` when the label text is blank
    /// - `LocateMiss::LabelNotFound` when no candidate matches
    /// - `LocateMiss::OutsideSheet` when the direction leaves the sheet
    /// - `LocateMiss::EmptyValue` when the adjacent cell is absent
    pub fn try_locate(&self, query: &LabelQuery) -> Result<Located, LocateMiss> {
        if query.is_empty() {
            return Err(LocateMiss::EmptyQuery);
        }
        let label_at = self
            .matching_cells(query)
            .next()
            .ok_or_else(|| LocateMiss::LabelNotFound {
                label: query.text.clone(),
            })?;

        let value_at = query
            .direction
            .step(label_at, 1)
            .ok_or_else(|| LocateMiss::OutsideSheet {
                label: query.text.clone(),
                at: label_at,
                direction: query.direction,
            })?;

        let value = self.value(value_at).ok_or_else(|| LocateMiss::EmptyValue {
            label: query.text.clone(),
            at: value_at,
        })?;

        Ok(Located {
            label_at,
            value_at,
            value,
        })
    }

    /// Best-effort locate; misses are logged and reported as `None`
    #[must_use]
    pub fn locate(&self, query: &LabelQuery) -> Option<CellValue> {
        match self.try_locate(query) {
            Ok(found) => {
                tracing::debug!(
                    label = %query.text,
                    label_at = %found.label_at,
                    value_at = %found.value_at,
                    "label located"
                );
                Some(found.value)
            }
            Err(miss) => {
                tracing::warn!("{miss}");
                None
            }
        }
    }

    /// Values near every cell matching any of the patterns
    ///
    /// For each label cell the nearest non-empty cell within
    /// `query.max_distance` steps is taken; with `require_numeric` non-numeric
    /// cells are skipped and the search continues outward.
    #[must_use]
    pub fn locate_all(&self, query: &PatternQuery) -> Vec<CellValue> {
        let mut results = Vec::new();
        for pattern in &query.patterns {
            let labels = self.pattern_cells(pattern);
            for label_at in labels {
                let found = (1..=query.max_distance)
                    .filter_map(|d| query.direction.step(label_at, d))
                    .filter_map(|at| self.value(at))
                    .find(|v| !query.require_numeric || v.is_number());
                if let Some(value) = found {
                    results.push(value);
                }
            }
        }
        results
    }

    fn pattern_cells(&self, pattern: &Regex) -> Vec<CellRef> {
        (1..=self.height())
            .flat_map(|row| (1..=self.width()).map(move |col| CellRef::new(row, col)))
            .filter(|at| {
                self.cell(*at)
                    .and_then(|raw| raw.as_text())
                    .is_some_and(|text| pattern.is_match(&text))
            })
            .collect()
    }
}

/// Regex-driven multi-value search
#[derive(Debug, Clone)]
pub struct PatternQuery {
    patterns: Vec<Regex>,
    /// Value direction
    pub direction: Direction,
    /// Furthest cell inspected from each label
    pub max_distance: usize,
    /// Only accept numeric values
    pub require_numeric: bool,
}

impl PatternQuery {
    /// Compile case-insensitive patterns; blank and invalid ones are skipped
    #[must_use]
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let patterns = patterns
            .iter()
            .filter(|p| !AsRef::<str>::as_ref(*p).trim().is_empty())
            .filter_map(|p| {
                RegexBuilder::new(p.as_ref())
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| tracing::warn!(pattern = p.as_ref(), "invalid label pattern: {e}"))
                    .ok()
            })
            .collect();
        Self {
            patterns,
            direction: Direction::Right,
            max_distance: 3,
            require_numeric: false,
        }
    }

    /// With value direction
    #[inline]
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// With maximum search distance
    #[inline]
    #[must_use]
    pub fn with_max_distance(mut self, distance: usize) -> Self {
        self.max_distance = distance;
        self
    }

    /// Only accept numeric values
    #[inline]
    #[must_use]
    pub fn numeric_only(mut self) -> Self {
        self.require_numeric = true;
        self
    }

    /// Number of usable patterns
    #[inline]
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Grid {
        Grid::from_text_rows([
            vec!["组织名称：", "Acme Ltd", ""],
            vec!["盘查覆盖周期:", "2024年1月1日至2024年12月31日", ""],
            vec!["范围一", "范围二", "范围三"],
            vec!["1,200.5", "300", "45t"],
            vec!["Total", "", "Scope 1"],
        ])
    }

    #[test]
    fn locates_right_of_label() {
        let grid = sheet();
        let value = grid.locate(&LabelQuery::new("组织名称"));
        assert_eq!(value, Some(CellValue::Text("Acme Ltd".to_string())));
    }

    #[test]
    fn locates_below_with_normalization() {
        let grid = sheet();
        let q = LabelQuery::new("范围三").with_direction(Direction::Below);
        assert_eq!(grid.locate(&q), Some(CellValue::Number(45.0)));
    }

    #[test]
    fn empty_label_matches_nothing() {
        let grid = sheet();
        for text in ["", "   "] {
            let q = LabelQuery::new(text);
            assert_eq!(grid.try_locate(&q), Err(LocateMiss::EmptyQuery));
            assert_eq!(grid.locate(&q), None);
            assert_eq!(grid.matching_cells(&q).count(), 0);
        }
        assert_eq!(PatternQuery::new(&["", "范围"]).pattern_count(), 1);
    }

    #[test]
    fn first_match_in_row_major_order_wins() {
        let grid = Grid::from_text_rows([
            vec!["", "", "Scope", "late"],
            vec!["Scope", "early", "", ""],
        ]);
        let found = grid.try_locate(&LabelQuery::new("scope")).unwrap();
        assert_eq!(found.label_at, CellRef::new(1, 3));
        assert_eq!(found.value, CellValue::Text("late".to_string()));
    }

    #[test]
    fn exact_mode_ignores_partial_matches() {
        let grid = Grid::from_text_rows([vec!["Total emissions", "1"], vec!["Total", "2"]]);
        let q = LabelQuery::new("total").exact();
        assert_eq!(grid.locate(&q), Some(CellValue::Number(2.0)));
    }

    #[test]
    fn case_sensitive_mode() {
        let grid = Grid::from_text_rows([vec!["total", "1"], vec!["Total", "2"]]);
        let q = LabelQuery::new("Total").case_sensitive();
        assert_eq!(grid.locate(&q), Some(CellValue::Number(2.0)));
    }

    #[test]
    fn left_and_above_respect_sheet_edges() {
        let grid = sheet();
        let left = LabelQuery::new("组织名称").with_direction(Direction::Left);
        assert!(matches!(
            grid.try_locate(&left),
            Err(LocateMiss::OutsideSheet { .. })
        ));
        let above = LabelQuery::new("组织名称").with_direction(Direction::Above);
        assert!(grid.locate(&above).is_none());
    }

    #[test]
    fn empty_neighbour_is_absent() {
        let grid = sheet();
        let q = LabelQuery::new("Total");
        assert!(matches!(
            grid.try_locate(&q),
            Err(LocateMiss::EmptyValue { .. })
        ));
    }

    #[test]
    fn column_scope_and_row_limit() {
        let grid = sheet();
        let q = LabelQuery::new("Scope 1").in_column(1);
        assert!(grid.locate(&q).is_none());
        let q = LabelQuery::new("Scope 1").in_column(3).with_direction(Direction::Above);
        assert_eq!(grid.locate(&q), Some(CellValue::Number(45.0)));
        let q = LabelQuery::new("Total").with_max_rows(4);
        assert!(matches!(
            grid.try_locate(&q),
            Err(LocateMiss::LabelNotFound { .. })
        ));
    }

    #[test]
    fn column_letters() {
        assert_eq!(column_index("A"), Some(1));
        assert_eq!(column_index("b"), Some(2));
        assert_eq!(column_index("AA"), Some(27));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
        assert_eq!(SearchScope::column_letters("C"), Some(SearchScope::Column(3)));
    }

    #[test]
    fn pattern_search_skips_non_numeric_when_required() {
        let grid = Grid::from_text_rows([
            vec!["基于位置 总量", "n/a", "1500"],
            vec!["基于市场 总量", "1400", ""],
        ]);
        let q = PatternQuery::new(&["总量"]).numeric_only();
        assert_eq!(
            grid.locate_all(&q),
            vec![CellValue::Number(1500.0), CellValue::Number(1400.0)]
        );
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let q = PatternQuery::new(&["(unclosed", "ok"]);
        assert_eq!(q.pattern_count(), 1);
    }
}
