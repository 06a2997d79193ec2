use ghg_source::grid::{CellRef, Grid};
use ghg_source::locator::{Direction, LabelQuery, PatternQuery};
use ghg_source::value::{normalize, CellValue};
use proptest::prelude::*;

fn inventory_sheet() -> Grid {
    Grid::from_text_rows([
        vec!["温室气体盘查清册", "", "", ""],
        vec!["组织名称：", "Acme Manufacturing", "", ""],
        vec!["盘查覆盖周期:", "2024年1月1日至2024年12月31日", "", ""],
        vec!["", "总排放量", "基于位置", "基于市场"],
        vec!["范围一", "1,200.50", "", ""],
        vec!["范围二", "", "800", "650"],
        vec!["范围三", "2,000", "", ""],
    ])
}

#[test]
fn test_locate_company_and_period() {
    let grid = inventory_sheet();
    assert_eq!(
        grid.locate(&LabelQuery::new("组织名称：")),
        Some(CellValue::Text("Acme Manufacturing".to_string()))
    );
    assert_eq!(
        grid.locate(&LabelQuery::new("盘查覆盖周期")),
        Some(CellValue::Text("2024年1月1日至2024年12月31日".to_string()))
    );
}

#[test]
fn test_locate_in_column_and_below() {
    let grid = inventory_sheet();
    let scope1 = LabelQuery::new("范围一").in_column(1);
    assert_eq!(grid.locate(&scope1), Some(CellValue::Number(1200.5)));

    let location = LabelQuery::new("基于位置").with_direction(Direction::Below).exact();
    assert_eq!(grid.locate(&location), None, "cell below the header is blank");
}

#[test]
fn test_left_and_above_stop_at_edges() {
    let grid = inventory_sheet();
    let left = LabelQuery::new("组织名称").with_direction(Direction::Left);
    assert!(grid.try_locate(&left).is_err());
    let above = LabelQuery::new("温室气体").with_direction(Direction::Above);
    assert!(grid.try_locate(&above).is_err());
}

#[test]
fn test_max_rows_bounds_the_scan() {
    let grid = inventory_sheet();
    assert_eq!(grid.locate(&LabelQuery::new("范围三").with_max_rows(6)), None);
    assert!(grid.locate(&LabelQuery::new("范围三").with_max_rows(7)).is_some());
}

#[test]
fn test_locate_all_collects_every_label() {
    let grid = inventory_sheet();
    let q = PatternQuery::new(&["^范围[一二三]$"]).numeric_only();
    let values: Vec<f64> = grid.locate_all(&q).iter().filter_map(CellValue::as_number).collect();
    assert_eq!(values, vec![1200.5, 800.0, 2000.0]);
}

#[test]
fn test_invalid_patterns_are_skipped() {
    let q = PatternQuery::new(&["(unclosed", "范围"]);
    assert_eq!(q.pattern_count(), 1);
}

fn cell_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("范围一".to_string()),
        Just("Total".to_string()),
        Just("total emissions".to_string()),
        Just("42".to_string()),
        Just("1,000 t".to_string()),
        "[a-z]{1,6}",
    ]
}

proptest! {
    #[test]
    fn prop_located_value_exists_at_resolved_cell(
        rows in proptest::collection::vec(proptest::collection::vec(cell_text(), 1..5), 1..8),
        label in prop_oneof![Just("total"), Just("范围"), Just("a"), Just("42")],
        direction in prop_oneof![
            Just(Direction::Right),
            Just(Direction::Left),
            Just(Direction::Below),
            Just(Direction::Above),
        ],
    ) {
        let grid = Grid::from_text_rows(rows);
        let query = LabelQuery::new(label).with_direction(direction);
        if let Ok(found) = grid.try_locate(&query) {
            let raw = grid.cell(found.value_at).cloned().unwrap_or_default();
            prop_assert_eq!(normalize(&raw), Some(found.value.clone()));

            let label_text = grid.cell(found.label_at).and_then(|c| c.as_text()).unwrap_or_default();
            prop_assert!(label_text.to_lowercase().contains(&label.to_lowercase()));
            prop_assert_eq!(direction.step(found.label_at, 1), Some(found.value_at));
        }
    }

    #[test]
    fn prop_first_match_is_row_major_minimum(
        rows in proptest::collection::vec(proptest::collection::vec(cell_text(), 1..5), 1..8),
    ) {
        let grid = Grid::from_text_rows(rows);
        let query = LabelQuery::new("total");
        let all: Vec<CellRef> = grid.matching_cells(&query).collect();
        let mut sorted = all.clone();
        sorted.sort();
        prop_assert_eq!(all, sorted);
    }
}
