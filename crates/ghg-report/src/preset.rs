//! Built-in inventory layout
//!
//! Field names, labels and section titles of the Chinese enterprise GHG
//! inventory: a `parameter,value` export (`减排行动统计.csv`) that also holds
//! the emission source tables, and an inventory workbook consulted for
//! whatever the export lacks.

use crate::config::{GeneratorSettings, ReportConfig};
use ghg_dataset::{
    AggregateSpec, AssemblerConfig, DocumentSelector, ExtractSpec, FieldKind, FieldSource, FieldSpec,
    KeyValueImport, RecordListSpec, SectionsSpec, SummaryRow,
};
use ghg_narrative::{NarrativeConfig, NarrativeLanguage};
use ghg_source::{Direction, LabelQuery, LoadOptions, SectionMarker, SectionParser};

/// Inventory overview sheet names, in preference order
pub const MAIN_SHEETS: [&str; 2] = ["温室气体盘查清册", "温室气体盘查清册 (2)"];

/// Emission table sheet
pub const TABLE_SHEET: &str = "表1温室气体盘查表";

/// Scope 3 category fields with their row label and note
pub const SCOPE3_CATEGORIES: [(&str, &str, &str); 10] = [
    ("外购商品和服务的上游产生的排放", "scope_3_category_1_emissions", "原材料采购"),
    ("资本货物产生的排放", "scope_3_category_2_emissions", "设备设施建设"),
    ("燃料和能源相关逸出排放", "scope_3_category_3_emissions", "外购电力热力上游排放"),
    ("上下游运输和配送产生的排放", "scope_3_category_4_emissions", "物流运输"),
    ("运营中产生的废弃物产生的排放", "scope_3_category_5_emissions", "废弃物处理"),
    ("员工商务差旅产生的排放", "scope_3_category_6_emissions", "商务出行"),
    ("员工上下班通勤产生的排放", "scope_3_category_7_emissions", "员工通勤"),
    ("运营中输入的运输和配送产生的排放", "scope_3_category_9_emissions", "原材料和产品运输"),
    ("已售产品的使用过程产生的排放", "scope_3_category_10_emissions", "产品使用阶段"),
    ("已售产品的报废处理产生的排放", "scope_3_category_12_emissions", "产品回收处理"),
];

const SCOPE_1: &str = "scope_1_emissions";
const SCOPE_2_LOCATION: &str = "scope_2_location_based_emissions";
const SCOPE_2_MARKET: &str = "scope_2_market_based_emissions";
const SCOPE_3: &str = "scope_3_emissions";

/// Short names kept for templates written against them
const SHORT_NAMES: [(&str, &str); 5] = [
    (SCOPE_1, "scope_1"),
    (SCOPE_2_LOCATION, "scope_2_location"),
    (SCOPE_2_MARKET, "scope_2_market"),
    (SCOPE_3, "scope_3"),
    ("scope2_3_items", "items"),
];

const DEFAULTS: [(&str, &str); 12] = [
    ("company_profile", "待补充公司简介信息"),
    ("legal_person", "待补充"),
    ("registered_address", "待补充注册地址"),
    ("date_of_establishment", "待补充"),
    ("registered_capital", "待补充"),
    ("Unified_Social_Credit_Identifier", "待补充"),
    ("deadline", "待补充"),
    ("evaluation_level", "待评估"),
    ("evaluation_score", "待评估"),
    ("scope_of_business", "待补充经营范围"),
    ("GWP_Value_Reference_Document", "2021年IPCC第六次评估报告AR6"),
    ("rule_file", "企业温室气体排放核算与报告指南"),
];

fn main_sheet(field: &str, kind: FieldKind, label: &str) -> FieldSpec {
    FieldSpec::new(field, kind).with_source(FieldSource::locate_in(MAIN_SHEETS, LabelQuery::new(label)))
}

fn table_cell(field: &str, query: LabelQuery) -> FieldSpec {
    FieldSpec::new(field, FieldKind::Number).with_source(FieldSource::locate_in([TABLE_SHEET], query))
}

fn column_head(label: &str) -> LabelQuery {
    LabelQuery::new(label).exact().with_direction(Direction::Below)
}

/// Section markers of the export
#[must_use]
pub fn inventory_sections() -> SectionParser {
    SectionParser::new(vec![
        SectionMarker::new("scope1", ["范围一", "直接", "排放源"]),
        SectionMarker::new("scope2_3", ["范围二", "排放源"])
            .with_excluded(["范围一"])
            .with_skip_categories(["范围一"]),
    ])
    .with_header_label("排放源")
}

/// Assembler layout of the inventory
#[must_use]
pub fn inventory_assembler() -> AssemblerConfig {
    let mut scope2_3_rows = vec![
        SummaryRow::new("范围二：能源间接温室气体排放（基于位置）", SCOPE_2_LOCATION, "外购电力和热力"),
        SummaryRow::new("范围二：能源间接温室气体排放（基于市场）", SCOPE_2_MARKET, "外购电力和热力"),
    ];
    scope2_3_rows.extend(
        SCOPE3_CATEGORIES
            .iter()
            .map(|(label, field, note)| SummaryRow::new(*label, *field, *note)),
    );

    let mut config = AssemblerConfig::new()
        .with_key_values(KeyValueImport {
            key_pattern: Some("^[A-Za-z][A-Za-z0-9_]*$".to_string()),
            ..KeyValueImport::default()
        })
        .with_field(main_sheet("company_name", FieldKind::Text, "组织名称："))
        .with_field(main_sheet("reporting_period", FieldKind::Text, "盘查覆盖周期"))
        .with_field(table_cell(SCOPE_1, column_head("范围一")))
        .with_field(table_cell(SCOPE_2_LOCATION, LabelQuery::new("基于位置").exact()))
        .with_field(table_cell(SCOPE_2_MARKET, LabelQuery::new("基于市场").exact()))
        .with_field(table_cell(SCOPE_3, column_head("范围三")))
        .with_field(table_cell("total_emission_location", column_head("总量")))
        .with_extract(ExtractSpec {
            field: "report_year".to_string(),
            from: "reporting_period".to_string(),
            pattern: r"(\d{4})".to_string(),
            group: 1,
            kind: FieldKind::Text,
        })
        .with_aggregate(AggregateSpec::sum("total_emission_location", [SCOPE_1, SCOPE_2_LOCATION, SCOPE_3]))
        .with_aggregate(AggregateSpec::sum("total_emission_market", [SCOPE_1, SCOPE_2_MARKET, SCOPE_3]))
        .with_sections(SectionsSpec {
            select: DocumentSelector::default(),
            parser: inventory_sections(),
            lists: vec![
                RecordListSpec {
                    field: "scope1_items".to_string(),
                    section: "scope1".to_string(),
                    summary_rows: Vec::new(),
                },
                RecordListSpec {
                    field: "scope2_3_items".to_string(),
                    section: "scope2_3".to_string(),
                    summary_rows: scope2_3_rows,
                },
            ],
        });

    for (from, to) in SHORT_NAMES {
        config = config.with_alias(from, to);
    }
    for (field, value) in DEFAULTS {
        config = config.with_default(field, value);
    }
    config
}

/// Quantities formatted for the template
#[must_use]
pub fn inventory_quantities() -> Vec<String> {
    [SCOPE_1, SCOPE_2_LOCATION, SCOPE_2_MARKET, SCOPE_3]
        .into_iter()
        .chain(SCOPE3_CATEGORIES.iter().map(|(_, field, _)| *field))
        .chain(SHORT_NAMES.iter().take(4).map(|(_, short)| *short))
        .chain(["total_emission_location", "total_emission_market"])
        .map(String::from)
        .collect()
}

/// Summary subject: company, year, location-based total and its scopes
#[must_use]
pub fn inventory_narrative() -> NarrativeConfig {
    NarrativeConfig::new("company_name", "report_year", "total_emission_location")
        .with_constituent(SCOPE_1, "范围一")
        .with_constituent(SCOPE_2_LOCATION, "范围二")
        .with_constituent(SCOPE_3, "范围三")
        .with_reference_fields([
            "total_emission_location",
            "total_emission_market",
            SCOPE_1,
            SCOPE_2_LOCATION,
            SCOPE_2_MARKET,
            SCOPE_3,
        ])
        .with_language(NarrativeLanguage::Chinese)
}

impl ReportConfig {
    /// Built-in inventory report
    ///
    /// Generator settings start from defaults; combine with
    /// [`GeneratorSettings::from_env`] to enable the external generator.
    #[must_use]
    pub fn ghg_inventory() -> Self {
        Self {
            load: LoadOptions::default(),
            assembler: inventory_assembler(),
            narrative: inventory_narrative(),
            generator: GeneratorSettings::default(),
            quantity_fields: inventory_quantities(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_titles_attribute_to_their_scope() {
        let parser = inventory_sections();
        assert_eq!(parser.attribute_row("范围一直接排放源"), Some(0));
        assert_eq!(parser.attribute_row("范围二三间接排放源"), Some(1));
        assert_eq!(parser.attribute_row("范围一与范围二排放源汇总"), None);
    }

    #[test]
    fn preset_round_trips_through_toml() {
        let preset = ReportConfig::ghg_inventory();
        let text = toml::to_string(&preset).unwrap();
        let parsed = ReportConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.assembler, preset.assembler);
        assert_eq!(parsed.narrative, preset.narrative);
    }

    #[test]
    fn quantities_cover_scopes_and_totals() {
        let q = inventory_quantities();
        assert!(q.iter().any(|f| f == "scope_1"));
        assert!(q.iter().any(|f| f == "scope_3_category_12_emissions"));
        assert!(q.iter().any(|f| f == "total_emission_market"));
        assert!(!q.iter().any(|f| f == "items"));
    }
}
