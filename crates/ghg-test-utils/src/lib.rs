//! Testing utilities for the GHG report workspace
//!
//! Shared fixtures (an inventory export, inventory workbook sheets, a small
//! narrative dataset) and stub generators.

#![allow(missing_docs)]

use ghg_dataset::{Dataset, FieldValue};
use ghg_narrative::{GenerationError, NarrativeConfig, NarrativeGenerator, NarrativeRequest};
use ghg_source::{DelimitedDocument, Document, DocumentId, Grid, SourceRole, SourceSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const EXPORT_ID: &str = "减排行动统计.csv";
pub const MAIN_SHEET: &str = "温室气体盘查清册";
pub const TABLE_SHEET: &str = "表1温室气体盘查表";

/// Inventory export: `parameter,value` rows followed by two titled sections
pub const INVENTORY_EXPORT_CSV: &str = "\
参数,值
company_name,Acme Manufacturing Co.
reporting_period,2024年1月1日至2024年12月31日
scope_1_emissions,\"1,200.50\"
scope_2_location_based_emissions,800
scope_2_market_based_emissions,750
scope_3_emissions,2000
scope_3_category_1_emissions,1500
scope_3_category_4_emissions,500
scope_3_category_6_emissions,0

范围一直接排放源,,
类别,排放源,设施
固定燃料燃烧,天然气,锅炉
移动燃料燃烧,柴油,叉车
散逸排放,R410A,空调
范围二三间接排放源,,
类别,排放源,设施
外购电力,电网电力,生产车间
外购热力,蒸汽,园区供热
范围一补充,汽油,公务车
";

pub fn export_document() -> Document {
    let doc = DelimitedDocument::from_text(INVENTORY_EXPORT_CSV, b',').unwrap();
    Document::delimited(EXPORT_ID, doc)
        .with_role(SourceRole::Primary)
        .with_checksum_of(INVENTORY_EXPORT_CSV.as_bytes())
}

pub fn main_sheet() -> Grid {
    Grid::from_text_rows([
        vec!["温室气体盘查清册"],
        vec![""],
        vec!["组织名称：", "Acme Manufacturing"],
        vec!["盘查覆盖周期:", "2024年1月1日至2024年12月31日"],
    ])
}

pub fn table_sheet() -> Grid {
    Grid::from_text_rows([
        vec!["", "范围一", "范围二", "范围三", "总量"],
        vec!["总排放量", "1200.5", "800", "2000", "4000.5"],
        vec!["范围二排放", "基于位置", "800"],
        vec!["", "基于市场", "750"],
    ])
}

pub fn inventory_sheets() -> Vec<Document> {
    vec![
        Document::grid(DocumentId::in_sheet("inventory.xlsx", MAIN_SHEET), main_sheet()).with_role(SourceRole::Secondary),
        Document::grid(DocumentId::in_sheet("inventory.xlsx", TABLE_SHEET), table_sheet()).with_role(SourceRole::Secondary),
    ]
}

/// Workbook sheets plus the export
pub fn inventory_sources() -> SourceSet {
    let mut set = SourceSet::new();
    for doc in inventory_sheets() {
        set.insert(doc);
    }
    set.with_document(export_document())
}

/// Workbook sheets only
pub fn workbook_sources() -> SourceSet {
    let mut set = SourceSet::new();
    for doc in inventory_sheets() {
        set.insert(doc);
    }
    set
}

/// Narrative config over [`acme_dataset`]
pub fn acme_config() -> NarrativeConfig {
    NarrativeConfig::new("company", "year", "total")
        .with_constituent("part_a", "Part A")
        .with_constituent("part_b", "Part B")
}

pub fn acme_dataset() -> Dataset {
    acme_dataset_with_total("100")
}

pub fn acme_dataset_with_total(total: &str) -> Dataset {
    Dataset::from_pairs([
        ("company", FieldValue::from("Acme")),
        ("year", FieldValue::from("2024")),
        ("total", FieldValue::from(total)),
        ("part_a", FieldValue::from("30")),
        ("part_b", FieldValue::from("70")),
    ])
}

/// Returns the same text on every call and counts calls
#[derive(Debug, Default)]
pub struct FixedGenerator {
    pub text: String,
    calls: AtomicUsize,
}

impl FixedGenerator {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NarrativeGenerator for FixedGenerator {
    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Always answers with a service error
#[derive(Debug, Clone, Copy)]
pub struct FailingGenerator {
    pub status: u16,
}

#[async_trait::async_trait]
impl NarrativeGenerator for FailingGenerator {
    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, GenerationError> {
        Err(GenerationError::status(self.status, "service unavailable"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Answers after a delay
#[derive(Debug, Clone)]
pub struct SlowGenerator {
    pub delay: Duration,
    pub text: String,
}

impl SlowGenerator {
    pub fn new(delay: Duration, text: impl Into<String>) -> Self {
        Self {
            delay,
            text: text.into(),
        }
    }
}

#[async_trait::async_trait]
impl NarrativeGenerator for SlowGenerator {
    async fn generate(&self, _request: &NarrativeRequest) -> Result<String, GenerationError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "slow"
    }
}

/// Records the last request it was given
#[derive(Debug, Default)]
pub struct RecordingGenerator {
    pub reply: String,
    last: tokio::sync::Mutex<Option<NarrativeRequest>>,
}

impl RecordingGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            last: tokio::sync::Mutex::new(None),
        }
    }

    pub async fn last_request(&self) -> Option<NarrativeRequest> {
        self.last.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl NarrativeGenerator for RecordingGenerator {
    async fn generate(&self, request: &NarrativeRequest) -> Result<String, GenerationError> {
        *self.last.lock().await = Some(request.clone());
        Ok(self.reply.clone())
    }
}
