//! Dataset assembler
//!
//! Fills a [`Dataset`] from a [`SourceSet`] in fixed stages:
//!
//! 1. bulk `parameter,value` import
//! 2. field resolution (first present source wins, primary documents first)
//! 3. regex extraction from populated fields
//! 4. aggregate totals with a consistency check
//! 5. section record lists and tables
//! 6. aliases
//! 7. defaults
//!
//! Every stage only fills fields that are still absent. A failing field is
//! logged and left absent; assembly as a whole never fails.

use crate::config::{
    AggregateSpec, AssemblerConfig, Combine, DocumentSelector, ExtractSpec, FieldKind, FieldSource, FieldSpec,
    KeyValueImport, SectionsSpec, TableSpec,
};
use crate::dataset::{Dataset, DatasetBuilder};
use crate::field::{format_quantity, FieldValue};
use crate::provenance::{Provenance, ProvenanceMap};
use ghg_source::{
    format_number, normalize_str, read_table, CellValue, Document, DocumentBody, Grid, Located, PatternQuery, RawValue,
    Record, SourceRole, SourceSet,
};
use regex::Regex;
use serde::Serialize;

/// Non-fatal finding recorded during assembly
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssemblyDiagnostic {
    /// A sourced total disagrees with the sum of its constituents
    Inconsistency {
        /// Total field
        field: String,
        /// Value read from the source (kept)
        sourced: f64,
        /// Sum of constituents
        derived: f64,
    },
    /// No source yielded a value
    Miss {
        /// Field left absent
        field: String,
        /// Last reason reported
        reason: String,
    },
    /// A source file could not be opened
    SourceUnavailable {
        /// Path as given
        path: String,
        /// Loader error
        reason: String,
    },
    /// A configured regex does not compile
    InvalidPattern {
        /// Field using the pattern
        field: String,
        /// Compiler message
        reason: String,
    },
}

/// Result of one assembly run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Assembly {
    /// Verified dataset
    pub dataset: Dataset,
    /// Origin per field
    pub provenance: ProvenanceMap,
    /// Findings in the order they occurred
    pub diagnostics: Vec<AssemblyDiagnostic>,
}

impl Assembly {
    /// Inconsistency findings only
    pub fn inconsistencies(&self) -> impl Iterator<Item = &AssemblyDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d, AssemblyDiagnostic::Inconsistency { .. }))
    }
}

/// Runs an [`AssemblerConfig`] against sources
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    config: AssemblerConfig,
}

struct Run<'a> {
    sources: &'a SourceSet,
    builder: DatasetBuilder,
    diagnostics: Vec<AssemblyDiagnostic>,
}

impl Assembler {
    /// Create assembler
    #[must_use]
    pub fn new(config: AssemblerConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Build the dataset
    #[must_use]
    pub fn assemble(&self, sources: &SourceSet) -> Assembly {
        let mut run = Run {
            sources,
            builder: DatasetBuilder::new(),
            diagnostics: sources
                .unavailable()
                .iter()
                .map(|u| AssemblyDiagnostic::SourceUnavailable {
                    path: u.path.clone(),
                    reason: u.reason.clone(),
                })
                .collect(),
        };

        if let Some(import) = &self.config.key_values {
            run.import_key_values(import);
        }
        for field in &self.config.fields {
            run.resolve_field(field);
        }
        for extract in &self.config.extracts {
            run.extract(extract);
        }
        for aggregate in &self.config.aggregates {
            run.aggregate(aggregate, self.config.tolerance);
        }
        for sections in &self.config.sections {
            run.record_lists(sections);
        }
        for table in &self.config.tables {
            run.table(table);
        }
        for alias in &self.config.aliases {
            if let Some(value) = run.builder.get(&alias.from).cloned() {
                run.put(&alias.to, value, Provenance::Alias { of: alias.from.clone() });
            }
        }
        for (field, value) in &self.config.defaults {
            if !run.builder.is_set(field) {
                tracing::debug!(field = %field, "default applied");
                run.put(field, value.clone(), Provenance::Default);
            }
        }

        let (dataset, provenance) = run.builder.build();
        tracing::info!(
            fields = dataset.len(),
            diagnostics = run.diagnostics.len(),
            "dataset assembled"
        );
        Assembly {
            dataset,
            provenance,
            diagnostics: run.diagnostics,
        }
    }
}

impl<'a> Run<'a> {
    /// Write if absent; rejected writes are logged
    fn put(&mut self, field: &str, value: FieldValue, provenance: Provenance) -> bool {
        if self.builder.is_set(field) {
            return false;
        }
        match self.builder.set(field, value, provenance) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("{e}");
                false
            }
        }
    }

    /// Selected documents, primary role first, then selector preference
    fn documents(&self, select: &DocumentSelector) -> Vec<&'a Document> {
        let mut docs: Vec<&'a Document> = self.sources.iter().filter(|d| select.matches(d)).collect();
        docs.sort_by_key(|d| (d.role(), select.rank(d)));
        docs
    }

    fn import_key_values(&mut self, import: &KeyValueImport) {
        let key_filter = match import.key_pattern.as_deref().map(Regex::new).transpose() {
            Ok(filter) => filter,
            Err(e) => {
                tracing::error!("invalid key pattern: {e}");
                self.diagnostics.push(AssemblyDiagnostic::InvalidPattern {
                    field: "key_values".to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let mut pending = Vec::new();
        for doc in self.documents(&import.select) {
            let DocumentBody::Delimited(body) = doc.body() else {
                continue;
            };
            for (key, raw) in body.key_values(import.skip_rows) {
                if key_filter.as_ref().is_some_and(|re| !re.is_match(&key)) {
                    continue;
                }
                if let Some(value) = normalize_str(&raw) {
                    pending.push((key, value, doc.id().clone()));
                }
            }
        }

        let mut imported = 0usize;
        for (key, value, document) in pending {
            let provenance = Provenance::KeyValue {
                document,
                key: key.clone(),
            };
            if self.put(&key, value.into(), provenance) {
                imported += 1;
            } else {
                tracing::debug!(key = %key, "duplicate parameter ignored");
            }
        }
        tracing::info!(imported, "parameters imported");
    }

    fn resolve_field(&mut self, spec: &FieldSpec) {
        if self.builder.is_set(&spec.name) {
            tracing::debug!(field = %spec.name, "already populated");
            return;
        }

        // primary-role sources first, declaration order otherwise
        let mut ordered: Vec<&FieldSource> = spec.sources.iter().collect();
        ordered.sort_by_key(|s| {
            self.documents(s.selector())
                .first()
                .map_or(SourceRole::Secondary, |d| d.role())
        });

        let mut last_reason = "no sources configured".to_string();
        for source in ordered {
            match self.try_source(source, spec.kind) {
                Ok((value, provenance)) => {
                    self.put(&spec.name, value, provenance);
                    return;
                }
                Err(reason) => last_reason = reason,
            }
        }
        tracing::warn!(field = %spec.name, reason = %last_reason, "field unresolved");
        self.diagnostics.push(AssemblyDiagnostic::Miss {
            field: spec.name.clone(),
            reason: last_reason,
        });
    }

    fn try_source(&self, source: &FieldSource, kind: FieldKind) -> Result<(FieldValue, Provenance), String> {
        let mut reason = "no matching document".to_string();
        match source {
            FieldSource::Locate { select, query } => {
                for doc in self.documents(select) {
                    let Some(grid) = doc.as_grid() else { continue };
                    match grid.try_locate(query) {
                        Ok(found) => match located_value(grid, &found, kind) {
                            Some(value) => {
                                return Ok((
                                    value,
                                    Provenance::Located {
                                        document: doc.id().clone(),
                                        label_at: found.label_at,
                                        value_at: found.value_at,
                                    },
                                ))
                            }
                            None => reason = format!("'{}' in {}: value is not {kind:?}", query.text, doc.id()),
                        },
                        Err(miss) => reason = format!("{}: {miss}", doc.id()),
                    }
                }
            }
            FieldSource::KeyValue { select, key, skip_rows } => {
                for doc in self.documents(select) {
                    let Some(body) = doc.as_delimited() else { continue };
                    let Some(raw) = body.lookup(key, *skip_rows) else {
                        reason = format!("{}: no parameter '{key}'", doc.id());
                        continue;
                    };
                    match coerce_str(raw, kind) {
                        Some(value) => {
                            return Ok((
                                value,
                                Provenance::KeyValue {
                                    document: doc.id().clone(),
                                    key: key.clone(),
                                },
                            ))
                        }
                        None => reason = format!("{}: parameter '{key}' unusable", doc.id()),
                    }
                }
            }
            FieldSource::Pattern {
                select,
                patterns,
                direction,
                max_distance,
                numeric_only,
                combine,
            } => {
                let mut query = PatternQuery::new(patterns)
                    .with_direction(*direction)
                    .with_max_distance(*max_distance);
                if *numeric_only {
                    query = query.numeric_only();
                }
                for doc in self.documents(select) {
                    let Some(grid) = doc.as_grid() else { continue };
                    let matches = grid.locate_all(&query);
                    let combined = match combine {
                        Combine::First => matches.first().cloned(),
                        Combine::Sum => {
                            let numbers: Vec<f64> = matches.iter().filter_map(CellValue::as_number).collect();
                            (!numbers.is_empty()).then(|| CellValue::Number(numbers.iter().sum()))
                        }
                    };
                    match combined.and_then(|v| coerce(v, kind)) {
                        Some(value) => {
                            return Ok((
                                value,
                                Provenance::Pattern {
                                    document: doc.id().clone(),
                                    matches: matches.len(),
                                },
                            ))
                        }
                        None => reason = format!("{}: no pattern match", doc.id()),
                    }
                }
            }
        }
        Err(reason)
    }

    fn extract(&mut self, spec: &ExtractSpec) {
        if self.builder.is_set(&spec.field) {
            return;
        }
        let re = match Regex::new(&spec.pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::error!(field = %spec.field, "invalid extract pattern: {e}");
                self.diagnostics.push(AssemblyDiagnostic::InvalidPattern {
                    field: spec.field.clone(),
                    reason: e.to_string(),
                });
                return;
            }
        };
        let Some(text) = self.builder.get(&spec.from).and_then(FieldValue::scalar_text) else {
            tracing::warn!(field = %spec.field, from = %spec.from, "extract source absent");
            return;
        };
        let captured = re
            .captures(&text)
            .and_then(|c| c.get(spec.group))
            .map(|m| m.as_str().to_string());
        match captured.and_then(|s| coerce_str(&s, spec.kind)) {
            Some(value) => {
                self.put(&spec.field, value, Provenance::Extracted { from: spec.from.clone() });
            }
            None => tracing::warn!(field = %spec.field, from = %spec.from, "extract pattern did not match"),
        }
    }

    fn aggregate(&mut self, spec: &AggregateSpec, tolerance: f64) {
        let present: Vec<(&str, f64)> = spec
            .constituents
            .iter()
            .filter_map(|c| self.builder.get(c).and_then(FieldValue::as_number).map(|n| (c.as_str(), n)))
            .collect();
        let complete = present.len() == spec.constituents.len();
        let derived = (!present.is_empty() && (complete || spec.allow_partial))
            .then(|| present.iter().map(|(_, n)| n).sum::<f64>());

        if let Some(existing) = self.builder.get(&spec.field) {
            if let (Some(sourced), Some(derived)) = (existing.as_number(), derived) {
                if (sourced - derived).abs() > tolerance {
                    tracing::warn!(
                        field = %spec.field,
                        sourced,
                        derived,
                        "sourced total disagrees with constituents; sourced value kept"
                    );
                    self.diagnostics.push(AssemblyDiagnostic::Inconsistency {
                        field: spec.field.clone(),
                        sourced,
                        derived,
                    });
                }
            }
            return;
        }

        if let Some(sum) = derived {
            let constituents = present.iter().map(|(c, _)| (*c).to_string()).collect();
            self.put(&spec.field, FieldValue::Number(sum), Provenance::Derived { constituents });
            return;
        }

        if let Some(source_field) = &spec.source_field {
            if let Some(value) = self.builder.get(source_field).filter(|v| v.as_number().is_some()).cloned() {
                self.put(&spec.field, value, Provenance::Alias { of: source_field.clone() });
                return;
            }
        }
        tracing::warn!(field = %spec.field, present = present.len(), "total left absent");
    }

    fn record_lists(&mut self, spec: &SectionsSpec) {
        let parsed = self.documents(&spec.select).into_iter().find_map(|doc| {
            let body = doc.as_delimited()?;
            let sections = spec.parser.parse(body);
            (sections.record_count() > 0 || sections.iter().any(|(name, _)| sections.start_row(name).is_some()))
                .then(|| (doc.id().clone(), sections))
        });

        for list in &spec.lists {
            if self.builder.is_set(&list.field) {
                continue;
            }
            let mut records: Vec<Record> = list
                .summary_rows
                .iter()
                .filter_map(|row| {
                    let value = self.builder.get(&row.field)?.as_number()?;
                    (value != 0.0).then(|| Record::new(&row.label, format_quantity(value), &row.note))
                })
                .collect();

            let provenance = match &parsed {
                Some((document, sections)) => {
                    records.extend_from_slice(sections.get(&list.section));
                    Provenance::Sections {
                        document: document.clone(),
                        section: list.section.clone(),
                    }
                }
                None => {
                    tracing::warn!(field = %list.field, section = %list.section, "no document with sections");
                    Provenance::Derived {
                        constituents: list.summary_rows.iter().map(|r| r.field.clone()).collect(),
                    }
                }
            };
            self.put(&list.field, FieldValue::Records(records), provenance);
        }
    }

    fn table(&mut self, spec: &TableSpec) {
        if self.builder.is_set(&spec.field) {
            return;
        }
        let Some(doc) = self.documents(&spec.select).into_iter().next() else {
            tracing::warn!(field = %spec.field, "no document for table");
            return;
        };
        let rows = match doc.body() {
            DocumentBody::Grid(grid) => read_table(grid, &spec.options),
            DocumentBody::Delimited(body) => read_table(body, &spec.options),
        };
        self.put(
            &spec.field,
            FieldValue::Table(rows),
            Provenance::Table {
                document: doc.id().clone(),
            },
        );
    }
}

/// Text fields keep the cell's own wording; other kinds are normalized
fn coerce_str(raw: &str, kind: FieldKind) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => {
            let trimmed = raw.trim();
            (!trimmed.is_empty()).then(|| FieldValue::Text(trimmed.to_string()))
        }
        FieldKind::Any | FieldKind::Number => normalize_str(raw).and_then(|v| coerce(v, kind)),
    }
}

fn located_value(grid: &Grid, found: &Located, kind: FieldKind) -> Option<FieldValue> {
    match grid.cell(found.value_at) {
        Some(RawValue::Text(raw)) => coerce_str(raw, kind),
        _ => coerce(found.value.clone(), kind),
    }
}

fn coerce(value: CellValue, kind: FieldKind) -> Option<FieldValue> {
    match (kind, value) {
        (FieldKind::Number, CellValue::Text(_)) => None,
        (FieldKind::Text, CellValue::Number(n)) => Some(FieldValue::Text(format_number(n))),
        (_, value) => Some(value.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RecordListSpec, SummaryRow};
    use ghg_source::{DelimitedDocument, DocumentId, LabelQuery, SectionMarker, SectionParser, TableOptions};

    fn kv_doc(rows: &[(&str, &str)]) -> Document {
        let mut all = vec![vec!["参数".to_string(), "值".to_string()]];
        all.extend(rows.iter().map(|(k, v)| vec![(*k).to_string(), (*v).to_string()]));
        Document::delimited("data.csv", DelimitedDocument::from_rows(all))
    }

    #[test]
    fn total_equals_sum_of_constituents() {
        let sources = SourceSet::new().with_document(kv_doc(&[("s1", "10.5"), ("s2", "20.25"), ("s3", "3")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_aggregate(AggregateSpec::sum("total", ["s1", "s2", "s3"]));
        let assembly = Assembler::new(config).assemble(&sources);
        assert_eq!(assembly.dataset.number("total"), Some(33.75));
        assert!(matches!(assembly.provenance["total"], Provenance::Derived { .. }));
    }

    #[test]
    fn incomplete_constituents_leave_total_absent() {
        let sources = SourceSet::new().with_document(kv_doc(&[("s1", "10")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_aggregate(AggregateSpec::sum("total", ["s1", "s2"]))
            .with_aggregate(AggregateSpec::sum("partial", ["s1", "s2"]).partial())
            .with_aggregate(AggregateSpec::sum("none", ["x", "y"]).partial());
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.number("total"), None);
        assert_eq!(ds.number("partial"), Some(10.0));
        assert_eq!(ds.number("none"), None);
    }

    #[test]
    fn sourced_total_wins_and_is_flagged() {
        let sources =
            SourceSet::new().with_document(kv_doc(&[("s1", "10"), ("s2", "20"), ("total", "31")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_aggregate(AggregateSpec::sum("total", ["s1", "s2"]));
        let assembly = Assembler::new(config).assemble(&sources);
        assert_eq!(assembly.dataset.number("total"), Some(31.0));
        assert_eq!(
            assembly.inconsistencies().collect::<Vec<_>>(),
            vec![&AssemblyDiagnostic::Inconsistency {
                field: "total".to_string(),
                sourced: 31.0,
                derived: 30.0
            }]
        );
    }

    #[test]
    fn within_tolerance_is_consistent() {
        let sources =
            SourceSet::new().with_document(kv_doc(&[("s1", "10"), ("s2", "20"), ("total", "30.005")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_aggregate(AggregateSpec::sum("total", ["s1", "s2"]));
        assert_eq!(Assembler::new(config).assemble(&sources).inconsistencies().count(), 0);
    }

    #[test]
    fn aggregate_falls_back_to_source_field() {
        let sources = SourceSet::new().with_document(kv_doc(&[("s1", "10"), ("sheet_total", "99")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_aggregate(AggregateSpec::sum("total", ["s1", "s2"]).or_field("sheet_total"));
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.number("total"), Some(99.0));
    }

    #[test]
    fn primary_documents_are_tried_first() {
        let secondary = Document::grid("b.xlsx#s", Grid::from_text_rows([vec!["Company", "From sheet"]]))
            .with_role(SourceRole::Secondary);
        let primary = Document::grid("a.xlsx#s", Grid::from_text_rows([vec!["Company", "From export"]]));
        let sources = SourceSet::new().with_document(secondary).with_document(primary);
        let config = AssemblerConfig::new().with_field(
            FieldSpec::new("company", FieldKind::Text).with_source(FieldSource::locate(LabelQuery::new("company"))),
        );
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.text("company"), Some("From export"));
    }

    #[test]
    fn number_fields_reject_text() {
        let sources = SourceSet::new().with_document(Document::grid(
            "a.xlsx#s",
            Grid::from_text_rows([vec!["范围一", "待补充"], vec!["范围一合计", "12"]]),
        ));
        let config = AssemblerConfig::new().with_field(
            FieldSpec::new("scope_1", FieldKind::Number)
                .with_source(FieldSource::locate(LabelQuery::new("范围一").exact()))
                .with_source(FieldSource::locate(LabelQuery::new("合计"))),
        );
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.number("scope_1"), Some(12.0));
    }

    #[test]
    fn text_fields_keep_source_wording() {
        let sources = SourceSet::new()
            .with_document(kv_doc(&[("company", "360"), ("capital", "500万元"), ("period", " 2024 ")]))
            .with_document(Document::grid("a.xlsx#s", Grid::from_text_rows([vec!["单位", "1,200"]])));
        let config = AssemblerConfig::new()
            .with_field(FieldSpec::new("company", FieldKind::Text).with_source(FieldSource::key_value("company")))
            .with_field(FieldSpec::new("capital", FieldKind::Any).with_source(FieldSource::key_value("capital")))
            .with_field(FieldSpec::new("period", FieldKind::Text).with_source(FieldSource::key_value("period")))
            .with_field(FieldSpec::new("unit", FieldKind::Text).with_source(FieldSource::locate(LabelQuery::new("单位"))));
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.text("company"), Some("360"));
        assert_eq!(ds.text("capital"), Some("500万元"));
        assert_eq!(ds.text("period"), Some("2024"));
        assert_eq!(ds.text("unit"), Some("1,200"));
    }

    #[test]
    fn table_stage_reads_header_keyed_rows() {
        let grid = Grid::from_text_rows([
            vec!["排放源", "排放量 (tCO2e)", "备注"],
            vec!["天然气", "1,200.5", "锅炉"],
            vec!["", "", ""],
            vec!["柴油", "80", ""],
        ]);
        let sources = SourceSet::new().with_document(Document::grid(DocumentId::in_sheet("inventory.xlsx", "明细"), grid));
        let config = AssemblerConfig::new().with_table(TableSpec {
            field: "source_table".to_string(),
            select: DocumentSelector::sheets(["明细"]),
            options: TableOptions::default(),
        });
        let assembly = Assembler::new(config).assemble(&sources);
        let rows = assembly.dataset.get("source_table").and_then(FieldValue::as_table).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["排放源"], Some(CellValue::Text("天然气".to_string())));
        assert_eq!(rows[0]["排放量 (tCO2e)"], Some(CellValue::Number(1200.5)));
        assert_eq!(rows[1]["备注"], None);
        assert!(matches!(assembly.provenance["source_table"], Provenance::Table { .. }));
    }

    #[test]
    fn unresolved_field_is_a_miss_not_an_error() {
        let config = AssemblerConfig::new().with_field(
            FieldSpec::new("company", FieldKind::Text).with_source(FieldSource::key_value("company_name")),
        );
        let assembly = Assembler::new(config).assemble(&SourceSet::new());
        assert!(assembly.dataset.is_empty());
        assert!(matches!(&assembly.diagnostics[0], AssemblyDiagnostic::Miss { field, .. } if field == "company"));
    }

    #[test]
    fn extract_year_from_period() {
        let sources = SourceSet::new().with_document(kv_doc(&[("reporting_period", "2024年1月1日至2024年12月31日")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_extract(ExtractSpec {
                field: "report_year".to_string(),
                from: "reporting_period".to_string(),
                pattern: r"(\d{4})".to_string(),
                group: 1,
                kind: FieldKind::Text,
            });
        let ds = Assembler::new(config).assemble(&sources).dataset;
        assert_eq!(ds.text("report_year"), Some("2024"));
    }

    #[test]
    fn record_lists_with_summary_rows() {
        let doc = Document::delimited(
            "data.csv",
            DelimitedDocument::from_rows([
                vec!["scope_2_location_based_emissions", "800"],
                vec!["scope_2_market_based_emissions", "0"],
                vec!["范围二三间接排放源", ""],
                vec!["类别", "排放源"],
                vec!["外购电力", "电网电力"],
            ]),
        );
        let parser = SectionParser::new(vec![SectionMarker::new("scope2_3", ["范围二", "排放源"])])
            .with_header_label("排放源");
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport {
                skip_rows: 0,
                key_pattern: Some("^[A-Za-z_][A-Za-z0-9_]*$".to_string()),
                ..KeyValueImport::default()
            })
            .with_sections(SectionsSpec {
                select: DocumentSelector::default(),
                parser,
                lists: vec![RecordListSpec {
                    field: "scope2_3_items".to_string(),
                    section: "scope2_3".to_string(),
                    summary_rows: vec![
                        SummaryRow::new("范围二（基于位置）", "scope_2_location_based_emissions", "外购电力和热力"),
                        SummaryRow::new("范围二（基于市场）", "scope_2_market_based_emissions", "外购电力和热力"),
                    ],
                }],
            });
        let assembly = Assembler::new(config).assemble(&SourceSet::new().with_document(doc));
        let records = assembly.dataset.records("scope2_3_items").unwrap();
        assert_eq!(
            records,
            &[
                Record::new("范围二（基于位置）", "800.00", "外购电力和热力"),
                Record::new("外购电力", "电网电力", ""),
            ]
        );
        assert!(!assembly.dataset.contains("范围二三间接排放源"));
    }

    #[test]
    fn aliases_and_defaults_fill_only_absent_fields() {
        let sources = SourceSet::new().with_document(kv_doc(&[("scope_1_emissions", "5"), ("legal_person", "张三")]));
        let config = AssemblerConfig::new()
            .with_key_values(KeyValueImport::default())
            .with_alias("scope_1_emissions", "scope_1")
            .with_default("legal_person", "待补充")
            .with_default("company_profile", "待补充公司简介信息");
        let assembly = Assembler::new(config).assemble(&sources);
        assert_eq!(assembly.dataset.number("scope_1"), Some(5.0));
        assert_eq!(assembly.dataset.text("legal_person"), Some("张三"));
        assert_eq!(assembly.dataset.text("company_profile"), Some("待补充公司简介信息"));
        assert_eq!(assembly.provenance["company_profile"], Provenance::Default);
    }

    #[test]
    fn unavailable_sources_become_diagnostics() {
        let mut sources = SourceSet::new();
        sources.mark_unavailable("missing.xlsx", "not found");
        let assembly = Assembler::new(AssemblerConfig::new()).assemble(&sources);
        assert!(matches!(
            &assembly.diagnostics[0],
            AssemblyDiagnostic::SourceUnavailable { path, .. } if path == "missing.xlsx"
        ));
    }
}
