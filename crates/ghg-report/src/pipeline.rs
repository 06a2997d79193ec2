//! Report pipeline
//!
//! ```text
//! paths ─→ load_sources ─→ SourceSet ─→ Assembler ─→ Dataset ─→ Narrator ─→ Report
//! ```
//!
//! Nothing here fails: unreadable files become diagnostics, missing values
//! stay absent, and the narrative falls back to the template.

use crate::config::ReportConfig;
use ghg_dataset::{Assembler, AssemblyDiagnostic, Dataset, FieldValue, ProvenanceMap};
use ghg_narrative::{Narrative, Narrator};
use ghg_source::{load_path, SourceRole, SourceSet};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};

/// Template key holding the summary
pub const SUMMARY_KEY: &str = "executive_summary";

/// Everything a renderer needs
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Verified fields
    pub dataset: Dataset,
    /// Origin of each field
    pub provenance: ProvenanceMap,
    /// Assembly findings
    pub diagnostics: Vec<AssemblyDiagnostic>,
    /// Executive summary
    pub narrative: Narrative,
    #[serde(skip)]
    quantity_fields: Vec<String>,
}

impl Report {
    /// JSON object handed to the document renderer
    ///
    /// Scalars are rendered as text (quantities grouped to two decimals),
    /// record lists as `{name, emission, note}` rows, tables as-is, plus the
    /// summary under [`SUMMARY_KEY`].
    #[must_use]
    pub fn template_context(&self) -> Value {
        let quantities: Vec<&str> = self.quantity_fields.iter().map(String::as_str).collect();
        let mut context: Map<String, Value> = self
            .dataset
            .render_view(&quantities)
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();

        for (name, value) in self.dataset.iter() {
            match value {
                FieldValue::Records(records) => {
                    let rows = records
                        .iter()
                        .map(|r| json!({ "name": r.category, "emission": r.detail, "note": r.note }))
                        .collect();
                    context.insert(name.to_string(), Value::Array(rows));
                }
                FieldValue::Table(_) => {
                    context.insert(name.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
                }
                FieldValue::Number(_) | FieldValue::Text(_) => {}
            }
        }

        context.insert(SUMMARY_KEY.to_string(), Value::String(self.narrative.text.clone()));
        Value::Object(context)
    }
}

/// Load, assemble, narrate
#[derive(Debug, Clone)]
pub struct ReportPipeline {
    config: ReportConfig,
    assembler: Assembler,
    narrator: Narrator,
}

impl ReportPipeline {
    /// Pipeline without an external generator
    #[must_use]
    pub fn new(config: ReportConfig) -> Self {
        let narrator = Narrator::new(config.effective_narrative()).with_timeout(config.generator.timeout());
        Self {
            assembler: Assembler::new(config.assembler.clone()),
            narrator,
            config,
        }
    }

    /// Pipeline with the generator described by the config's settings
    ///
    /// A generator that cannot be built is logged and left out.
    #[must_use]
    pub fn from_config(config: ReportConfig) -> Self {
        let generator = match config.generator.generator() {
            Ok(generator) => generator,
            Err(e) => {
                tracing::error!("generator unavailable: {e}");
                None
            }
        };
        let pipeline = Self::new(config);
        match generator {
            Some(generator) => pipeline.with_narrator(|n| n.with_generator(generator)),
            None => pipeline,
        }
    }

    /// Adjust the narrator
    #[must_use]
    pub fn with_narrator(mut self, adjust: impl FnOnce(Narrator) -> Narrator) -> Self {
        self.narrator = adjust(self.narrator);
        self
    }

    /// Configuration in use
    #[must_use]
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Open source files; unreadable ones are recorded as unavailable
    #[must_use]
    pub fn load_sources(&self, paths: &[(PathBuf, SourceRole)]) -> SourceSet {
        let mut set = SourceSet::new();
        for (path, role) in paths {
            self.load_into(&mut set, path, *role);
        }
        tracing::info!(
            documents = set.len(),
            unavailable = set.unavailable().len(),
            "sources loaded"
        );
        set
    }

    fn load_into(&self, set: &mut SourceSet, path: &Path, role: SourceRole) {
        match load_path(path, role, &self.config.load) {
            Ok(documents) => documents.into_iter().for_each(|d| set.insert(d)),
            Err(e) => {
                tracing::warn!(path = %path.display(), "source unavailable: {e}");
                set.mark_unavailable(path.display().to_string(), e.to_string());
            }
        }
    }

    /// Assemble and narrate
    pub async fn run(&self, sources: &SourceSet) -> Report {
        let assembly = self.assembler.assemble(sources);
        for diagnostic in &assembly.diagnostics {
            tracing::debug!(?diagnostic, "assembly diagnostic");
        }
        let narrative = self.narrator.narrate(&assembly.dataset).await;
        tracing::info!(
            fields = assembly.dataset.len(),
            generated = narrative.is_generated(),
            "report ready"
        );
        Report {
            dataset: assembly.dataset,
            provenance: assembly.provenance,
            diagnostics: assembly.diagnostics,
            narrative,
            quantity_fields: self.config.quantity_fields.clone(),
        }
    }

    /// Load then run
    pub async fn run_paths(&self, paths: &[(PathBuf, SourceRole)]) -> Report {
        let sources = self.load_sources(paths);
        self.run(&sources).await
    }
}
