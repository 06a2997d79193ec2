//! Report configuration
//!
//! One TOML document describes a report: how sources are loaded, how the
//! dataset is assembled, what the summary talks about and which generator
//! writes it. Secrets come from the environment, never from the file.

use crate::error::ReportError;
use ghg_dataset::AssemblerConfig;
use ghg_narrative::{GenerationError, NarrativeConfig, NarrativeGenerator, OpenAiGenerator, DEFAULT_TIMEOUT};
use ghg_source::LoadOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// API key variable
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Base URL variable
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
/// Model name variable
pub const ENV_MODEL: &str = "GHG_NARRATIVE_MODEL";
/// Timeout variable, whole seconds
pub const ENV_TIMEOUT_SECS: &str = "GHG_NARRATIVE_TIMEOUT_SECS";

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn enabled() -> bool {
    true
}

/// External generator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Whether to call a generator at all
    #[serde(default = "enabled")]
    pub enabled: bool,
    /// API key; read from the environment only
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Service base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Model name overriding the narrative sampling model
    #[serde(default)]
    pub model: Option<String>,
    /// Bound on one generation call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GeneratorSettings {
    /// Settings from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Override fields from variables found by `lookup`
    ///
    /// Blank values are ignored; an unparsable timeout keeps the current one.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(model) = var(ENV_MODEL) {
            self.model = Some(model);
        }
        if let Some(raw) = var(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "ignoring invalid {ENV_TIMEOUT_SECS}"),
            }
        }
        self
    }

    /// With API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Generation timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Generator to use, or `None` when disabled or no key is configured
    ///
    /// # Errors
    /// Returns `GenerationError` if the HTTP client cannot be built
    pub fn generator(&self) -> Result<Option<Arc<dyn NarrativeGenerator>>, GenerationError> {
        if !self.enabled {
            return Ok(None);
        }
        let Some(key) = self.api_key.as_deref() else {
            tracing::info!("no {ENV_API_KEY} set; summaries use the fallback template");
            return Ok(None);
        };
        let mut client = OpenAiGenerator::new(key)?.with_request_timeout(self.timeout());
        if let Some(url) = &self.base_url {
            client = client.with_base_url(url.as_str());
        }
        Ok(Some(Arc::new(client)))
    }
}

/// Complete report configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Loader settings
    #[serde(default)]
    pub load: LoadOptions,
    /// Dataset layout
    #[serde(default)]
    pub assembler: AssemblerConfig,
    /// Summary subject
    #[serde(default)]
    pub narrative: NarrativeConfig,
    /// Generator
    #[serde(default)]
    pub generator: GeneratorSettings,
    /// Numeric fields formatted as quantities in the template context
    #[serde(default)]
    pub quantity_fields: Vec<String>,
}

impl ReportConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns `ReportError::Toml` for malformed or mistyped input
    pub fn from_toml_str(text: &str) -> Result<Self, ReportError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// - `ReportError::Io` if the file cannot be read
    /// - `ReportError::Toml` if it does not parse
    pub fn from_path(path: &Path) -> Result<Self, ReportError> {
        let text = std::fs::read_to_string(path).map_err(|e| ReportError::io_error(path, e))?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "report configuration loaded");
        Ok(config)
    }

    /// With generator settings
    #[must_use]
    pub fn with_generator(mut self, generator: GeneratorSettings) -> Self {
        self.generator = generator;
        self
    }

    /// Narrative config with the generator's model applied
    #[must_use]
    pub fn effective_narrative(&self) -> NarrativeConfig {
        match &self.generator.model {
            Some(model) => self.narrative.clone().with_model(model.as_str()),
            None => self.narrative.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn env_overrides() {
        let settings = GeneratorSettings::default().with_env_overrides(env(&[
            (ENV_API_KEY, " sk-test "),
            (ENV_BASE_URL, "http://localhost:9000/v1"),
            (ENV_MODEL, "qwen-plus"),
            (ENV_TIMEOUT_SECS, "5"),
        ]));
        assert_eq!(settings.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.base_url.as_deref(), Some("http://localhost:9000/v1"));
        assert_eq!(settings.model.as_deref(), Some("qwen-plus"));
        assert_eq!(settings.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn invalid_or_blank_values_are_ignored() {
        let settings =
            GeneratorSettings::default().with_env_overrides(env(&[(ENV_API_KEY, "  "), (ENV_TIMEOUT_SECS, "soon")]));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.timeout(), DEFAULT_TIMEOUT);
    }

    #[test]
    fn no_key_means_no_generator() {
        assert!(GeneratorSettings::default().generator().unwrap().is_none());
        let disabled = GeneratorSettings {
            enabled: false,
            ..GeneratorSettings::default().with_api_key("sk-test")
        };
        assert!(disabled.generator().unwrap().is_none());
        let on = GeneratorSettings::default().with_api_key("sk-test");
        assert_eq!(on.generator().unwrap().map(|g| g.name().to_string()).as_deref(), Some("openai"));
    }

    #[test]
    fn toml_never_carries_the_key() {
        let config = ReportConfig::from_toml_str(
            r#"
            quantity_fields = ["total"]

            [generator]
            model = "gpt-4o-mini"
            timeout_secs = 8
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.api_key, None);
        assert_eq!(config.generator.timeout_secs, 8);
        assert_eq!(config.effective_narrative().sampling.model, "gpt-4o-mini");
        assert_eq!(config.narrative.total_field, "total_emission_location");
        assert!(config.generator.enabled);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ReportConfig::from_path(Path::new("/nonexistent/report.toml")).unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
