//! Deterministic fallback summary
//!
//! Built purely from the dataset, so it states nothing the validator would
//! reject. Missing fields become placeholders; the result is never empty.

use crate::config::{NarrativeConfig, NarrativeLanguage};
use crate::facts::{percent, Facts};
use ghg_dataset::Dataset;

/// Template-based summary builder
#[derive(Debug, Clone)]
pub struct FallbackBuilder {
    config: NarrativeConfig,
}

impl FallbackBuilder {
    /// Builder for a narrative config
    #[must_use]
    pub fn new(config: NarrativeConfig) -> Self {
        Self { config }
    }

    /// Summary text
    #[must_use]
    pub fn build(&self, dataset: &Dataset) -> String {
        let facts = Facts::gather(&self.config, dataset);
        match facts.language {
            NarrativeLanguage::English => english(&facts),
            NarrativeLanguage::Chinese => chinese(&facts),
        }
    }
}

fn english(facts: &Facts) -> String {
    let mut text = format!(
        "{} completed its greenhouse gas inventory for {}, with total emissions of {}.",
        facts.entity_text(),
        facts.period_text(),
        facts.total_text()
    );

    let shares: Vec<String> = facts
        .parts
        .iter()
        .filter_map(|p| {
            let share = p.share?;
            Some(format!("{} emissions were {} ({} of the total)", p.label, facts.quantity(p.value), percent(share)))
        })
        .collect();
    if facts.has_positive_total() && !shares.is_empty() {
        text.push_str(" Of this, ");
        text.push_str(&shares.join(", and "));
        text.push('.');
    }

    text.push_str(" Major emission sources have been identified and will inform the next reduction plan.");
    text
}

fn chinese(facts: &Facts) -> String {
    let mut text = format!(
        "{}在{}完成温室气体盘查，总排放量为{}。",
        facts.entity_text(),
        facts.period_text(),
        facts.total_text()
    );

    let shares: Vec<String> = facts
        .parts
        .iter()
        .filter_map(|p| {
            let share = p.share?;
            Some(format!("{}排放{}（占比{}）", p.label, facts.quantity(p.value), percent(share)))
        })
        .collect();
    if facts.has_positive_total() && !shares.is_empty() {
        text.push_str("其中");
        text.push_str(&shares.join("，"));
        text.push('。');
    }

    text.push_str("企业已识别主要排放源，并将基于此数据制定下一步减排计划。");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghg_dataset::FieldValue;

    fn config() -> NarrativeConfig {
        NarrativeConfig::new("company", "year", "total")
            .with_constituent("part_a", "Scope 1")
            .with_constituent("part_b", "Scope 2")
    }

    fn acme() -> Dataset {
        Dataset::from_pairs([
            ("company", FieldValue::from("Acme")),
            ("year", FieldValue::from("2024")),
            ("total", FieldValue::from("100")),
            ("part_a", FieldValue::from("30")),
            ("part_b", FieldValue::from("70")),
        ])
    }

    #[test]
    fn english_summary_with_shares() {
        let text = FallbackBuilder::new(config()).build(&acme());
        assert_eq!(
            text,
            "Acme completed its greenhouse gas inventory for 2024, with total emissions of 100 tCO2e. \
             Of this, Scope 1 emissions were 30 tCO2e (30.0% of the total), and Scope 2 emissions were \
             70 tCO2e (70.0% of the total). Major emission sources have been identified and will inform \
             the next reduction plan."
        );
    }

    #[test]
    fn chinese_summary_matches_inventory_wording() {
        let config = config()
            .with_language(NarrativeLanguage::Chinese)
            .with_constituent("unused", "范围三");
        let text = FallbackBuilder::new(config).build(&acme());
        assert!(text.starts_with("Acme在2024完成温室气体盘查，总排放量为100tCO2e。"));
        assert!(text.contains("其中Scope 1排放30tCO2e（占比30.0%），Scope 2排放70tCO2e（占比70.0%）。"));
        assert!(!text.contains("范围三"));
    }

    #[test]
    fn zero_total_omits_shares() {
        let ds = Dataset::from_pairs([("total", 0.0), ("part_a", 5.0)]);
        let text = FallbackBuilder::new(config()).build(&ds);
        assert!(text.starts_with("The organisation completed its greenhouse gas inventory for the reporting year"));
        assert!(text.contains("0 tCO2e"));
        assert!(!text.contains('%'));
    }

    #[test]
    fn empty_dataset_still_produces_text() {
        let text = FallbackBuilder::new(config()).build(&Dataset::default());
        assert!(text.contains("data pending"));
    }
}
