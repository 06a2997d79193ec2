//! Prompt construction
//!
//! The instruction pair sent to the generator. The user instruction embeds
//! only figures read from the dataset; nothing else about the organisation is
//! disclosed to the model.

use crate::config::{NarrativeConfig, NarrativeLanguage, Sampling};
use crate::facts::{percent, Facts};
use ghg_dataset::Dataset;
use serde::Serialize;

/// Request handed to a [`NarrativeGenerator`](crate::NarrativeGenerator)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NarrativeRequest {
    /// Fixed system instruction
    pub system: String,
    /// Data-bearing user instruction
    pub user: String,
    /// Sampling parameters
    pub sampling: Sampling,
}

/// Builds [`NarrativeRequest`]s from a dataset
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    config: NarrativeConfig,
}

impl PromptBuilder {
    /// Create builder
    #[must_use]
    pub fn new(config: NarrativeConfig) -> Self {
        Self { config }
    }

    /// Build the request for a dataset
    #[must_use]
    pub fn build(&self, dataset: &Dataset) -> NarrativeRequest {
        let facts = Facts::gather(&self.config, dataset);
        NarrativeRequest {
            system: self.system_instruction(),
            user: self.user_instruction(&facts),
            sampling: self.config.sampling.clone(),
        }
    }

    /// Fixed system instruction
    #[must_use]
    pub fn system_instruction(&self) -> String {
        let limit = self.config.char_limit;
        match self.config.language {
            NarrativeLanguage::English => format!(
                "You are a carbon accounting report assistant. Your only task is to polish the wording \
                 of the emission data provided. Never invent, forecast or estimate any figure.\n\
                 Rules:\n\
                 1. Use only the data provided.\n\
                 2. Add no information that is not in the data.\n\
                 3. Keep a professional, objective tone.\n\
                 4. Describe the emission structure and the proportions between scopes.\n\
                 5. Stay within {limit} characters.\n\
                 6. Output plain text only, with no Markdown, headings, lists or emphasis.\n\
                 7. Do not use speculative words such as estimated, approximately or likely.\n\
                 8. If data is incomplete, say \"data pending\".\n\
                 You rephrase; you do not analyse."
            ),
            NarrativeLanguage::Chinese => format!(
                "你是一个专业的碳核算报告助手。你的唯一任务是对提供的排放数据进行文本润色，严禁编造任何数据。\n\
                 严格要求：\n\
                 1. 你只能使用我提供的数据进行文本润色\n\
                 2. 严禁编造、预测、估算任何数据\n\
                 3. 严禁添加任何未在数据中出现的信息\n\
                 4. 语气必须专业、客观\n\
                 5. 重点描述排放结构（各范围之间的比例关系）\n\
                 6. 篇幅控制在{limit}字以内\n\
                 7. 只输出纯文本内容，不要包含任何Markdown格式\n\
                 8. 不要使用\"预计\"、\"可能\"、\"大约\"等推测性词汇\n\
                 9. 如果数据不完整，如实说明\"数据待补充\"\n\
                 你的角色是文本润色，不是数据分析师。"
            ),
        }
    }

    fn user_instruction(&self, facts: &Facts) -> String {
        let limit = self.config.char_limit;
        let context = self.data_context(facts);
        match self.config.language {
            NarrativeLanguage::English => format!(
                "Write a professional executive summary strictly from the following key emission data:\n\n\
                 {context}\n\n\
                 Requirements:\n\
                 - use only the data above\n\
                 - describe the emission structure and proportions\n\
                 - stay within {limit} characters\n\
                 - plain text only"
            ),
            NarrativeLanguage::Chinese => format!(
                "请根据以下企业提供的关键排放数据，撰写一段专业的\"执行摘要\"。你必须严格基于以下数据进行文本润色：\n\n\
                 {context}\n\n\
                 要求：\n\
                 - 仅使用上述数据进行文本润色\n\
                 - 描述排放结构和比例关系\n\
                 - 控制在{limit}字以内\n\
                 - 输出纯文本格式"
            ),
        }
    }

    /// Data lines embedded in the user instruction
    #[must_use]
    pub fn data_context(&self, facts: &Facts) -> String {
        let lang = facts.language;
        let (entity, period, total, structure, none) = match lang {
            NarrativeLanguage::English => ("Entity", "Period", "Total emissions", "Structure", "pending analysis"),
            NarrativeLanguage::Chinese => ("企业", "年份", "总排放", "排放结构", "数据待分析"),
        };
        let sep = match lang {
            NarrativeLanguage::English => ": ",
            NarrativeLanguage::Chinese => "：",
        };

        let mut lines = vec![
            format!("{entity}{sep}{}", facts.entity_text()),
            format!("{period}{sep}{}", facts.period_text()),
            format!("{total}{sep}{}", facts.total_text()),
        ];
        for part in &facts.parts {
            lines.push(format!("{}{sep}{}", part.label, facts.quantity(part.value)));
        }

        let shares: Vec<String> = facts
            .parts
            .iter()
            .filter(|p| p.value > 0.0)
            .filter_map(|p| {
                let share = percent(p.share?);
                Some(match lang {
                    NarrativeLanguage::English => format!("{} {share}", p.label),
                    NarrativeLanguage::Chinese => format!("{}占比{share}", p.label),
                })
            })
            .collect();
        let shares = if shares.is_empty() { none.to_string() } else { shares.join(", ") };
        lines.push(format!("{structure}{sep}{shares}"));
        lines.join("\n")
    }
}
