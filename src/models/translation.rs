//! Translation and summary result models
//!
//! Structures recovered from model output and returned by the orchestrators

use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metadata block of a response envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Source locale reported (or detected) by the model
    #[serde(default, alias = "source_language", alias = "from", skip_serializing_if = "Option::is_none")]
    pub source_locale: Option<String>,
    /// Target locale reported by the model
    #[serde(default, alias = "target_language", alias = "to", skip_serializing_if = "Option::is_none")]
    pub target_locale: Option<String>,
    /// Operation kind ("translation", "summary", ...)
    #[serde(default, alias = "type", skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Any other fields the model emitted
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A successfully parsed translation envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTranslation {
    pub source: Option<String>,
    /// Never empty
    pub target: String,
    pub metadata: ResponseMetadata,
}

/// A successfully parsed summary envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedSummary {
    pub source: Option<String>,
    /// Never empty
    pub summary: String,
    pub metadata: ResponseMetadata,
}

/// Summaries of one text at three lengths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredSummary {
    pub short: String,
    pub medium: String,
    pub long: String,
}

/// Per-call translation options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateOptions {
    /// Overrides the configured default
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Overrides the configured default
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Free-form hint about the text (domain, audience, tone)
    #[serde(default)]
    pub context: Option<String>,
    /// Ask the model to keep markup, placeholders and line breaks intact
    #[serde(default)]
    pub preserve_formatting: bool,
    /// Request all targets in one prompt when there are enough of them
    #[serde(default)]
    pub batch_mode: bool,
}

impl TranslateOptions {
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn batched(mut self) -> Self {
        self.batch_mode = true;
        self
    }
}

/// Per-unit outcome of a partial-success operation, keyed by index or locale
pub type BatchOutcome<K> = BTreeMap<K, Result<String, AppError>>;

/// Counts reported to hooks when a multi-unit operation finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub operation: &'static str,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Units resolved through the per-item path after a batch prompt fell short
    pub fallbacks: usize,
}
