//! Data models module
//!
//! Wire structures of the completion API and the results returned to callers

use std::collections::HashMap;

pub mod openai;
pub mod translation;

pub use translation::{
    BatchOutcome, BatchSummary, ParsedSummary, ParsedTranslation, ResponseMetadata, TieredSummary,
    TranslateOptions,
};

/// One completion call as seen by the transport layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionRequest {
    /// Full prompt text sent as the user message
    pub prompt: String,
    /// Falls back to the configured default when `None`
    pub max_tokens: Option<u32>,
    /// Falls back to the configured default when `None`
    pub temperature: Option<f32>,
    /// Labels carried to logs and hooks; never sent upstream
    pub context: HashMap<String, String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Operation label, if one was attached
    pub fn operation(&self) -> &str {
        self.context.get("operation").map(String::as_str).unwrap_or("completion")
    }
}
