//! AI Translator Library
//!
//! Turns an OpenAI-compatible completion API into a translation and
//! summarization service with rate limiting, retries and defensive parsing of
//! model output

pub mod config;
pub mod facade;
pub mod models;
pub mod services;
pub mod utils;

// Re-export common types
pub use config::{EventHooks, NoopHooks, Settings};
pub use facade::AiTranslator;
pub use models::{BatchOutcome, ParsedSummary, ParsedTranslation, TieredSummary, TranslateOptions};
pub use services::{
    CompletionClient, OpenAIClient, RateLimiter, ResponseParser, ServiceContext, Summarizer, Translator,
};
pub use utils::error::{AppError, AppResult};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get version information
pub fn version_info() -> String {
    format!("{} v{} - {}", NAME, VERSION, DESCRIPTION)
}
