//! Service layer module
//!
//! Contains the completion client, rate limiter, response parser and the
//! translation and summarization orchestrators

pub mod client;
pub mod context;
pub mod locales;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parser;
pub mod prompts;
pub mod rate_limiter;
pub mod retry;
pub mod summarizer;
pub mod translator;
pub mod validation;

pub use client::{classify_response, BatchPromptFn, CompletionClient, OpenAIClient};
pub use context::ServiceContext;
pub use locales::{DefaultLocales, Locale, LocaleRegistry};
pub use parser::ResponseParser;
pub use prompts::{DefaultPrompts, PromptBuilder};
pub use rate_limiter::RateLimiter;
pub use retry::RetryPolicy;
pub use summarizer::Summarizer;
pub use translator::Translator;
pub use validation::InputValidator;
