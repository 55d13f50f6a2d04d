//! Logging utilities
//!
//! Shared logging configuration and helper functions

use crate::config::settings::LoggingConfig;
use crate::models::openai::OpenAIRequest;
use anyhow::Result;
use tracing::info;

/// Set to true to include full prompts in debug logs
/// Default is false to reduce log verbosity
pub const VERBOSE_REQUEST_LOGGING: bool = false;

/// Initialize logging system
///
/// Installs a global `tracing` subscriber. Returns an error if one is already set,
/// so library users who manage their own subscriber can ignore the result.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_current_span(false)
            .with_span_list(false)
            .finish())
    } else {
        // Human readable format (development environment)
        Box::new(tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .finish())
    };

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    Ok(())
}

/// Truncate a string with a note about original length
pub fn truncate_content(s: &str, max_len: usize) -> String {
    let total = s.chars().count();
    if total > max_len {
        let head: String = s.chars().take(max_len).collect();
        format!("{}... ({} chars truncated)", head, total - max_len)
    } else {
        s.to_string()
    }
}

/// Create a filtered summary of a completion request for logging
/// Keeps original structure but truncates the prompt
pub fn create_request_log_summary(request: &OpenAIRequest) -> serde_json::Value {
    if VERBOSE_REQUEST_LOGGING {
        serde_json::to_value(request).unwrap_or(serde_json::json!({"error": "serialize failed"}))
    } else {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role,
                    "content": msg.content.as_ref().map(|c| truncate_content(&c.extract_text(), 200)),
                })
            })
            .collect();

        serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::{OpenAIContent, OpenAIMessage};

    #[test]
    fn test_truncate_content() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("abcdefghij", 4), "abcd... (6 chars truncated)");
        // multi-byte characters must not panic
        assert_eq!(truncate_content("ééééé", 2), "éé... (3 chars truncated)");
    }

    #[test]
    fn test_request_log_summary_truncates_prompt() {
        let request = OpenAIRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![OpenAIMessage::user("x".repeat(500))],
            max_tokens: Some(100),
            temperature: Some(0.3),
        };

        let summary = create_request_log_summary(&request);
        let content = summary["messages"][0]["content"].as_str().unwrap();
        assert!(content.contains("chars truncated"));
        assert_eq!(summary["model"], "gpt-4o-mini");
        assert!(matches!(request.messages[0].content, Some(OpenAIContent::Text(_))));
    }
}
