//! HTTP client integration tests
//!
//! Run the OpenAI client against a local mock server to check the request body
//! and the classification of every kind of failure.

use aitranslator::config::Settings;
use aitranslator::models::{CompletionRequest, TranslateOptions};
use aitranslator::services::mock::MockClient;
use aitranslator::services::{CompletionClient, OpenAIClient, Translator};
use aitranslator::AppError;
use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::with_api_key("test-key");
    settings.api.base_url = server.base_url();
    settings.retry.base_delay_ms = 1;
    settings.retry.rate_limit_delay_ms = 1;
    settings
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

#[tokio::test]
async fn test_request_carries_auth_model_and_defaults() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key")
                .json_body_partial(r#"{"model": "gpt-4o-mini", "max_tokens": 4000, "messages": [{"role": "user", "content": "Hello"}]}"#);
            then.status(200).json_body(completion_body("raw model text"));
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    let text = client.complete(CompletionRequest::new("Hello")).await.unwrap();

    assert_eq!(text, "raw model text");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_per_request_overrides_are_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .json_body_partial(r#"{"max_tokens": 50}"#);
            then.status(200).json_body(completion_body("ok"));
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    let request = CompletionRequest::new("Hello").with_max_tokens(Some(50));
    assert_eq!(client.complete(request).await.unwrap(), "ok");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_unauthorized_is_never_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(401).json_body(json!({
                "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
            }));
        })
        .await;

    let translator = Translator::from_settings(&settings_for(&server)).unwrap();
    let err = translator
        .translate("Hello", "en", "fr", &TranslateOptions::default())
        .await
        .unwrap_err();

    match err {
        AppError::Authentication { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_forbidden_is_authentication_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(403).body("forbidden");
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    let err = client.complete(CompletionRequest::new("Hi")).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication { status: 403, .. }));
}

#[tokio::test]
async fn test_too_many_requests_carries_retry_after() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).header("Retry-After", "2").body("slow down");
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    let err = client.complete(CompletionRequest::new("Hi")).await.unwrap_err();

    assert!(err.is_rate_limit());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    // The client itself never retries
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_unrepresentable_retry_after_is_capped() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).header("Retry-After", "1e30").body("slow down");
        })
        .await;

    let mut settings = settings_for(&server);
    settings.retry.max_delay_ms = 2_000;
    let client = OpenAIClient::from_settings(&settings).unwrap();
    let err = client.complete(CompletionRequest::new("Hi")).await.unwrap_err();

    assert!(err.is_rate_limit());
    assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_server_error_is_api_error_with_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).json_body(json!({"error": {"message": "The server had an error"}}));
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    match client.complete(CompletionRequest::new("Hi")).await.unwrap_err() {
        AppError::Api { status, message, body } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "The server had an error");
            assert!(body.unwrap().contains("server had an error"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_envelope_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).body("<html>gateway page</html>");
        })
        .await;

    let client = OpenAIClient::from_settings(&settings_for(&server)).unwrap();
    match client.complete(CompletionRequest::new("Hi")).await.unwrap_err() {
        AppError::InvalidResponse { raw, .. } => assert_eq!(raw, "<html>gateway page</html>"),
        other => panic!("expected invalid response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_failure_is_api_error_without_status() {
    let mut settings = Settings::with_api_key("test-key");
    settings.api.base_url = "http://127.0.0.1:9".to_string();
    settings.api.timeout = 2;

    let client = OpenAIClient::from_settings(&settings).unwrap();
    let err = client.complete(CompletionRequest::new("Hi")).await.unwrap_err();
    assert!(matches!(err, AppError::Api { status: None, .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_translate_end_to_end_parses_envelope_in_prose() {
    let server = MockServer::start_async().await;
    let content = "Sure! Here it is:\n```json\n{\"content\": {\"source\": \"Hello\", \"target\": \"Bonjour\"}, \"metadata\": {\"source_locale\": \"en\", \"target_locale\": \"fr\"}}\n```";
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion_body(content));
        })
        .await;

    let translator = Translator::from_settings(&settings_for(&server)).unwrap();
    let text = translator
        .translate("Hello", "en", "fr", &TranslateOptions::default())
        .await
        .unwrap();
    assert_eq!(text, "Bonjour");
}

#[tokio::test]
async fn test_health_check() {
    let healthy = MockServer::start_async().await;
    healthy
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(completion_body("pong"));
        })
        .await;
    let client = OpenAIClient::from_settings(&settings_for(&healthy)).unwrap();
    assert!(client.health_check().await);

    let failing = MockServer::start_async().await;
    failing
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503);
        })
        .await;
    let client = OpenAIClient::from_settings(&settings_for(&failing)).unwrap();
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_client_batch_path_keeps_one_slot_per_input() {
    let client = MockClient::new()
        .with_response(r#"{"translations": [{"index": 0, "target": "un"}, {"index": 1, "target": "deux"}]}"#)
        .with_response(r#"{"translations": [{"index": 0, "target": "trois"}]}"#)
        .with_response(r#"["cinq"]"#);

    let texts: Vec<String> = ["one", "two", "three", "four", "five"]
        .iter()
        .map(|t| t.to_string())
        .collect();
    let build = |items: &[String]| CompletionRequest::new(items.join("|"));
    let results = client.translate_batch(&texts, 2, &build).await.unwrap();

    assert_eq!(
        results,
        vec![
            Some("un".to_string()),
            Some("deux".to_string()),
            None,
            None,
            Some("cinq".to_string()),
        ]
    );
    assert_eq!(client.prompts(), vec!["one|two", "three|four", "five"]);
}

#[tokio::test]
async fn test_client_batch_path_propagates_transport_errors() {
    let client = MockClient::new()
        .with_response(r#"["un", "deux"]"#)
        .with_error(AppError::Authentication {
            status: 401,
            message: "revoked".to_string(),
        });

    let texts: Vec<String> = vec!["one".into(), "two".into(), "three".into()];
    let build = |items: &[String]| CompletionRequest::new(items.join("|"));
    let err = client.translate_batch(&texts, 2, &build).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication { .. }));
}
