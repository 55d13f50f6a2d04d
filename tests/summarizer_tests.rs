//! Summarizer orchestration tests

use aitranslator::config::Settings;
use aitranslator::models::CompletionRequest;
use aitranslator::services::mock::{summary_envelope, translation_envelope, MockClient};
use aitranslator::services::{ServiceContext, Summarizer};
use aitranslator::AppError;
use std::sync::Arc;

fn summarizer_with(client: MockClient) -> (Summarizer, Arc<MockClient>) {
    let mut settings = Settings::with_api_key("test-key");
    settings.limits.request_delay_ms = 0;
    settings.retry.base_delay_ms = 1;
    let client = Arc::new(client);
    (Summarizer::new(ServiceContext::new(client.clone(), &settings)), client)
}

/// Replies with "<language> in <max_words>" summaries
fn echo_client() -> MockClient {
    MockClient::responding_with(|request: &CompletionRequest| {
        let language = request.context.get("target_locale").cloned().unwrap_or_default();
        let words = request.context.get("max_words").cloned().unwrap_or_default();
        Ok(summary_envelope(&format!("{} in {}", language, words), &language))
    })
}

#[tokio::test]
async fn test_tier_bounds_are_validated_before_any_call() {
    let (summarizer, client) = summarizer_with(echo_client());

    for (short, medium, long) in [(25, 25, 150), (75, 25, 150), (25, 150, 150), (25, 150, 75)] {
        let err = summarizer
            .summarize_tiered("Some long text.", "en", short, medium, long)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", (short, medium, long));
    }
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_tiered_issues_three_independent_calls() {
    let (summarizer, client) = summarizer_with(echo_client());

    let tiers = summarizer
        .summarize_tiered("Some long text.", "en", 25, 75, 150)
        .await
        .unwrap();

    assert_eq!(tiers.short, "en in 25");
    assert_eq!(tiers.medium, "en in 75");
    assert_eq!(tiers.long, "en in 150");
    assert_eq!(client.call_count(), 3);
    assert!(client.prompts()[0].contains("at most 25 words"));
}

#[tokio::test]
async fn test_empty_text_returns_empty_without_calls() {
    let (summarizer, client) = summarizer_with(echo_client());

    assert_eq!(summarizer.summarize("", "en", 50).await.unwrap(), "");
    assert_eq!(summarizer.summarize("\n---\n\n", "en", 50).await.unwrap(), "");
    assert_eq!(summarizer.summarize_and_translate("", "en", "fr", 50).await.unwrap(), "");
    assert_eq!(client.call_count(), 0);
}

#[tokio::test]
async fn test_text_is_normalised_before_prompting() {
    let (summarizer, client) = summarizer_with(echo_client());

    summarizer
        .summarize("  Heading  \n\n\n\n***\nFirst paragraph.   \n\n\nSecond.", "en", 30)
        .await
        .unwrap();

    let prompt = &client.prompts()[0];
    assert!(prompt.contains("Heading\n\nFirst paragraph.\n\nSecond."));
    assert!(!prompt.contains("***"));
}

#[tokio::test]
async fn test_summarize_retries_empty_summary() {
    let (summarizer, client) = summarizer_with(
        MockClient::new()
            .with_response(r#"{"content": {"summary": ""}}"#)
            .with_response(summary_envelope("Recap.", "en")),
    );

    assert_eq!(summarizer.summarize("Text.", "en", 10).await.unwrap(), "Recap.");
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_summarize_and_translate_uses_one_combined_prompt() {
    let (summarizer, client) = summarizer_with(
        MockClient::new().with_response(translation_envelope("Recap.", "Résumé.", "en", "fr")),
    );

    let summary = summarizer
        .summarize_and_translate("A long English text.", "en", "fr", 40)
        .await
        .unwrap();

    assert_eq!(summary, "Résumé.");
    assert_eq!(client.call_count(), 1);
    assert!(client.prompts()[0].contains("writing the summary in French (fr)"));
}

#[tokio::test]
async fn test_summarize_to_multiple_keys_and_fail_fast() {
    let (summarizer, client) = summarizer_with(echo_client());
    let result = summarizer
        .summarize_to_multiple("Text.", &["en", "es", "de"], 20)
        .await
        .unwrap();
    assert_eq!(result.keys().collect::<Vec<_>>(), vec!["de", "en", "es"]);
    assert_eq!(client.call_count(), 3);

    let (summarizer, client) = summarizer_with(
        MockClient::new()
            .with_response(summary_envelope("One.", "en"))
            .with_error(AppError::Authentication {
                status: 403,
                message: "forbidden".to_string(),
            }),
    );
    let err = summarizer
        .summarize_to_multiple("Text.", &["en", "es", "de"], 20)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authentication { status: 403, .. }));
    assert_eq!(client.call_count(), 2);
}

#[tokio::test]
async fn test_unsupported_language_is_reported() {
    let (summarizer, client) = summarizer_with(echo_client());
    let err = summarizer.summarize("Text.", "xx", 10).await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedLanguage(code) if code == "xx"));
    assert_eq!(client.call_count(), 0);
}
