//! HTTP client service
//!
//! Encapsulates HTTP communication with the completion API and classifies every
//! failure into an [`AppError`] variant. No retries happen here.

use crate::config::{ApiConfig, RetryConfig, Settings};
use crate::models::openai::*;
use crate::models::CompletionRequest;
use crate::services::parser::ResponseParser;
use crate::services::rate_limiter::RateLimiter;
use crate::utils::error::{helpers, AppError, AppResult};
use crate::utils::logging::{create_request_log_summary, truncate_content, VERBOSE_REQUEST_LOGGING};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};
use uuid::Uuid;

/// Builds the combined prompt for one chunk of a batch
pub type BatchPromptFn<'a> = dyn Fn(&[String]) -> CompletionRequest + Send + Sync + 'a;

/// Transport seam between the orchestrators and the upstream endpoint
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Issue one completion request and return the model's raw text
    async fn complete(&self, request: CompletionRequest) -> AppResult<String>;

    /// Client name for logs
    fn name(&self) -> &str;

    /// Translate `texts` through combined prompts of `batch_size` items each
    ///
    /// The result has one slot per input, in input order. A chunk whose response
    /// cannot be mapped back onto its items leaves `None` in each of its slots so
    /// the caller can fall back to per-item requests. Transport errors propagate.
    async fn translate_batch(
        &self,
        texts: &[String],
        batch_size: usize,
        build_prompt: &BatchPromptFn<'_>,
    ) -> AppResult<Vec<Option<String>>> {
        let mut results = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(batch_size.max(1)) {
            let raw = self.complete(build_prompt(chunk)).await?;

            match ResponseParser::parse_batch_response(&raw, chunk.len()) {
                Ok(items) => results.extend(items.into_values().map(Some)),
                Err(e) => {
                    warn!(
                        "Batch chunk of {} items could not be mapped back: {}",
                        chunk.len(),
                        e
                    );
                    results.extend(std::iter::repeat_with(|| None).take(chunk.len()));
                }
            }
        }

        Ok(results)
    }
}

/// OpenAI-compatible chat completion client
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    client: Client,
    config: ApiConfig,
    limiter: Arc<RateLimiter>,
    max_retry_after: Duration,
}

impl OpenAIClient {
    /// Create a client that shares `limiter` with any other holder of it
    pub fn new(config: ApiConfig, limiter: Arc<RateLimiter>) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(concat!("aitranslator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| helpers::config_error(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            limiter,
            max_retry_after: Duration::from_millis(RetryConfig::default().max_delay_ms),
        })
    }

    /// Upper bound applied to upstream `Retry-After` values
    pub fn with_max_retry_after(mut self, max_retry_after: Duration) -> Self {
        self.max_retry_after = max_retry_after;
        self
    }

    /// Create a client with its own rate limiter
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        let limiter = Arc::new(RateLimiter::from_config(&settings.rate_limit)?);
        Ok(Self::new(settings.api.clone(), limiter)?
            .with_max_retry_after(Duration::from_millis(settings.retry.max_delay_ms)))
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn build_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(&self, request: &CompletionRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage::user(request.prompt.clone())],
            max_tokens: Some(request.max_tokens.unwrap_or(self.config.max_tokens)),
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
        }
    }

    async fn send(&self, request: &CompletionRequest) -> AppResult<String> {
        self.limiter.acquire().await;

        let body = self.build_request(request);
        if VERBOSE_REQUEST_LOGGING {
            debug!("Completion request: {}", create_request_log_summary(&body));
        }

        let started = Instant::now();
        let response = self
            .client
            .post(self.build_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Api {
                status: e.status().map(|s| s.as_u16()),
                message: format!("Failed to send request: {}", e),
                body: None,
            })?;

        let result = self.handle_response(response).await;
        debug!(
            "Completion finished in {}ms ({})",
            started.elapsed().as_millis(),
            if result.is_ok() { "ok" } else { "error" }
        );
        result
    }

    /// Read the body and classify the outcome
    async fn handle_response(&self, response: Response) -> AppResult<String> {
        let status = response.status().as_u16();
        let retry_after = parse_retry_after(response.headers(), self.max_retry_after);
        let body = response
            .text()
            .await
            .map_err(|e| helpers::transport_error(format!("Failed to read response body: {}", e)))?;

        classify_response(status, retry_after, body)
    }

    /// Check API connection with a one-token request
    pub async fn health_check(&self) -> bool {
        debug!("Performing completion API health check");

        let request = CompletionRequest::new("ping")
            .with_max_tokens(Some(1))
            .with_context("operation", "health_check");

        match self.complete(request).await {
            Ok(_) => {
                info!("Completion API health check passed");
                true
            }
            Err(e) => {
                warn!("Completion API health check failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        let span = tracing::info_span!(
            "completion",
            request_id = %Uuid::new_v4(),
            operation = %request.operation()
        );
        self.send(&request).instrument(span).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Map a status code and body onto the completion text or a typed error
pub fn classify_response(status: u16, retry_after: Option<Duration>, body: String) -> AppResult<String> {
    match status {
        200..=299 => {
            let envelope: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
                helpers::invalid_response(format!("malformed completion envelope: {}", e), &body)
            })?;
            envelope.first_content().ok_or_else(|| {
                helpers::invalid_response("missing choices[0].message.content", &body)
            })
        }
        401 | 403 => Err(AppError::Authentication {
            status,
            message: error_message(&body).unwrap_or_else(|| "credentials rejected".to_string()),
        }),
        429 => {
            debug!("Upstream rate limit: {}", truncate_content(&body, 200));
            Err(AppError::RateLimit { retry_after })
        }
        _ => Err(AppError::Api {
            status: Some(status),
            message: error_message(&body).unwrap_or_else(|| format!("request failed with status {}", status)),
            body: Some(body).filter(|b| !b.trim().is_empty()),
        }),
    }
}

/// Message from an OpenAI error envelope, if the body is one
fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<OpenAIErrorResponse>(body)
        .ok()
        .map(|e| e.error.message)
        .filter(|m| !m.trim().is_empty())
}

/// `Retry-After` in delta-seconds form, capped at `max`; HTTP dates are ignored
fn parse_retry_after(headers: &HeaderMap, max: Duration) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let seconds: f64 = value.parse().ok()?;
    if !(seconds.is_finite() && seconds >= 0.0) {
        return None;
    }
    // Too large to represent still means "wait as long as allowed"
    Some(Duration::try_from_secs_f64(seconds).map_or(max, |wait| wait.min(max)))
}
