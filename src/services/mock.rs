//! Scripted completion client
//!
//! Stands in for the HTTP client so orchestration can be exercised without
//! network access. Responses are served from a queue first, then from an
//! optional responder function.

use super::client::CompletionClient;
use crate::models::CompletionRequest;
use crate::utils::error::{helpers, AppError, AppResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Instant;

type Responder = Box<dyn Fn(&CompletionRequest) -> AppResult<String> + Send + Sync>;

/// A request observed by [`MockClient`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: CompletionRequest,
    pub at: Instant,
}

/// In-memory [`CompletionClient`] with scripted replies
#[derive(Default)]
pub struct MockClient {
    script: Mutex<VecDeque<AppResult<String>>>,
    responder: Option<Responder>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every unscripted request with `responder`
    pub fn responding_with<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> AppResult<String> + Send + Sync + 'static,
    {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Queue a raw model reply
    pub fn with_response(self, raw: impl Into<String>) -> Self {
        self.push(Ok(raw.into()));
        self
    }

    /// Queue a failure
    pub fn with_error(self, error: AppError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn push(&self, reply: AppResult<String>) {
        lock(&self.script).push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .map(|call| call.request.prompt.clone())
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CompletionClient for MockClient {
    async fn complete(&self, request: CompletionRequest) -> AppResult<String> {
        lock(&self.calls).push(RecordedCall {
            request: request.clone(),
            at: Instant::now(),
        });

        let scripted = lock(&self.script).pop_front();
        match (scripted, &self.responder) {
            (Some(reply), _) => reply,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(helpers::invalid_response("mock client has no reply queued", "")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A well-formed translation envelope
pub fn translation_envelope(source: &str, target: &str, from: &str, to: &str) -> String {
    json!({
        "content": {"source": source, "target": target},
        "metadata": {"source_locale": from, "target_locale": to, "operation": "translation"}
    })
    .to_string()
}

/// A well-formed summary envelope
pub fn summary_envelope(summary: &str, language: &str) -> String {
    json!({
        "content": {"summary": summary},
        "metadata": {"target_locale": language, "operation": "summary"}
    })
    .to_string()
}

/// A well-formed batch reply with one entry per item, indexed from 0
pub fn batch_envelope<S: AsRef<str>>(items: &[S]) -> String {
    let translations: Vec<_> = items
        .iter()
        .enumerate()
        .map(|(index, target)| json!({"index": index, "target": target.as_ref()}))
        .collect();
    json!({ "translations": translations }).to_string()
}
