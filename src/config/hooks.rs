//! Lifecycle event hooks
//!
//! Callers observe requests through a fixed-signature listener. Every method has
//! a no-op default, so implementors only override the events they care about.

use crate::models::{BatchSummary, CompletionRequest};
use crate::utils::error::AppError;
use std::time::Duration;

/// Listener invoked by the orchestrators around each completion
pub trait EventHooks: Send + Sync {
    /// Before a completion request is sent (once per attempt)
    fn on_start(&self, _request: &CompletionRequest) {}

    /// After a request produced a usable result
    fn on_complete(&self, _request: &CompletionRequest, _elapsed: Duration) {}

    /// After an operation failed terminally
    fn on_error(&self, _request: &CompletionRequest, _error: &AppError) {}

    /// When a wait caused by an upstream rate limit begins
    fn on_rate_limit(&self, _wait: Duration) {}

    /// After a batch or multi-target operation finished
    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}

/// Hooks that do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl EventHooks for NoopHooks {}
