//! Shared service context
//!
//! Everything the orchestrators need, constructed explicitly and cloned cheaply.

use super::client::{BatchPromptFn, CompletionClient, OpenAIClient};
use super::locales::{DefaultLocales, Locale, LocaleRegistry};
use super::prompts::{DefaultPrompts, PromptBuilder};
use super::retry::RetryPolicy;
use super::validation::InputValidator;
use crate::config::{EventHooks, LimitsConfig, NoopHooks, Settings};
use crate::models::{BatchSummary, CompletionRequest};
use crate::utils::error::{AppError, AppResult};
use crate::utils::logging::truncate_content;
use crate::utils::metrics::Metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Collaborators and policies shared by `Translator` and `Summarizer`
#[derive(Clone)]
pub struct ServiceContext {
    client: Arc<dyn CompletionClient>,
    locales: Arc<dyn LocaleRegistry>,
    prompts: Arc<dyn PromptBuilder>,
    hooks: Arc<dyn EventHooks>,
    metrics: Arc<Metrics>,
    retry: RetryPolicy,
    validator: InputValidator,
}

impl ServiceContext {
    /// Wrap an existing client with the policies from `settings`
    pub fn new(client: Arc<dyn CompletionClient>, settings: &Settings) -> Self {
        Self {
            client,
            locales: Arc::new(DefaultLocales),
            prompts: Arc::new(DefaultPrompts),
            hooks: Arc::new(NoopHooks),
            metrics: Arc::new(Metrics::new(settings.metrics_enabled)),
            retry: RetryPolicy::new(settings.retry.clone()),
            validator: InputValidator::new(settings.limits.clone()),
        }
    }

    /// Validate `settings` and build the HTTP client they describe
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        settings.validate()?;
        let client = OpenAIClient::from_settings(settings)?;
        Ok(Self::new(Arc::new(client), settings))
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn EventHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_locales(mut self, locales: Arc<dyn LocaleRegistry>) -> Self {
        self.locales = locales;
        self
    }

    pub fn with_prompts(mut self, prompts: Arc<dyn PromptBuilder>) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn client(&self) -> &Arc<dyn CompletionClient> {
        &self.client
    }

    pub fn prompts(&self) -> &dyn PromptBuilder {
        self.prompts.as_ref()
    }

    pub fn hooks(&self) -> &dyn EventHooks {
        self.hooks.as_ref()
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn validator(&self) -> &InputValidator {
        &self.validator
    }

    pub fn limits(&self) -> &LimitsConfig {
        self.validator.limits()
    }

    /// Validate a locale code and attach its display name
    pub fn locale(&self, code: &str) -> AppResult<Locale> {
        let code = self.locales.validate(code)?;
        let name = self
            .locales
            .display_name(&code)
            .map(str::to_string)
            .unwrap_or_else(|| code.clone());
        Ok(Locale { code, name })
    }

    /// Validate every target up front; duplicates collapse, order is kept
    pub fn resolve_targets<S: AsRef<str>>(&self, targets: &[S]) -> AppResult<Vec<Locale>> {
        self.validator.validate_targets(targets.len())?;

        let mut resolved: Vec<Locale> = Vec::with_capacity(targets.len());
        for target in targets {
            let locale = self.locale(target.as_ref())?;
            if !resolved.iter().any(|known| known.code == locale.code) {
                resolved.push(locale);
            }
        }
        Ok(resolved)
    }

    /// Inter-call delay, skipped before the first call of an operation
    pub async fn pace(&self, calls_made: usize) {
        if calls_made > 0 {
            let delay = self.limits().request_delay();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    /// One completion, parsed by `parse`, under the retry policy
    ///
    /// Parse failures count as failed attempts, so an empty or malformed reply
    /// is retried exactly like an API error.
    pub async fn complete_parsed<T, P>(&self, request: CompletionRequest, parse: P) -> AppResult<T>
    where
        P: Fn(&str) -> AppResult<T>,
    {
        let request_ref = &request;
        let parse_ref = &parse;

        let result = self
            .retry
            .run(request.operation(), self.hooks(), &self.metrics, move |attempt| async move {
                self.hooks.on_start(request_ref);
                self.metrics.record_request();
                let started = Instant::now();

                let raw = self.client.complete(request_ref.clone()).await?;
                let parsed = parse_ref(&raw).map_err(|e| {
                    debug!(
                        "Attempt {} returned unusable output: {}",
                        attempt + 1,
                        truncate_content(&raw, 200)
                    );
                    e
                })?;

                let elapsed = started.elapsed();
                self.metrics.record_success(elapsed);
                self.hooks.on_complete(request_ref, elapsed);
                Ok(parsed)
            })
            .await;

        result.map_err(|e| self.fail(&request, e))
    }

    /// One combined prompt for all of `texts`, under the retry policy
    ///
    /// Slots the reply cannot account for come back as `None`. Hooks and
    /// metrics see it as a single request labelled by `build`.
    pub async fn complete_combined(
        &self,
        texts: &[String],
        build: &BatchPromptFn<'_>,
    ) -> AppResult<Vec<Option<String>>> {
        let request = build(texts);
        let request_ref = &request;

        let result = self
            .retry
            .run(request.operation(), self.hooks(), &self.metrics, move |_| async move {
                self.hooks.on_start(request_ref);
                self.metrics.record_request();
                let started = Instant::now();

                let slots = self.client.translate_batch(texts, texts.len(), build).await?;

                let elapsed = started.elapsed();
                self.metrics.record_success(elapsed);
                self.hooks.on_complete(request_ref, elapsed);
                Ok(slots)
            })
            .await;

        result.map_err(|e| self.fail(&request, e))
    }

    /// Record a terminal error and hand it back
    pub fn fail(&self, request: &CompletionRequest, error: AppError) -> AppError {
        if error.should_log_details() {
            error!("{} failed: {}", request.operation(), error);
        } else {
            error!("{} failed: {}", request.operation(), error.error_type());
        }
        self.metrics.record_failure();
        self.hooks.on_error(request, &error);
        error
    }

    pub fn finish_batch(&self, summary: BatchSummary) {
        debug!(
            "{} finished: {}/{} succeeded, {} via fallback",
            summary.operation, summary.succeeded, summary.total, summary.fallbacks
        );
        self.hooks.on_batch_complete(&summary);
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("client", &self.client.name())
            .field("retry", &self.retry)
            .field("validator", &self.validator)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::MockClient;

    fn context() -> ServiceContext {
        ServiceContext::new(Arc::new(MockClient::new()), &Settings::with_api_key("test"))
    }

    #[test]
    fn test_resolve_targets_dedups_in_order() {
        let targets = context().resolve_targets(&["FR", "de", "fr"]).unwrap();
        let codes: Vec<_> = targets.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["fr", "de"]);
    }

    #[test]
    fn test_resolve_targets_rejects_unknown_before_anything_else() {
        assert!(matches!(
            context().resolve_targets(&["fr", "zz"]),
            Err(AppError::UnsupportedLanguage(code)) if code == "zz"
        ));
        let empty: [&str; 0] = [];
        assert!(matches!(context().resolve_targets(&empty), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_locale_carries_display_name() {
        let locale = context().locale("ja").unwrap();
        assert_eq!(locale.name, "Japanese");
    }
}
