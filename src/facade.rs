//! Top-level facade
//!
//! A translator and a summarizer sharing one client, rate limiter and metrics
//! accumulator. `AiTranslator::global()` offers an opt-in process-wide instance;
//! everything else is constructed explicitly.

use crate::config::Settings;
use crate::models::{TieredSummary, TranslateOptions};
use crate::services::{ServiceContext, Summarizer, Translator};
use crate::utils::error::AppResult;
use crate::utils::metrics::MetricsSnapshot;
use once_cell::sync::OnceCell;
use tracing::info;

static GLOBAL: OnceCell<AiTranslator> = OnceCell::new();

/// Convenience entry point over [`Translator`] and [`Summarizer`]
#[derive(Debug, Clone)]
pub struct AiTranslator {
    translator: Translator,
    summarizer: Summarizer,
}

impl AiTranslator {
    /// Fresh instance with its own HTTP client
    pub fn new(settings: &Settings) -> AppResult<Self> {
        Ok(Self::from_context(ServiceContext::from_settings(settings)?))
    }

    /// Fresh instance configured from the environment
    pub fn from_env() -> AppResult<Self> {
        let settings = Settings::new()?;
        Self::new(&settings)
    }

    pub fn from_context(ctx: ServiceContext) -> Self {
        Self {
            translator: Translator::new(ctx.clone()),
            summarizer: Summarizer::new(ctx),
        }
    }

    /// Process-wide instance, built from the environment on first use
    ///
    /// Initialisation errors are returned and the next call tries again.
    pub fn global() -> AppResult<&'static AiTranslator> {
        GLOBAL.get_or_try_init(|| {
            info!("Initializing global {} v{}", crate::NAME, crate::VERSION);
            Self::from_env()
        })
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn summarizer(&self) -> &Summarizer {
        &self.summarizer
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.translator.context().metrics().snapshot()
    }

    pub async fn translate(&self, text: &str, from: &str, to: &str) -> AppResult<String> {
        self.translator
            .translate(text, from, to, &TranslateOptions::default())
            .await
    }

    pub async fn translate_auto(&self, text: &str, to: &str) -> AppResult<String> {
        self.translator
            .translate_auto(text, to, &TranslateOptions::default())
            .await
    }

    pub async fn summarize(&self, text: &str, language: &str, max_words: u32) -> AppResult<String> {
        self.summarizer.summarize(text, language, max_words).await
    }

    pub async fn summarize_tiered(&self, text: &str, language: &str) -> AppResult<TieredSummary> {
        self.summarizer
            .summarize_tiered(text, language, 25, 75, 150)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::mock::{summary_envelope, MockClient};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_facade_shares_metrics_between_services() {
        let client = Arc::new(
            MockClient::new()
                .with_response(summary_envelope("Short.", "en"))
                .with_response(summary_envelope("Longer.", "en")),
        );
        let facade = AiTranslator::from_context(ServiceContext::new(client, &Settings::with_api_key("test")));

        facade.summarize("Some text.", "en", 10).await.unwrap();
        facade.summarizer().summarize("Other text.", "en", 10).await.unwrap();
        assert_eq!(facade.metrics().successes, 2);
        assert_eq!(facade.translate("Hi", "en", "en").await.unwrap(), "Hi");
    }

    #[test]
    fn test_new_rejects_missing_api_key() {
        assert!(AiTranslator::new(&Settings::with_api_key("")).is_err());
    }
}
