//! Translation orchestrator
//!
//! Single, auto-detected, multi-target and batched translation on top of a
//! [`ServiceContext`]. Every public operation validates its inputs before the
//! first network call.

use super::context::ServiceContext;
use super::locales::Locale;
use super::parser::ResponseParser;
use crate::config::Settings;
use crate::models::{BatchOutcome, BatchSummary, CompletionRequest, ParsedTranslation, TranslateOptions};
use crate::utils::error::{helpers, AppError, AppResult};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Translation operations
#[derive(Debug, Clone)]
pub struct Translator {
    ctx: ServiceContext,
}

impl Translator {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    /// Build a translator with its own HTTP client and rate limiter
    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(ServiceContext::from_settings(settings)?))
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Translate `text` from `from` to `to`
    ///
    /// Blank text comes back unchanged without a request, as does any text when
    /// both locales normalise to the same code.
    pub async fn translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        options: &TranslateOptions,
    ) -> AppResult<String> {
        self.ctx.validator().validate_text(text)?;
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let from = self.ctx.locale(from)?;
        let to = self.ctx.locale(to)?;
        if from.code == to.code {
            return Ok(text.to_string());
        }

        let parsed = self.translate_one(text, Some(&from), &to, options).await?;
        Ok(parsed.target)
    }

    /// Translate `text` into `to`, letting the model detect the source language
    pub async fn translate_auto(&self, text: &str, to: &str, options: &TranslateOptions) -> AppResult<String> {
        self.ctx.validator().validate_text(text)?;
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let to = self.ctx.locale(to)?;
        let parsed = self.translate_one(text, None, &to, options).await?;
        Ok(parsed.target)
    }

    /// Like [`translate_auto`](Self::translate_auto), keeping the full envelope
    ///
    /// `metadata.source_locale` holds the language the model detected.
    pub async fn translate_auto_detailed(
        &self,
        text: &str,
        to: &str,
        options: &TranslateOptions,
    ) -> AppResult<ParsedTranslation> {
        self.ctx.validator().validate_text(text)?;
        if text.trim().is_empty() {
            return Err(helpers::validation_error("text to translate is empty"));
        }

        let to = self.ctx.locale(to)?;
        self.translate_one(text, None, &to, options).await
    }

    /// Translate `text` into every locale in `targets`
    ///
    /// Fail-fast: the first target that fails terminally aborts the rest and
    /// its error is returned.
    pub async fn translate_to_multiple<S: AsRef<str>>(
        &self,
        text: &str,
        from: &str,
        targets: &[S],
        options: &TranslateOptions,
    ) -> AppResult<BTreeMap<String, String>> {
        let outcome = self.fan_out(text, from, targets, options, true).await?;
        outcome
            .into_iter()
            .map(|(locale, result)| result.map(|text| (locale, text)))
            .collect()
    }

    /// Like [`translate_to_multiple`](Self::translate_to_multiple), recording
    /// each target's failure instead of aborting
    ///
    /// Every requested locale appears as a key. Validation errors and rejected
    /// credentials still fail the whole call.
    pub async fn translate_to_multiple_with_fallback<S: AsRef<str>>(
        &self,
        text: &str,
        from: &str,
        targets: &[S],
        options: &TranslateOptions,
    ) -> AppResult<BatchOutcome<String>> {
        self.fan_out(text, from, targets, options, false).await
    }

    /// Translate every entry of `texts`; keys are exactly `0..texts.len()`
    ///
    /// Texts are sent in combined prompts of `batch_chunk_size` items. Items the
    /// combined reply cannot account for are retried one by one.
    pub async fn translate_batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        from: &str,
        to: &str,
        options: &TranslateOptions,
    ) -> AppResult<BTreeMap<usize, String>> {
        let outcome = self.batch(texts, from, to, options, true).await?;
        outcome
            .into_iter()
            .map(|(index, result)| result.map(|text| (index, text)))
            .collect()
    }

    /// Like [`translate_batch`](Self::translate_batch), recording each item's
    /// failure instead of aborting
    pub async fn translate_batch_with_fallback<S: AsRef<str>>(
        &self,
        texts: &[S],
        from: &str,
        to: &str,
        options: &TranslateOptions,
    ) -> AppResult<BatchOutcome<usize>> {
        self.batch(texts, from, to, options, false).await
    }

    /// One prompt, one parsed envelope, under the retry policy
    async fn translate_one(
        &self,
        text: &str,
        from: Option<&Locale>,
        to: &Locale,
        options: &TranslateOptions,
    ) -> AppResult<ParsedTranslation> {
        let operation = if from.is_some() { "translate" } else { "translate_auto" };
        let request = CompletionRequest::new(self.ctx.prompts().translation(text, from, to, options))
            .with_max_tokens(options.max_tokens)
            .with_temperature(options.temperature)
            .with_context("operation", operation)
            .with_context("source_locale", from.map_or("auto", |l| l.code.as_str()))
            .with_context("target_locale", to.code.as_str());

        self.ctx
            .complete_parsed(request, ResponseParser::parse_translation_response)
            .await
    }

    async fn fan_out<S: AsRef<str>>(
        &self,
        text: &str,
        from: &str,
        targets: &[S],
        options: &TranslateOptions,
        fail_fast: bool,
    ) -> AppResult<BatchOutcome<String>> {
        self.ctx.validator().validate_text(text)?;
        let from = self.ctx.locale(from)?;
        let targets = self.ctx.resolve_targets(targets)?;

        let mut outcome: BatchOutcome<String> = BTreeMap::new();
        let mut pending = Vec::with_capacity(targets.len());
        for target in targets.iter() {
            if text.trim().is_empty() || target.code == from.code {
                outcome.insert(target.code.clone(), Ok(text.to_string()));
            } else {
                pending.push(target.clone());
            }
        }

        let mut calls = 0;
        let mut fallbacks = 0;
        let threshold = self.ctx.limits().multi_target_batch_threshold;
        if options.batch_mode && pending.len() > threshold {
            let combined = self.translate_targets_combined(text, &from, &pending, options).await;
            calls += 1;

            match combined {
                Ok(results) => {
                    let mut missing = Vec::new();
                    for (target, result) in pending.into_iter().zip(results) {
                        match result {
                            Some(translated) => {
                                outcome.insert(target.code.clone(), Ok(translated));
                            }
                            None => missing.push(target),
                        }
                    }
                    pending = missing;
                }
                Err(e) if fail_fast || e.is_fatal() => return Err(e),
                Err(e) => warn!("Combined multi-target prompt failed, translating per locale: {}", e),
            }

            if !pending.is_empty() {
                fallbacks = pending.len();
                warn!(
                    "Combined multi-target reply missed {} locales, falling back to per-locale requests",
                    fallbacks
                );
                self.ctx.metrics().record_batch_fallback(fallbacks);
            }
        }

        for target in pending {
            self.ctx.pace(calls).await;
            calls += 1;

            match self.translate_one(text, Some(&from), &target, options).await {
                Ok(parsed) => {
                    outcome.insert(target.code, Ok(parsed.target));
                }
                Err(e) if fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Translation to {} failed: {}", target.code, e);
                    outcome.insert(target.code, Err(e));
                }
            }
        }

        let summary = summarize_outcome("translate_to_multiple", &outcome, fallbacks);
        info!(
            "Translated into {}/{} locales with {} requests",
            summary.succeeded, summary.total, calls
        );
        self.ctx.finish_batch(summary);
        Ok(outcome)
    }

    /// All targets in one prompt; one slot per target, in target order
    async fn translate_targets_combined(
        &self,
        text: &str,
        from: &Locale,
        targets: &[Locale],
        options: &TranslateOptions,
    ) -> AppResult<Vec<Option<String>>> {
        let codes: Vec<String> = targets.iter().map(|t| t.code.clone()).collect();
        let build = |_: &[String]| {
            CompletionRequest::new(self.ctx.prompts().multi_target_translation(text, from, targets, options))
                .with_max_tokens(options.max_tokens)
                .with_temperature(options.temperature)
                .with_context("operation", "translate_to_multiple")
                .with_context("source_locale", from.code.as_str())
                .with_context("item_count", targets.len().to_string())
        };

        self.ctx.complete_combined(&codes, &build).await
    }

    async fn batch<S: AsRef<str>>(
        &self,
        texts: &[S],
        from: &str,
        to: &str,
        options: &TranslateOptions,
        fail_fast: bool,
    ) -> AppResult<BatchOutcome<usize>> {
        let texts: Vec<String> = texts.iter().map(|t| t.as_ref().to_string()).collect();
        self.ctx.validator().validate_batch(&texts)?;
        let from = self.ctx.locale(from)?;
        let to = self.ctx.locale(to)?;

        let mut outcome: BatchOutcome<usize> = BTreeMap::new();
        let mut pending = Vec::new();
        for (index, text) in texts.iter().enumerate() {
            if text.trim().is_empty() || from.code == to.code {
                outcome.insert(index, Ok(text.clone()));
            } else {
                pending.push(index);
            }
        }

        let build = |items: &[String]| {
            CompletionRequest::new(self.ctx.prompts().batch_translation(items, &from, &to, options))
                .with_max_tokens(options.max_tokens)
                .with_temperature(options.temperature)
                .with_context("operation", "translate_batch")
                .with_context("source_locale", from.code.as_str())
                .with_context("target_locale", to.code.as_str())
                .with_context("item_count", items.len().to_string())
        };

        let chunk_size = self.ctx.limits().batch_chunk_size.max(1);
        let mut calls = 0;
        let mut unresolved = Vec::new();
        // A lone item gains nothing from the combined prompt
        let mut per_item = Vec::new();

        for chunk in pending.chunks(chunk_size) {
            if chunk.len() == 1 {
                per_item.push(chunk[0]);
                continue;
            }

            self.ctx.pace(calls).await;
            calls += 1;

            let chunk_texts: Vec<String> = chunk.iter().map(|&index| texts[index].clone()).collect();
            let combined = self.ctx.complete_combined(&chunk_texts, &build).await;

            match combined {
                Ok(results) => {
                    for (&index, result) in chunk.iter().zip(results) {
                        match result {
                            Some(translated) => {
                                outcome.insert(index, Ok(translated));
                            }
                            None => unresolved.push(index),
                        }
                    }
                }
                Err(e) if fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Combined batch prompt failed, translating {} items one by one: {}", chunk.len(), e);
                    unresolved.extend_from_slice(chunk);
                }
            }
        }

        let fallbacks = unresolved.len();
        if fallbacks > 0 {
            warn!("Falling back to per-item translation for {} items", fallbacks);
            self.ctx.metrics().record_batch_fallback(fallbacks);
        }

        per_item.extend(unresolved);
        per_item.sort_unstable();
        for index in per_item {
            self.ctx.pace(calls).await;
            calls += 1;

            match self.translate_one(&texts[index], Some(&from), &to, options).await {
                Ok(parsed) => {
                    outcome.insert(index, Ok(parsed.target));
                }
                Err(e) if fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Translation of batch item {} failed: {}", index, e);
                    outcome.insert(index, Err(e));
                }
            }
        }

        let summary = summarize_outcome("translate_batch", &outcome, fallbacks);
        info!(
            "Translated {}/{} batch items with {} requests",
            summary.succeeded, summary.total, calls
        );
        self.ctx.finish_batch(summary);
        Ok(outcome)
    }
}

/// Counts for `on_batch_complete`
pub(crate) fn summarize_outcome<K>(
    operation: &'static str,
    outcome: &BTreeMap<K, Result<String, AppError>>,
    fallbacks: usize,
) -> BatchSummary {
    let succeeded = outcome.values().filter(|result| result.is_ok()).count();
    BatchSummary {
        operation,
        total: outcome.len(),
        succeeded,
        failed: outcome.len() - succeeded,
        fallbacks,
    }
}
