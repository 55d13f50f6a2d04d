//! Summarization orchestrator
//!
//! Same validation and retry discipline as the translator. Input text is
//! normalised before prompting.

use super::context::ServiceContext;
use super::locales::Locale;
use super::parser::ResponseParser;
use super::translator::summarize_outcome;
use crate::config::Settings;
use crate::models::{BatchOutcome, CompletionRequest, TieredSummary};
use crate::utils::error::AppResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A line made only of three or more `-`, `*`, `_` or `=` (spaces allowed)
static HORIZONTAL_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:-\s*){3,}|(?:\*\s*){3,}|(?:_\s*){3,}|(?:=\s*){3,})$").expect("valid regex")
});

/// Summarization operations
#[derive(Debug, Clone)]
pub struct Summarizer {
    ctx: ServiceContext,
}

impl Summarizer {
    pub fn new(ctx: ServiceContext) -> Self {
        Self { ctx }
    }

    pub fn from_settings(settings: &Settings) -> AppResult<Self> {
        Ok(Self::new(ServiceContext::from_settings(settings)?))
    }

    pub fn context(&self) -> &ServiceContext {
        &self.ctx
    }

    /// Summarize `text` in `language` using at most `max_words` words
    pub async fn summarize(&self, text: &str, language: &str, max_words: u32) -> AppResult<String> {
        self.ctx.validator().validate_max_words(max_words)?;
        self.ctx.validator().validate_text(text)?;
        let text = normalize_text(text);
        if text.is_empty() {
            return Ok(String::new());
        }

        let language = self.ctx.locale(language)?;
        self.summarize_one(&text, &language, max_words).await
    }

    /// Summarize `text` written in `from`, producing the summary in `to`
    pub async fn summarize_and_translate(
        &self,
        text: &str,
        from: &str,
        to: &str,
        max_words: u32,
    ) -> AppResult<String> {
        self.ctx.validator().validate_max_words(max_words)?;
        self.ctx.validator().validate_text(text)?;
        let text = normalize_text(text);
        if text.is_empty() {
            return Ok(String::new());
        }

        let from = self.ctx.locale(from)?;
        let to = self.ctx.locale(to)?;
        if from.code == to.code {
            return self.summarize_one(&text, &to, max_words).await;
        }

        let request = CompletionRequest::new(self.ctx.prompts().summary_translation(&text, &from, &to, max_words))
            .with_context("operation", "summarize_and_translate")
            .with_context("source_locale", from.code.as_str())
            .with_context("target_locale", to.code.as_str());

        let parsed = self
            .ctx
            .complete_parsed(request, ResponseParser::parse_translation_response)
            .await?;
        Ok(parsed.target)
    }

    /// Three independent summaries at increasing lengths
    pub async fn summarize_tiered(
        &self,
        text: &str,
        language: &str,
        short: u32,
        medium: u32,
        long: u32,
    ) -> AppResult<TieredSummary> {
        self.ctx.validator().validate_tiers(short, medium, long)?;
        self.ctx.validator().validate_text(text)?;
        let language = self.ctx.locale(language)?;

        let text = normalize_text(text);
        if text.is_empty() {
            return Ok(TieredSummary {
                short: String::new(),
                medium: String::new(),
                long: String::new(),
            });
        }

        let short = self.summarize_one(&text, &language, short).await?;
        self.ctx.pace(1).await;
        let medium = self.summarize_one(&text, &language, medium).await?;
        self.ctx.pace(2).await;
        let long = self.summarize_one(&text, &language, long).await?;

        Ok(TieredSummary { short, medium, long })
    }

    /// Summarize `text` once per language; fail-fast
    pub async fn summarize_to_multiple<S: AsRef<str>>(
        &self,
        text: &str,
        languages: &[S],
        max_words: u32,
    ) -> AppResult<BTreeMap<String, String>> {
        let outcome = self.fan_out(text, languages, max_words, true).await?;
        outcome
            .into_iter()
            .map(|(locale, result)| result.map(|summary| (locale, summary)))
            .collect()
    }

    /// Like [`summarize_to_multiple`](Self::summarize_to_multiple), recording
    /// each language's failure instead of aborting
    pub async fn summarize_to_multiple_with_fallback<S: AsRef<str>>(
        &self,
        text: &str,
        languages: &[S],
        max_words: u32,
    ) -> AppResult<BatchOutcome<String>> {
        self.fan_out(text, languages, max_words, false).await
    }

    async fn summarize_one(&self, text: &str, language: &Locale, max_words: u32) -> AppResult<String> {
        let request = CompletionRequest::new(self.ctx.prompts().summary(text, language, max_words))
            .with_context("operation", "summarize")
            .with_context("target_locale", language.code.as_str())
            .with_context("max_words", max_words.to_string());

        let parsed = self
            .ctx
            .complete_parsed(request, ResponseParser::parse_summary_response)
            .await?;
        Ok(parsed.summary)
    }

    async fn fan_out<S: AsRef<str>>(
        &self,
        text: &str,
        languages: &[S],
        max_words: u32,
        fail_fast: bool,
    ) -> AppResult<BatchOutcome<String>> {
        self.ctx.validator().validate_max_words(max_words)?;
        self.ctx.validator().validate_text(text)?;
        let languages = self.ctx.resolve_targets(languages)?;
        let text = normalize_text(text);

        let mut outcome: BatchOutcome<String> = BTreeMap::new();
        let mut calls = 0;
        for language in languages {
            if text.is_empty() {
                outcome.insert(language.code, Ok(String::new()));
                continue;
            }

            self.ctx.pace(calls).await;
            calls += 1;

            match self.summarize_one(&text, &language, max_words).await {
                Ok(summary) => {
                    outcome.insert(language.code, Ok(summary));
                }
                Err(e) if fail_fast || e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Summary in {} failed: {}", language.code, e);
                    outcome.insert(language.code, Err(e));
                }
            }
        }

        let summary = summarize_outcome("summarize_to_multiple", &outcome, 0);
        info!("Summarized into {}/{} languages", summary.succeeded, summary.total);
        self.ctx.finish_batch(summary);
        Ok(outcome)
    }
}

/// Trim line edges, drop horizontal rules and collapse runs of blank lines
pub fn normalize_text(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim) {
        if HORIZONTAL_RULE.is_match(line) {
            continue;
        }
        if line.is_empty() && lines.last().map_or(true, |last| last.is_empty()) {
            continue;
        }
        lines.push(line);
    }

    while lines.last().map_or(false, |last| last.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}
