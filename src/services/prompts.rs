//! Prompt templates
//!
//! The orchestrators treat prompts as opaque text. The default templates ask
//! for the JSON envelopes `ResponseParser` understands.

use super::locales::Locale;
use crate::models::TranslateOptions;

/// Produces the exact prompt text sent upstream
pub trait PromptBuilder: Send + Sync {
    /// Single translation; `from` is `None` when the model must detect it
    fn translation(
        &self,
        text: &str,
        from: Option<&Locale>,
        to: &Locale,
        options: &TranslateOptions,
    ) -> String;

    /// Several texts, one language pair, answered as an indexed array
    fn batch_translation(
        &self,
        texts: &[String],
        from: &Locale,
        to: &Locale,
        options: &TranslateOptions,
    ) -> String;

    /// One text into several languages, answered as an array in target order
    fn multi_target_translation(
        &self,
        text: &str,
        from: &Locale,
        targets: &[Locale],
        options: &TranslateOptions,
    ) -> String;

    fn summary(&self, text: &str, language: &Locale, max_words: u32) -> String;

    /// Summary written directly in another language, answered as a translation envelope
    fn summary_translation(&self, text: &str, from: &Locale, to: &Locale, max_words: u32) -> String;
}

/// Built-in English-language instructions
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPrompts;

impl DefaultPrompts {
    fn guidelines(options: &TranslateOptions) -> String {
        let mut lines = Vec::new();
        if let Some(context) = options.context.as_deref().filter(|c| !c.trim().is_empty()) {
            lines.push(format!("Context: {}", context.trim()));
        }
        if options.preserve_formatting {
            lines.push(
                "Preserve all formatting exactly: markup, placeholders such as {name} or %s, and line breaks."
                    .to_string(),
            );
        }
        if lines.is_empty() {
            String::new()
        } else {
            format!("{}\n", lines.join("\n"))
        }
    }
}

fn describe(locale: &Locale) -> String {
    format!("{} ({})", locale.name, locale.code)
}

fn fenced(text: &str) -> String {
    format!("\"\"\"\n{}\n\"\"\"", text)
}

impl PromptBuilder for DefaultPrompts {
    fn translation(
        &self,
        text: &str,
        from: Option<&Locale>,
        to: &Locale,
        options: &TranslateOptions,
    ) -> String {
        let (task, source_locale) = match from {
            Some(from) => (
                format!(
                    "Translate the text below from {} to {}.",
                    describe(from),
                    describe(to)
                ),
                from.code.clone(),
            ),
            None => (
                format!(
                    "Detect the language of the text below and translate it to {}. \
                     Report the detected language as an ISO 639-1 code in metadata.source_locale.",
                    describe(to)
                ),
                "<detected code>".to_string(),
            ),
        };

        format!(
            "You are a professional translator. {task}\n{guidelines}\
             Respond with only a JSON object of this exact shape and nothing else:\n\
             {{\"content\": {{\"source\": \"<original text>\", \"target\": \"<translation>\"}}, \
             \"metadata\": {{\"source_locale\": \"{source_locale}\", \"target_locale\": \"{target_locale}\", \
             \"operation\": \"translation\"}}}}\n\n\
             Text:\n{text}",
            task = task,
            guidelines = Self::guidelines(options),
            source_locale = source_locale,
            target_locale = to.code,
            text = fenced(text),
        )
    }

    fn batch_translation(
        &self,
        texts: &[String],
        from: &Locale,
        to: &Locale,
        options: &TranslateOptions,
    ) -> String {
        let items = serde_json::to_string_pretty(texts).unwrap_or_else(|_| format!("{:?}", texts));
        format!(
            "You are a professional translator. Translate each item of the JSON array below from {from} to {to}.\n\
             {guidelines}\
             Translate every item independently and keep the original order.\n\
             Respond with only a JSON object of this exact shape and nothing else:\n\
             {{\"translations\": [{{\"index\": 0, \"target\": \"<translation of item 0>\"}}, ...]}}\n\
             The array must contain exactly {count} entries with indices 0 to {last}.\n\n\
             Items:\n{items}",
            from = describe(from),
            to = describe(to),
            guidelines = Self::guidelines(options),
            count = texts.len(),
            last = texts.len().saturating_sub(1),
            items = items,
        )
    }

    fn multi_target_translation(
        &self,
        text: &str,
        from: &Locale,
        targets: &[Locale],
        options: &TranslateOptions,
    ) -> String {
        let languages = targets
            .iter()
            .enumerate()
            .map(|(index, locale)| format!("{}: {}", index, describe(locale)))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a professional translator. Translate the text below from {from} into each of these \
             languages:\n{languages}\n{guidelines}\
             Respond with only a JSON object of this exact shape and nothing else:\n\
             {{\"translations\": [{{\"index\": 0, \"locale\": \"<code>\", \"target\": \"<translation>\"}}, ...]}}\n\
             The array must contain exactly {count} entries, one per language, using the indices listed above.\n\n\
             Text:\n{text}",
            from = describe(from),
            languages = languages,
            guidelines = Self::guidelines(options),
            count = targets.len(),
            text = fenced(text),
        )
    }

    fn summary(&self, text: &str, language: &Locale, max_words: u32) -> String {
        format!(
            "Summarize the text below in {language} using at most {max_words} words. \
             Keep the key facts and leave out commentary.\n\
             Respond with only a JSON object of this exact shape and nothing else:\n\
             {{\"content\": {{\"summary\": \"<summary>\"}}, \
             \"metadata\": {{\"target_locale\": \"{code}\", \"operation\": \"summary\"}}}}\n\n\
             Text:\n{text}",
            language = describe(language),
            max_words = max_words,
            code = language.code,
            text = fenced(text),
        )
    }

    fn summary_translation(&self, text: &str, from: &Locale, to: &Locale, max_words: u32) -> String {
        format!(
            "The text below is written in {from}. Summarize it using at most {max_words} words, \
             writing the summary in {to}.\n\
             Respond with only a JSON object of this exact shape and nothing else:\n\
             {{\"content\": {{\"source\": \"<summary in {from_code}>\", \"target\": \"<summary in {to_code}>\"}}, \
             \"metadata\": {{\"source_locale\": \"{from_code}\", \"target_locale\": \"{to_code}\", \
             \"operation\": \"summary_translation\"}}}}\n\n\
             Text:\n{text}",
            from = describe(from),
            to = describe(to),
            max_words = max_words,
            from_code = from.code,
            to_code = to.code,
            text = fenced(text),
        )
    }
}
