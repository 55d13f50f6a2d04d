//! Locale table
//!
//! Every orchestrator operation resolves its locale codes here before any
//! network call is made.

use crate::utils::error::{AppError, AppResult};

/// A validated locale and its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub code: String,
    pub name: String,
}

/// Lookup and validation of locale codes
pub trait LocaleRegistry: Send + Sync {
    /// Normalised code, or `UnsupportedLanguage` naming the input
    fn validate(&self, code: &str) -> AppResult<String>;

    fn display_name(&self, code: &str) -> Option<&str>;
}

/// Built-in table of languages the default prompts handle well
const LOCALES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("en-GB", "English (United Kingdom)"),
    ("en-US", "English (United States)"),
    ("es", "Spanish"),
    ("es-MX", "Spanish (Mexico)"),
    ("et", "Estonian"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fr-CA", "French (Canada)"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("ms", "Malay"),
    ("nb", "Norwegian Bokmål"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pt-BR", "Portuguese (Brazil)"),
    ("pt-PT", "Portuguese (Portugal)"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("th", "Thai"),
    ("tl", "Tagalog"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
];

/// Registry backed by the built-in table
///
/// Region variants outside the table are accepted when their base language is
/// supported, e.g. `de-AT` validates because `de` does.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLocales;

impl DefaultLocales {
    pub fn supported_codes(&self) -> impl Iterator<Item = &'static str> {
        LOCALES.iter().map(|(code, _)| *code)
    }

    fn lookup(code: &str) -> Option<&'static str> {
        LOCALES
            .iter()
            .find(|(known, _)| *known == code)
            .map(|(_, name)| *name)
    }
}

impl LocaleRegistry for DefaultLocales {
    fn validate(&self, code: &str) -> AppResult<String> {
        let normalized =
            normalize_locale(code).ok_or_else(|| AppError::UnsupportedLanguage(code.to_string()))?;

        if Self::lookup(&normalized).is_some() || Self::lookup(base_language(&normalized)).is_some() {
            Ok(normalized)
        } else {
            Err(AppError::UnsupportedLanguage(code.to_string()))
        }
    }

    fn display_name(&self, code: &str) -> Option<&str> {
        let normalized = normalize_locale(code)?;
        Self::lookup(&normalized).or_else(|| Self::lookup(base_language(&normalized)))
    }
}

/// Canonical BCP 47 casing: `pt_br` → `pt-BR`, `zh-hant` → `zh-Hant`
///
/// Returns `None` when the code is not shaped like a locale at all.
pub fn normalize_locale(code: &str) -> Option<String> {
    let code = code.trim();
    let mut parts = code.split(|c| c == '-' || c == '_');

    let language = parts.next()?;
    if !(2..=3).contains(&language.len()) || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut normalized = language.to_ascii_lowercase();
    for part in parts {
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        normalized.push('-');
        match part.len() {
            4 => {
                let (first, rest) = part.split_at(1);
                normalized.push_str(&first.to_ascii_uppercase());
                normalized.push_str(&rest.to_ascii_lowercase());
            }
            2 | 3 => normalized.push_str(&part.to_ascii_uppercase()),
            _ => normalized.push_str(&part.to_ascii_lowercase()),
        }
    }
    Some(normalized)
}

fn base_language(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale() {
        assert_eq!(normalize_locale("EN").as_deref(), Some("en"));
        assert_eq!(normalize_locale("pt_br").as_deref(), Some("pt-BR"));
        assert_eq!(normalize_locale("zh-hant").as_deref(), Some("zh-Hant"));
        assert_eq!(normalize_locale(" fr ").as_deref(), Some("fr"));
        assert!(normalize_locale("").is_none());
        assert!(normalize_locale("e").is_none());
        assert!(normalize_locale("en--US").is_none());
    }

    #[test]
    fn test_validate_names_offending_code() {
        let locales = DefaultLocales;
        assert_eq!(locales.validate("ZH-cn").unwrap(), "zh-CN");
        assert_eq!(locales.validate("de-AT").unwrap(), "de-AT");

        match locales.validate("xx") {
            Err(AppError::UnsupportedLanguage(code)) => assert_eq!(code, "xx"),
            other => panic!("expected UnsupportedLanguage, got {:?}", other),
        }
    }

    #[test]
    fn test_display_name_falls_back_to_base_language() {
        let locales = DefaultLocales;
        assert_eq!(locales.display_name("pt-BR"), Some("Portuguese (Brazil)"));
        assert_eq!(locales.display_name("de-AT"), Some("German"));
        assert_eq!(locales.display_name("xx"), None);
    }
}
