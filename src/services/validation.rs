//! Input validation
//!
//! Every public entry point runs its inputs through here before doing any
//! other work, so the same typed errors come back whichever operation failed.

use crate::config::LimitsConfig;
use crate::utils::error::{helpers, AppError, AppResult};

/// Size and shape checks applied before any network call
#[derive(Debug, Clone)]
pub struct InputValidator {
    limits: LimitsConfig,
}

impl InputValidator {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    /// Reject texts longer than `max_text_length` characters
    pub fn validate_text(&self, text: &str) -> AppResult<()> {
        let length = text.chars().count();
        if length > self.limits.max_text_length {
            return Err(AppError::TextTooLong {
                length,
                max: self.limits.max_text_length,
            });
        }
        Ok(())
    }

    /// Check the batch size, then every member
    pub fn validate_batch(&self, texts: &[String]) -> AppResult<()> {
        if texts.len() > self.limits.max_batch_size {
            return Err(AppError::BatchTooLarge {
                size: texts.len(),
                max: self.limits.max_batch_size,
            });
        }
        texts.iter().try_for_each(|text| self.validate_text(text))
    }

    pub fn validate_targets(&self, count: usize) -> AppResult<()> {
        if count == 0 {
            return Err(helpers::validation_error("at least one target language is required"));
        }
        if count > self.limits.max_batch_size {
            return Err(AppError::BatchTooLarge {
                size: count,
                max: self.limits.max_batch_size,
            });
        }
        Ok(())
    }

    pub fn validate_max_words(&self, max_words: u32) -> AppResult<()> {
        if max_words == 0 {
            return Err(helpers::validation_error("max_words must be a positive integer"));
        }
        Ok(())
    }

    /// Tier bounds must be positive and strictly increasing
    pub fn validate_tiers(&self, short: u32, medium: u32, long: u32) -> AppResult<()> {
        self.validate_max_words(short)?;
        if medium <= short || long <= medium {
            return Err(helpers::validation_error(format!(
                "summary tiers must be strictly increasing (short {} < medium {} < long {})",
                short, medium, long
            )));
        }
        Ok(())
    }
}
