//! Configuration management module
//!
//! Responsible for loading settings from the environment or a JSON file, and for
//! the lifecycle hooks callers can attach.

pub mod file;
pub mod hooks;
pub mod settings;

pub use hooks::{EventHooks, NoopHooks};
pub use settings::{
    ApiConfig, LimitsConfig, LoggingConfig, RateLimitConfig, RetryConfig, Settings,
    MAX_RATE_LIMIT_WINDOW,
};
