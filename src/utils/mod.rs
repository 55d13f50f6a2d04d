//! Utilities module
//!
//! Contains error handling, logging and metrics

pub mod error;
pub mod logging;
pub mod metrics;
