//! Process-wide `tracing` subscriber setup.
//!
//! `RUST_LOG` wins over the configured filter so operators can raise
//! verbosity for a single run without touching configuration.

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Raised when the configured filter directive cannot be parsed.
    #[error("invalid log filter `{filter}`: {message}")]
    Filter {
        /// Directive that failed to parse.
        filter: String,
        /// Parser error message.
        message: String,
    },
    /// Raised when a global subscriber is already installed.
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Builds the effective filter, preferring `RUST_LOG` over `fallback`.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when `fallback` is used and does not
/// parse.
pub fn env_filter(fallback: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(fallback).map_err(|err| LoggingError::Filter {
            filter: fallback.to_owned(),
            message: err.to_string(),
        })
    })
}

/// Installs the global subscriber writing to stderr.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber has
/// already been installed.
pub fn init(filter: &str, json: bool) -> Result<(), LoggingError> {
    let subscriber = tracing_subscriber::registry().with(env_filter(filter)?);
    let result = if json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|err| LoggingError::Init(err.to_string()))
}
