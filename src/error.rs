// src/error.rs

//! Unified error handling for the dashboard.
//!
//! Operator cancellation is deliberately absent here: it travels as
//! [`crate::pipeline::Aborted`] so callers can tell "stopped" apart from
//! "failed".

use std::fmt;

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// The remote site misbehaved or the page did not have the expected shape
    #[error("Remote error for {context}: {message}")]
    Remote { context: String, message: String },

    /// A bounded remote wait ran out
    #[error("Timed out after {secs}s waiting for {what}")]
    Timeout { what: String, secs: u64 },

    /// The webhook answered with something other than 200
    #[error("Publish rejected with HTTP {status}: {body}")]
    Publish { status: u16, body: String },

    /// A sync run is already in flight
    #[error("A sync run is already in progress")]
    Busy,

    /// A background run panicked or was torn down
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Friend list operation failed
    #[error("Friend error: {0}")]
    Friend(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote error with context.
    pub fn remote(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a timeout error.
    pub fn timeout(what: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            what: what.into(),
            secs,
        }
    }

    /// Create a friend list error.
    pub fn friend(message: impl Into<String>) -> Self {
        Self::Friend(message.into())
    }
}
