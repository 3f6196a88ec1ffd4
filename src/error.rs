//! Error types for Ragbot
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Ragbot operations
///
/// Covers catalog problems, provider dispatch failures, session file
/// problems, unresolvable user input, and context material loading.
#[derive(Error, Debug)]
pub enum RagbotError {
    /// Engine catalog is malformed or references an unknown engine/model
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport, authentication, or malformed-response failure during dispatch
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Name of the engine that failed
        provider: String,
        /// Underlying cause
        message: String,
    },

    /// Requested session file does not exist
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session file exists but is not a valid serialized turn sequence
    #[error("Session {name} is corrupt: {message}")]
    SessionCorrupt {
        /// Session name
        name: String,
        /// Parser diagnostic
        message: String,
    },

    /// No usable prompt or invalid per-request input
    #[error("Input error: {0}")]
    Input(String),

    /// Instruction or dataset material could not be loaded
    #[error("Context load error: {0}")]
    ContextLoad(String),

    /// Session directory or file IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RagbotError {
    /// Build a provider error for the named engine
    ///
    /// # Examples
    ///
    /// ```
    /// use ragbot::error::RagbotError;
    ///
    /// let err = RagbotError::provider("openai", "connection refused");
    /// assert_eq!(err.to_string(), "Provider error (openai): connection refused");
    /// ```
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for Ragbot operations
///
/// Uses `anyhow::Error` so callers get context chains; typed variants are
/// recovered with `downcast_ref::<RagbotError>()`.
pub type Result<T> = anyhow::Result<T>;
