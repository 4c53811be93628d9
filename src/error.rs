//! Error types for Hearthchat
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Hearthchat operations
///
/// This enum encompasses all possible errors that can occur while talking
/// to the inference backend, managing the model session, and driving a
/// streaming chat turn.
#[derive(Error, Debug)]
pub enum HearthchatError {
    /// Backend-related errors (connection failures, non-success statuses)
    #[error("Backend error: {0}")]
    Backend(String),

    /// The server rejected a model load request
    #[error("Model load rejected: {0}")]
    LoadRejected(String),

    /// The server accepted a load but the confirmation query did not
    /// report the model as loaded
    #[error("Model load unconfirmed: {0}")]
    LoadUnconfirmed(String),

    /// Settings store errors (missing file, malformed entries)
    #[error("Settings error: {0}")]
    Settings(String),

    /// A stream dispatch callback failed
    #[error("Stream handler error: {0}")]
    Handler(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Hearthchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
