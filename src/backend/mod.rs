//! Inference backend abstraction
//!
//! This module defines the [`InferenceBackend`] trait the rest of the crate
//! is written against, plus the wire types it exchanges. The backend is a
//! locally hosted inference server exposing model management endpoints
//! (installed, load, unload, current model) and a chat endpoint whose
//! response body is a line-oriented event stream.
//!
//! The concrete HTTP implementation lives in [`http`].

pub mod http;

use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::{CallOptions, InitOptions};

pub use http::HttpBackend;

/// Streaming response body: chunks of bytes or transport errors
///
/// Transport errors inside the stream are recoverable; the stream session
/// logs them and keeps reading.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// One model available on the server's disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledModel {
    /// Model identifier (e.g. `llama3.2:latest`)
    pub name: String,
    /// On-disk install path the server loads from
    #[serde(default)]
    pub path: String,
    /// Size on disk in bytes
    #[serde(default)]
    pub size: u64,
}

/// How the model will be driven once loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// Conversational chat completion
    #[default]
    Chat,
    /// Raw text completion
    Completion,
}

/// Payload for a model load request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Resolved install path; may be empty when the model is not among the
    /// installed ones, in which case the server's own validation rejects it
    pub path: String,
    /// Load mode
    #[serde(default)]
    pub mode: LoadMode,
    /// Initialization options
    #[serde(default)]
    pub init: InitOptions,
    /// Call options
    #[serde(default)]
    pub call: CallOptions,
}

/// Server's accept/reject answer to a load request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadReply {
    /// Whether the load was accepted
    #[serde(default)]
    pub ok: bool,
    /// Server-supplied message, present mostly on rejection
    #[serde(default)]
    pub message: Option<String>,
}

/// Current model state as reported by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
    /// Whether a model is loaded and ready to serve
    #[serde(default)]
    pub loaded: bool,
    /// Identifier of the loaded model, empty when none
    #[serde(default)]
    pub model: String,
    /// Optional server diagnostic
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload for a chat turn request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's prompt text
    pub prompt: String,
}

/// Client interface to the inference server
///
/// `unload` is idempotent on the server side: unloading when nothing is
/// loaded succeeds. Implementations must not retry failed loads.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait InferenceBackend: Send + Sync {
    /// List models installed on the server's disk
    async fn installed(&self) -> Result<Vec<InstalledModel>>;

    /// Ask the server to load a model
    async fn load(&self, request: &LoadRequest) -> Result<LoadReply>;

    /// Ask the server to unload the current model (no-op when none)
    async fn unload(&self) -> Result<()>;

    /// Query the currently loaded model
    async fn model(&self) -> Result<ModelStatus>;

    /// Start a chat turn; the returned stream is the raw response body
    async fn chat(&self, request: &ChatRequest) -> Result<ByteStream>;
}
