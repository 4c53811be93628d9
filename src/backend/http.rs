//! HTTP client for the inference server
//!
//! [`HttpBackend`] implements [`InferenceBackend`](super::InferenceBackend)
//! over the server's REST surface:
//!
//! - `GET  /v1/models/installed` -- installed models with save paths
//! - `POST /v1/models/load`      -- load a model (accept/reject with message)
//! - `POST /v1/models/unload`    -- unload the current model, idempotent
//! - `GET  /v1/models/current`   -- current model status
//! - `POST /v1/chat`             -- chat turn; body is a line-oriented
//!   event stream consumed by the stream session
//!
//! A rejected load is not a transport failure: non-success statuses on the
//! load endpoint are folded into the [`LoadReply`] so the server's own
//! message reaches the caller verbatim.

use std::time::Duration;

use futures::TryStreamExt;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::backend::{
    ByteStream, ChatRequest, InferenceBackend, InstalledModel, LoadReply, LoadRequest, ModelStatus,
};
use crate::error::{HearthchatError, Result};

/// Response from the installed-models endpoint
#[derive(Debug, Deserialize)]
struct InstalledResponse {
    #[serde(default)]
    models: Vec<InstalledModel>,
}

/// HTTP implementation of [`InferenceBackend`]
///
/// # Examples
///
/// ```no_run
/// use hearthchat::backend::HttpBackend;
/// use url::Url;
///
/// let backend = HttpBackend::new(
///     Url::parse("http://localhost:8008").unwrap(),
/// ).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    /// Construct a backend client for `base`
    ///
    /// No network I/O is performed at construction time. Only a connect
    /// timeout is set: the chat response body streams for as long as
    /// generation runs, so overall deadlines are the caller's to impose
    /// at the transport layer.
    ///
    /// # Errors
    ///
    /// Returns an error if HTTP client initialization fails.
    pub fn new(base: Url) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("hearthchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                HearthchatError::Backend(format!("Failed to create HTTP client: {}", e))
            })?;

        tracing::info!("Initialized inference backend client: base={}", base);

        Ok(Self { client, base })
    }

    /// The configured base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| HearthchatError::Backend(format!("Invalid endpoint {}: {}", path, e)).into())
    }
}

#[async_trait::async_trait]
impl InferenceBackend for HttpBackend {
    async fn installed(&self) -> Result<Vec<InstalledModel>> {
        let url = self.endpoint("/v1/models/installed")?;
        tracing::debug!("Fetching installed models: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!("Failed to fetch installed models: {}", e);
            HearthchatError::Backend(format!("Failed to connect to inference server: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Server returned error {}: {}", status, error_text);
            return Err(HearthchatError::Backend(format!(
                "Server returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let body: InstalledResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse installed models response: {}", e);
            HearthchatError::Backend(format!("Failed to parse installed models: {}", e))
        })?;

        tracing::debug!("Server reports {} installed models", body.models.len());
        Ok(body.models)
    }

    async fn load(&self, request: &LoadRequest) -> Result<LoadReply> {
        let url = self.endpoint("/v1/models/load")?;
        tracing::debug!("Requesting model load: path={:?}", request.path);

        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Load request failed: {}", e);
                HearthchatError::Backend(format!("Load request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            // The server's rejection, not a transport failure. Preserve
            // its message for the caller.
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Load rejected with {}: {}", status, error_text);
            let message = if error_text.is_empty() {
                format!("server returned {}", status)
            } else {
                error_text
            };
            return Ok(LoadReply {
                ok: false,
                message: Some(message),
            });
        }

        let reply: LoadReply = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse load reply: {}", e);
            HearthchatError::Backend(format!("Failed to parse load reply: {}", e))
        })?;

        Ok(reply)
    }

    async fn unload(&self) -> Result<()> {
        let url = self.endpoint("/v1/models/unload")?;
        tracing::debug!("Requesting model unload");

        let response = self.client.post(url).send().await.map_err(|e| {
            tracing::error!("Unload request failed: {}", e);
            HearthchatError::Backend(format!("Unload request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(HearthchatError::Backend(format!(
                "Unload returned {}: {}",
                status, error_text
            ))
            .into());
        }

        Ok(())
    }

    async fn model(&self) -> Result<ModelStatus> {
        let url = self.endpoint("/v1/models/current")?;

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Model status request failed: {}", e);
            HearthchatError::Backend(format!("Model status request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(HearthchatError::Backend(format!(
                "Model status returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let model_status: ModelStatus = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse model status: {}", e);
            HearthchatError::Backend(format!("Failed to parse model status: {}", e))
        })?;

        Ok(model_status)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.endpoint("/v1/chat")?;
        tracing::debug!("Starting chat turn: {} prompt bytes", request.prompt.len());

        let response = self
            .client
            .post(url)
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Chat request failed: {}", e);
                HearthchatError::Backend(format!("Chat request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Chat returned {}: {}", status, error_text);
            return Err(HearthchatError::Backend(format!(
                "Chat returned {}: {}",
                status, error_text
            ))
            .into());
        }

        let stream = response
            .bytes_stream()
            .map_err(|e| anyhow::Error::from(HearthchatError::Http(e)));
        Ok(Box::pin(stream))
    }
}
