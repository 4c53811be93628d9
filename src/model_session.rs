//! Model session lifecycle
//!
//! The inference server holds at most one loaded model at a time.
//! [`ModelSessionManager`] enforces that invariant client-side with an
//! explicit unload-then-load sequence: every load begins by unloading
//! whatever is active (the server treats unloading nothing as a no-op),
//! then resolves settings, looks up the install path, issues the load, and
//! confirms it took effect by querying current model state.
//!
//! Failures distinguish a rejected load ([`HearthchatError::LoadRejected`])
//! from a load that was accepted but could not be confirmed
//! ([`HearthchatError::LoadUnconfirmed`]); neither is retried.
//!
//! The manager does not guard against two concurrent `load_model` calls
//! racing. Callers must not invoke it concurrently.

use serde::{Deserialize, Serialize};

use crate::backend::{InferenceBackend, LoadMode, LoadRequest};
use crate::error::{HearthchatError, Result};
use crate::settings::{CallOptions, InitOptions, ModelSettings};

/// Fallback message when the server rejects a load without saying why
const GENERIC_LOAD_FAILURE: &str = "model load failed";

/// The currently loaded model, as tracked client-side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSession {
    /// Model identifier
    pub model: String,
    /// Resolved on-disk install path sent with the load request
    pub install_path: String,
    /// Load mode
    pub mode: LoadMode,
    /// Initialization options the model was loaded with
    pub init: InitOptions,
    /// Call options the model was loaded with
    pub call: CallOptions,
}

/// Gates chat interaction on a confirmed model load
pub struct ModelSessionManager<B> {
    backend: B,
    active: Option<ModelSession>,
}

impl<B: InferenceBackend> ModelSessionManager<B> {
    /// Create a manager with no active session
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            active: None,
        }
    }

    /// The active session, if a load has been confirmed
    pub fn active(&self) -> Option<&ModelSession> {
        self.active.as_ref()
    }

    /// The backend this manager talks to
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unload any active model
    ///
    /// Idempotent: unloading when nothing is loaded is a no-op, both here
    /// and on the server.
    pub async fn unload(&mut self) -> Result<()> {
        self.active = None;
        self.backend.unload().await?;
        tracing::debug!("Model unloaded");
        Ok(())
    }

    /// Unload, resolve settings, and load the desired model
    ///
    /// `name` overrides the resolver's configured model identifier. The
    /// resolver must return fully defaulted settings; a missing or empty
    /// model identifier is not a client-side error — the install path
    /// lookup yields an empty path and the load is still attempted so the
    /// server's own validation message is surfaced.
    ///
    /// # Errors
    ///
    /// - [`HearthchatError::LoadRejected`] when the server rejects the
    ///   load, carrying the server's message verbatim (or a generic
    ///   fallback when it supplies none).
    /// - [`HearthchatError::LoadUnconfirmed`] when the load was accepted
    ///   but the confirmation query fails or does not report a loaded
    ///   model.
    /// - Backend errors from the unload or installed-models calls.
    pub async fn load_model<R>(&mut self, name: Option<&str>, resolver: R) -> Result<&ModelSession>
    where
        R: Fn(Option<&str>) -> ModelSettings,
    {
        // Explicit unload-then-load sequencing, never implicit replacement.
        self.active = None;
        self.backend.unload().await?;

        let settings = resolver(name);
        tracing::info!("Loading model {:?}", settings.model);

        let install_path = self
            .backend
            .installed()
            .await?
            .into_iter()
            .find(|m| m.name == settings.model)
            .map(|m| m.path)
            .unwrap_or_default();

        if install_path.is_empty() {
            tracing::warn!(
                "Model {:?} not found among installed models, attempting load anyway",
                settings.model
            );
        }

        let request = LoadRequest {
            path: install_path.clone(),
            mode: LoadMode::Chat,
            init: settings.init.clone(),
            call: settings.call.clone(),
        };

        let reply = self.backend.load(&request).await?;
        if !reply.ok {
            let message = reply
                .message
                .unwrap_or_else(|| GENERIC_LOAD_FAILURE.to_string());
            tracing::error!("Model load rejected: {}", message);
            return Err(HearthchatError::LoadRejected(message).into());
        }

        // Load accepted; confirm it actually took effect.
        let status = self.backend.model().await.map_err(|e| {
            HearthchatError::LoadUnconfirmed(format!("status query failed: {}", e))
        })?;
        if !status.loaded {
            let message = status
                .message
                .unwrap_or_else(|| GENERIC_LOAD_FAILURE.to_string());
            tracing::error!("Model load unconfirmed: {}", message);
            return Err(HearthchatError::LoadUnconfirmed(message).into());
        }

        let model = if status.model.is_empty() {
            settings.model
        } else {
            status.model
        };
        tracing::info!("Model {:?} loaded and confirmed", model);

        let session = ModelSession {
            model,
            install_path,
            mode: request.mode,
            init: request.init,
            call: request.call,
        };
        Ok(self.active.insert(session))
    }
}
