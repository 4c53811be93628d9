//! Settings structures and resolution for Hearthchat
//!
//! This module defines the model/initialization/call option structures
//! supplied by the settings storage collaborator, and the typed resolver
//! used by the model session manager. Every field is serde-defaulted so a
//! partial or missing settings entry resolves to a usable structure rather
//! than failing.

use crate::error::{HearthchatError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Model initialization options sent with a load request
///
/// These correspond to knobs applied once, when the model is mapped into
/// memory on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitOptions {
    /// Context window size in tokens
    #[serde(default = "default_context_size")]
    pub context_size: usize,

    /// Number of layers to offload to the GPU
    #[serde(default)]
    pub gpu_layers: usize,

    /// Worker threads for prompt evaluation
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Batch size for prompt processing
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_context_size() -> usize {
    4096
}

fn default_threads() -> usize {
    4
}

fn default_batch_size() -> usize {
    512
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            context_size: default_context_size(),
            gpu_layers: 0,
            threads: default_threads(),
            batch_size: default_batch_size(),
        }
    }
}

/// Per-request generation options sent with a load request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallOptions {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling threshold
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Maximum tokens to generate per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Repetition penalty
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f64,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}

fn default_max_tokens() -> usize {
    1024
}

fn default_repeat_penalty() -> f64 {
    1.1
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            repeat_penalty: default_repeat_penalty(),
        }
    }
}

/// Fully resolved settings for one model session
///
/// Produced by a [`resolver`](ModelSettings) closure; never contains
/// unset fields. A missing model name resolves to an empty identifier,
/// which the manager still attempts to load so the server's own
/// validation error is surfaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier (may be empty when nothing is configured)
    #[serde(default)]
    pub model: String,

    /// Initialization options
    #[serde(default)]
    pub init: InitOptions,

    /// Call options
    #[serde(default)]
    pub call: CallOptions,
}

/// Typed settings resolver
///
/// Takes an optional model name override and returns fully defaulted
/// settings. Callers that have no settings storage can pass
/// [`default_resolver`].
pub type SettingsResolver = dyn Fn(Option<&str>) -> ModelSettings + Send + Sync;

/// Resolver that returns defaulted settings, honoring a name override
///
/// # Examples
///
/// ```
/// use hearthchat::settings::default_resolver;
///
/// let settings = default_resolver(Some("llama3.2:latest"));
/// assert_eq!(settings.model, "llama3.2:latest");
/// assert_eq!(default_resolver(None).model, "");
/// ```
pub fn default_resolver(name: Option<&str>) -> ModelSettings {
    ModelSettings {
        model: name.unwrap_or_default().to_string(),
        ..Default::default()
    }
}

/// Settings storage collaborator
///
/// Holds per-bot settings entries loaded from a YAML file. Read-only from
/// the core's perspective: the store only supplies configuration, it never
/// writes it back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsStore {
    /// Settings entries keyed by bot or playground identifier
    #[serde(default)]
    pub bots: HashMap<String, ModelSettings>,
}

impl SettingsStore {
    /// Load a settings store from a YAML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            HearthchatError::Settings(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let store: Self = serde_yaml::from_str(&text).map_err(HearthchatError::Yaml)?;
        tracing::debug!("Loaded settings for {} bots", store.bots.len());
        Ok(store)
    }

    /// Resolve settings for a bot identifier
    ///
    /// Unknown identifiers resolve to defaults rather than failing; an
    /// explicit model name override takes priority over the stored one.
    pub fn resolve(&self, bot_id: &str, model_override: Option<&str>) -> ModelSettings {
        let mut settings = self.bots.get(bot_id).cloned().unwrap_or_default();
        if let Some(name) = model_override {
            settings.model = name.to_string();
        }
        settings
    }

    /// Build a typed resolver closure bound to one bot identifier
    ///
    /// The returned closure satisfies the [`SettingsResolver`] signature
    /// expected by the model session manager.
    pub fn resolver(&self, bot_id: &str) -> impl Fn(Option<&str>) -> ModelSettings + Send + Sync {
        let store = self.clone();
        let bot_id = bot_id.to_string();
        move |name| store.resolve(&bot_id, name)
    }
}
