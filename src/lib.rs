//! Hearthchat - streaming chat core for local inference servers
//!
//! This library provides the client-side core of a chat front end that
//! talks to a locally hosted language-model inference server: the
//! streaming response pipeline and the model session lifecycle. UI
//! rendering, persistence, and authentication are left to the caller.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `stream`: chunk decoding, line-event framing, and the stream session
//!   controller with cooperative cancellation
//! - `model_session`: the single-active-model lifecycle (unload, resolve,
//!   load, confirm)
//! - `chat`: the append-only transcript and the chat turn orchestrator
//! - `backend`: the inference server interface and its HTTP client
//! - `settings`: settings structures and the typed settings resolver
//! - `error`: error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use hearthchat::backend::HttpBackend;
//! use hearthchat::chat::ChatTurnOrchestrator;
//! use hearthchat::settings::default_resolver;
//! use hearthchat::stream::CancelToken;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = HttpBackend::new(Url::parse("http://localhost:8008")?)?;
//!     let mut chat = ChatTurnOrchestrator::new(backend, default_resolver);
//!
//!     let cancel = CancelToken::new();
//!     let outcome = chat.submit("Hello!", cancel.clone()).await?;
//!     println!("{}", outcome.content);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod chat;
pub mod error;
pub mod model_session;
pub mod settings;
pub mod stream;

// Re-export commonly used types
pub use backend::{HttpBackend, InferenceBackend};
pub use chat::{ChatTranscript, ChatTurnOrchestrator, TurnOutcome};
pub use error::{HearthchatError, Result};
pub use model_session::{ModelSession, ModelSessionManager};
pub use settings::{default_resolver, ModelSettings, SettingsStore};
pub use stream::{CancelToken, FramedLine, LineFramer, StreamHandler, StreamSession};
