//! Chat turn orchestration
//!
//! [`ChatTurnOrchestrator`] composes the model session manager with the
//! stream session controller: on submission it ensures a model is loaded,
//! issues the chat request, and attaches a stream session whose handler
//! appends each data payload to the in-progress assistant turn. A
//! cancelled turn is marked complete with whatever partial content has
//! arrived; partial output is never discarded.

use crate::backend::{ChatRequest, InferenceBackend};
use crate::chat::ChatTranscript;
use crate::error::Result;
use crate::model_session::ModelSessionManager;
use crate::settings::ModelSettings;
use crate::stream::{CancelToken, StreamHandler, StreamSession};

/// Result of one chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// True when the stream ran to natural end; false after cancellation
    pub finished: bool,
    /// The assistant content accumulated for this turn
    pub content: String,
}

/// Appends stream payloads to the transcript's open assistant turn
struct TranscriptHandler<'a> {
    transcript: &'a mut ChatTranscript,
}

#[async_trait::async_trait]
impl StreamHandler for TranscriptHandler<'_> {
    async fn on_data(&mut self, payload: &str) -> Result<()> {
        self.transcript.append_to_open_turn(payload);
        Ok(())
    }

    async fn on_event(&mut self, name: &str) -> Result<()> {
        tracing::debug!("Chat stream event: {}", name);
        Ok(())
    }

    async fn on_comment(&mut self, text: &str) -> Result<()> {
        tracing::debug!("Chat stream comment: {}", text);
        Ok(())
    }

    async fn on_finish(&mut self, is_done: bool) {
        // Runs on every exit path, so a cancelled turn still closes with
        // its partial content intact.
        self.transcript.complete_open_turn();
        tracing::debug!("Chat turn finished: done={}", is_done);
    }
}

/// Drives user submissions through the model gate and the stream pipeline
///
/// Single-session by construction: one orchestrator owns one transcript
/// and one model session manager, and `submit` must not be called
/// concurrently (the manager documents the same constraint for loads).
pub struct ChatTurnOrchestrator<B, R> {
    manager: ModelSessionManager<B>,
    transcript: ChatTranscript,
    resolver: R,
}

impl<B, R> ChatTurnOrchestrator<B, R>
where
    B: InferenceBackend,
    R: Fn(Option<&str>) -> ModelSettings + Send + Sync,
{
    /// Create an orchestrator with an empty transcript
    pub fn new(backend: B, resolver: R) -> Self {
        Self {
            manager: ModelSessionManager::new(backend),
            transcript: ChatTranscript::new(),
            resolver,
        }
    }

    /// The transcript accumulated so far
    pub fn transcript(&self) -> &ChatTranscript {
        &self.transcript
    }

    /// The underlying model session manager
    pub fn manager(&self) -> &ModelSessionManager<B> {
        &self.manager
    }

    /// Load a model explicitly, replacing any active session
    pub async fn load_model(&mut self, name: Option<&str>) -> Result<()> {
        self.manager.load_model(name, &self.resolver).await?;
        Ok(())
    }

    /// Load a model only if none is active
    pub async fn ensure_model(&mut self) -> Result<()> {
        if self.manager.active().is_none() {
            self.manager.load_model(None, &self.resolver).await?;
        }
        Ok(())
    }

    /// Run one chat turn
    ///
    /// Ensures a model session is active (loading one via the resolver if
    /// not), appends the user turn, opens an assistant turn, and streams
    /// the response into it. The caller keeps a clone of `cancel` and sets
    /// it to stop the turn; the outcome then reports `finished = false`
    /// with the partial content.
    ///
    /// # Errors
    ///
    /// Model-load failures and chat request failures are surfaced to the
    /// caller; the user turn is still recorded when the request itself
    /// fails, so the UI can re-submit.
    pub async fn submit(&mut self, prompt: &str, cancel: CancelToken) -> Result<TurnOutcome> {
        self.ensure_model().await?;

        self.transcript.push_user(prompt);

        let request = ChatRequest {
            prompt: prompt.to_string(),
        };
        let stream = self.manager.backend().chat(&request).await?;

        self.transcript.begin_assistant();
        let mut handler = TranscriptHandler {
            transcript: &mut self.transcript,
        };
        let finished = StreamSession::new(stream, cancel).run(&mut handler).await?;

        let content = self
            .transcript
            .last_assistant_content()
            .unwrap_or_default()
            .to_string();

        Ok(TurnOutcome { finished, content })
    }
}
