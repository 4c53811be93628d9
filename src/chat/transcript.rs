//! Chat transcript state
//!
//! An ordered, append-only sequence of turns. During a streaming turn the
//! orchestrator is the only writer: it opens an assistant turn, appends
//! each data payload as it arrives, and marks the turn complete when the
//! stream finishes — including after cancellation, so partial output is
//! never discarded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instruction
    System,
    /// The human user
    User,
    /// The model
    Assistant,
}

/// One turn in the transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Speaker role
    pub role: Role,
    /// Turn text; grows incrementally for a streaming assistant turn
    pub content: String,
    /// When the turn was created
    pub created_at: DateTime<Utc>,
    /// False while an assistant turn is still streaming
    pub complete: bool,
}

impl ChatTurn {
    fn new(role: Role, content: impl Into<String>, complete: bool) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
            complete,
        }
    }
}

/// Ordered sequence of chat turns
///
/// # Examples
///
/// ```
/// use hearthchat::chat::ChatTranscript;
///
/// let mut transcript = ChatTranscript::new();
/// transcript.push_user("hello");
/// transcript.begin_assistant();
/// transcript.append_to_open_turn("hi ");
/// transcript.append_to_open_turn("there");
/// transcript.complete_open_turn();
/// assert_eq!(transcript.last_assistant_content(), Some("hi there"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatTranscript {
    turns: Vec<ChatTurn>,
}

impl ChatTranscript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// All turns, in order
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript has no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed system turn
    pub fn push_system(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::new(Role::System, content, true));
    }

    /// Append a completed user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn::new(Role::User, content, true));
    }

    /// Open an empty assistant turn for incremental appends
    pub fn begin_assistant(&mut self) {
        self.turns.push(ChatTurn::new(Role::Assistant, "", false));
    }

    /// Append text to the open assistant turn
    ///
    /// A no-op (with a warning) when no assistant turn is open; the
    /// orchestrator always opens one before the stream starts.
    pub fn append_to_open_turn(&mut self, text: &str) {
        match self.turns.last_mut() {
            Some(turn) if turn.role == Role::Assistant && !turn.complete => {
                turn.content.push_str(text);
            }
            _ => tracing::warn!("Dropping append: no open assistant turn"),
        }
    }

    /// Mark the open assistant turn complete, keeping whatever content it
    /// has accumulated so far
    pub fn complete_open_turn(&mut self) {
        if let Some(turn) = self.turns.last_mut() {
            if turn.role == Role::Assistant && !turn.complete {
                turn.complete = true;
            }
        }
    }

    /// Content of the most recent assistant turn
    pub fn last_assistant_content(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turns_append_in_order() {
        let mut transcript = ChatTranscript::new();
        transcript.push_system("be brief");
        transcript.push_user("hello");
        transcript.begin_assistant();

        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript.turns()[0].role, Role::System);
        assert_eq!(transcript.turns()[1].role, Role::User);
        assert_eq!(transcript.turns()[2].role, Role::Assistant);
    }

    #[test]
    fn test_streaming_appends_accumulate() {
        let mut transcript = ChatTranscript::new();
        transcript.begin_assistant();
        transcript.append_to_open_turn("Hel");
        transcript.append_to_open_turn("lo");
        assert_eq!(transcript.last_assistant_content(), Some("Hello"));
        assert!(!transcript.turns()[0].complete);
    }

    #[test]
    fn test_complete_open_turn_freezes_content() {
        let mut transcript = ChatTranscript::new();
        transcript.begin_assistant();
        transcript.append_to_open_turn("partial");
        transcript.complete_open_turn();

        assert!(transcript.turns()[0].complete);
        // Appends after completion are dropped.
        transcript.append_to_open_turn(" extra");
        assert_eq!(transcript.last_assistant_content(), Some("partial"));
    }

    #[test]
    fn test_append_without_open_turn_is_dropped() {
        let mut transcript = ChatTranscript::new();
        transcript.push_user("hello");
        transcript.append_to_open_turn("stray");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.turns()[0].content, "hello");
    }

    #[test]
    fn test_last_assistant_content_skips_user_turns() {
        let mut transcript = ChatTranscript::new();
        transcript.begin_assistant();
        transcript.append_to_open_turn("first answer");
        transcript.complete_open_turn();
        transcript.push_user("follow-up");
        assert_eq!(transcript.last_assistant_content(), Some("first answer"));
    }

    #[test]
    fn test_transcript_serializes() {
        let mut transcript = ChatTranscript::new();
        transcript.push_user("hello");
        let json = serde_json::to_string(&transcript).unwrap();
        assert!(json.contains("\"user\""));
        assert!(json.contains("hello"));
    }
}
