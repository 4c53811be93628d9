//! Chat transcript state and turn orchestration

pub mod orchestrator;
pub mod transcript;

pub use orchestrator::{ChatTurnOrchestrator, TurnOutcome};
pub use transcript::{ChatTranscript, ChatTurn, Role};
