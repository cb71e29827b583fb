//! The conversational intake engine: template updating, completeness
//! checking, summary generation, specialty triage, and the turn-level
//! state machine tying them together.

pub mod completeness;
pub mod orchestrator;
pub mod prompts;
pub mod session;
pub mod specialty;
pub mod summary;
pub mod updater;

pub use completeness::{CompletenessChecker, CompletionDecision};
pub use orchestrator::{IntakeOrchestrator, TurnOutcome, VoiceTurnOutcome, DEFAULT_MAX_QUESTIONS};
pub use session::{Assistant, AssistantReply, ChatMessage, InMemorySessionStore, SessionStore};
pub use specialty::SpecialtyRouter;
pub use summary::SummaryGenerator;
pub use updater::TemplateUpdater;
