//! Turn execution: one async task per user, continuation or re-engagement turn.

pub mod orchestrator;
pub mod policy;
pub mod summarizer;

pub use orchestrator::TurnOrchestrator;
pub use policy::{StepPolicy, TurnError, TurnStep};
pub use summarizer::ContextSummarizer;
