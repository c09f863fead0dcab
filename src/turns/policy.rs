use thiserror::Error;
use tracing::warn;

use crate::services::llm::GatewayError;

/// Gateway-backed steps of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStep {
    LeaderSelection,
    LeaderResponse,
    Collaboration,
    ContinuationSelection,
    ContinuationResponse,
    Reengagement,
}

/// What a step failure does to the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure ends the turn with a user-visible system message.
    Required,
    /// Failure is logged and the caller substitutes a fallback.
    BestEffort,
}

impl TurnStep {
    pub fn policy(self) -> StepPolicy {
        match self {
            TurnStep::LeaderSelection | TurnStep::LeaderResponse | TurnStep::ContinuationResponse => {
                StepPolicy::Required
            }
            TurnStep::Collaboration | TurnStep::ContinuationSelection | TurnStep::Reengagement => {
                StepPolicy::BestEffort
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TurnStep::LeaderSelection => "leader selection",
            TurnStep::LeaderResponse => "leader response",
            TurnStep::Collaboration => "collaboration",
            TurnStep::ContinuationSelection => "continuation selection",
            TurnStep::ContinuationResponse => "continuation response",
            TurnStep::Reengagement => "re-engagement",
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TurnError {
    #[error("{} failed: {source}", .step.label())]
    Step { step: TurnStep, source: GatewayError },
    #[error("NPC {0} not found in roster")]
    UnknownNpc(String),
}

/// Run a `Required` step's result through its policy: failure ends the turn.
pub fn required<T>(step: TurnStep, result: Result<T, GatewayError>) -> Result<T, TurnError> {
    debug_assert_eq!(step.policy(), StepPolicy::Required);
    result.map_err(|source| TurnError::Step { step, source })
}

/// Run a `BestEffort` step's result through its policy: failure is logged
/// and comes back as `None` for the caller to substitute a fallback.
pub fn best_effort<T>(step: TurnStep, result: Result<T, GatewayError>) -> Option<T> {
    debug_assert_eq!(step.policy(), StepPolicy::BestEffort);
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(step = step.label(), error = %e, "Best-effort step failed, degrading");
            None
        }
    }
}
