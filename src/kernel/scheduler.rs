use std::time::Duration;

use super::event::{BusyStage, TurnId, TurnKind, TurnOutcome, TurnProgress};
use super::message::{ChatMessage, Line, MessageId};
use super::state::StateDelta;
use super::timers::{TimerKind, TimerToken};
use crate::roster::NpcProfile;

pub const RESPONSE_CANCELLED: &str = "Response cancelled.";

#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Status line for the user; not part of the transcript.
    Notice(String),
    /// What the running turn is doing now.
    Status(BusyStage),
    /// A transcript message was added or changed.
    Render(ChatMessage),
    ArmTimer { kind: TimerKind, token: TimerToken, after: Duration },
    CancelTimer(TimerKind),
    StartTurn(TurnRequest),
    AbortTurn(TurnId),
}

/// Everything a turn task needs, copied out of the session when it starts.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub id: TurnId,
    pub plan: TurnPlan,
    pub context: TurnContext,
}

#[derive(Debug, Clone)]
pub enum TurnPlan {
    User {
        message: ChatMessage,
        /// Present when the pending batch reached the summary threshold.
        summary_batch: Option<Vec<Line>>,
    },
    Continuation,
    Reengagement,
}

impl TurnPlan {
    pub fn kind(&self) -> TurnKind {
        match self {
            TurnPlan::User { .. } => TurnKind::User,
            TurnPlan::Continuation => TurnKind::Continuation,
            TurnPlan::Reengagement => TurnKind::Reengagement,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TurnContext {
    pub roster: Vec<NpcProfile>,
    /// Transcript at turn start, user message included.
    pub transcript: Vec<ChatMessage>,
    pub summary: String,
}

pub struct Scheduler;

impl Scheduler {
    /// Pure projection: turn progress -> state deltas.
    ///
    /// `placeholder` is the active turn's loading bubble and its speaker.
    pub fn project(
        &self,
        kind: TurnKind,
        placeholder: Option<(MessageId, String)>,
        progress: TurnProgress,
    ) -> Vec<StateDelta> {
        match progress {
            TurnProgress::Stage(stage) => vec![StateDelta::StageChanged(stage)],
            TurnProgress::SummaryUpdated { summary, notice } => {
                vec![
                    StateDelta::SummaryReplaced(summary),
                    StateDelta::MessageAppended(ChatMessage::system(notice)),
                ]
            }
            TurnProgress::Placeholder(message) => vec![StateDelta::PlaceholderOpened(message)],
            TurnProgress::PlaceholderResolved { id, text } => vec![StateDelta::PlaceholderResolved { id, text }],
            TurnProgress::NpcMessage(message) => vec![StateDelta::MessageAppended(message)],
            TurnProgress::Contributions(batch) => vec![StateDelta::QueueExtended(batch)],
            TurnProgress::Finished(TurnOutcome::Completed) => {
                let mut deltas = Vec::new();
                if kind == TurnKind::Continuation {
                    deltas.push(StateDelta::BackoffAdvanced);
                }
                deltas.push(StateDelta::TurnEnded);
                deltas
            }
            TurnProgress::Finished(TurnOutcome::Failed { error }) => {
                let failure = match placeholder {
                    Some((id, speaker)) => StateDelta::PlaceholderFailed {
                        id,
                        text: format!("{speaker} could not answer: {error}"),
                    },
                    None => StateDelta::MessageAppended(ChatMessage::system(failure_text(kind, &error))),
                };
                vec![failure, StateDelta::TurnEnded]
            }
        }
    }
}

pub fn failure_text(kind: TurnKind, error: &str) -> String {
    match kind {
        TurnKind::User => format!("Sorry, the conversation pipeline failed: {error}"),
        TurnKind::Continuation => format!("System error: NPC continuation failed ({error})"),
        TurnKind::Reengagement => format!("System error: re-engagement failed ({error})"),
    }
}
