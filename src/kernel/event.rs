use super::message::{ChatMessage, MessageId};
use super::timers::{TimerKind, TimerToken};
use crate::roster::NpcProfile;

/// Identifies one turn task. Progress from any other id is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnKind {
    User,
    Continuation,
    Reengagement,
}

/// What the session is busy doing. Shown as a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyStage {
    Summarizing,
    Prioritizing,
    LeadingResponse,
    Collaborating,
    SelectingSpeaker,
    Responding,
    Reengaging,
}

impl BusyStage {
    pub fn label(self) -> &'static str {
        match self {
            BusyStage::Summarizing => "updating conversation summary",
            BusyStage::Prioritizing => "choosing who answers",
            BusyStage::LeadingResponse => "lead NPC is thinking",
            BusyStage::Collaborating => "other NPCs are joining in",
            BusyStage::SelectingSpeaker => "choosing who speaks next",
            BusyStage::Responding => "NPC is thinking",
            BusyStage::Reengaging => "NPCs are checking in",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    /// Console line or other external text.
    Input(InputEvent),
    TimerFired { kind: TimerKind, token: TimerToken },
    /// Progress streamed back from a running turn task.
    Turn { id: TurnId, progress: TurnProgress },
    RosterChanged(Vec<NpcProfile>),
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub source: String,
    pub content: String,
}

impl InputEvent {
    pub fn text(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            content: text.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TurnProgress {
    Stage(BusyStage),
    /// New running summary plus the transcript notice announcing it.
    SummaryUpdated { summary: String, notice: String },
    /// Loading bubble for the lead NPC.
    Placeholder(ChatMessage),
    PlaceholderResolved { id: MessageId, text: String },
    /// Appended immediately, bypassing the display queue.
    NpcMessage(ChatMessage),
    /// Queued for paced display.
    Contributions(Vec<ChatMessage>),
    Finished(TurnOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Completed,
    Failed { error: String },
}
