use super::event::{BusyStage, TurnId, TurnKind};
use super::message::{ChatMessage, Line, MessageId, SenderType, SYSTEM_SENDER};
use super::pacer::DisplayQueue;
use super::timers::ContinuationBackoff;
use crate::config::TimingConfig;
use crate::roster::NpcProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    Busy(BusyStage),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveTurn {
    pub id: TurnId,
    pub kind: TurnKind,
    /// Loading bubble opened by this turn, if any.
    pub placeholder: Option<MessageId>,
}

/// Strict state delta. This is the ONLY way state mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    /// Append, or replace in place when the id already exists.
    MessageAppended(ChatMessage),
    PlaceholderOpened(ChatMessage),
    PlaceholderResolved { id: MessageId, text: String },
    /// Finalize a loading bubble as a system message.
    PlaceholderFailed { id: MessageId, text: String },
    SummaryReplaced(String),
    QueueExtended(Vec<ChatMessage>),
    QueueCleared,
    /// Move the earliest queued message into the transcript.
    QueueAdvanced,
    TurnStarted { id: TurnId, kind: TurnKind, stage: BusyStage },
    StageChanged(BusyStage),
    TurnEnded,
    BackoffReset,
    BackoffAdvanced,
    RosterReplaced(Vec<NpcProfile>),
    AutonomyPaused(bool),
}

#[derive(Debug, Clone)]
pub struct SessionState {
    messages: Vec<ChatMessage>,
    pending_batch: Vec<MessageId>,
    pub phase: TurnPhase,
    pub active_turn: Option<ActiveTurn>,
    pub summary: String,
    pub queue: DisplayQueue,
    pub backoff: ContinuationBackoff,
    pub roster: Vec<NpcProfile>,
    /// Set by a stop command; idle timers stay down until the user speaks.
    pub autonomy_paused: bool,
    /// Monotonic version, bumped on every reduction.
    pub version: u64,
    next_turn: u64,
}

impl SessionState {
    pub fn new(timing: &TimingConfig, roster: Vec<NpcProfile>) -> Self {
        Self {
            messages: Vec::new(),
            pending_batch: Vec::new(),
            phase: TurnPhase::Idle,
            active_turn: None,
            summary: String::new(),
            queue: DisplayQueue::new(),
            backoff: ContinuationBackoff::new(timing),
            roster,
            autonomy_paused: false,
            version: 0,
            next_turn: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TurnPhase::Busy(_))
    }

    pub fn pending_batch_len(&self) -> usize {
        self.pending_batch.len()
    }

    /// Pending batch in transcript order, as prompt lines.
    pub fn pending_batch_lines(&self) -> Vec<Line> {
        self.pending_batch
            .iter()
            .filter_map(|id| self.message(*id))
            .map(Line::from)
            .collect()
    }

    pub fn allocate_turn(&mut self) -> TurnId {
        self.next_turn += 1;
        TurnId(self.next_turn)
    }

    /// Pure reduction: State + Delta -> Mutated State.
    ///
    /// Returns the id of the transcript message that changed, if any.
    pub fn reduce(&mut self, delta: StateDelta) -> Option<MessageId> {
        self.version += 1;

        match delta {
            StateDelta::MessageAppended(message) => Some(self.upsert(message)),
            StateDelta::PlaceholderOpened(message) => {
                let id = self.upsert(message);
                if let Some(turn) = self.active_turn.as_mut() {
                    turn.placeholder = Some(id);
                }
                Some(id)
            }
            StateDelta::PlaceholderResolved { id, text } => {
                let message = self.messages.iter_mut().find(|m| m.id == id && m.is_loading)?;
                message.text = text;
                message.is_loading = false;
                self.count(id);
                Some(id)
            }
            StateDelta::PlaceholderFailed { id, text } => {
                let message = self.messages.iter_mut().find(|m| m.id == id && m.is_loading)?;
                message.text = text;
                message.is_loading = false;
                message.sender_type = SenderType::System;
                message.sender_name = SYSTEM_SENDER.to_string();
                message.npc_reasoning = None;
                Some(id)
            }
            StateDelta::SummaryReplaced(summary) => {
                self.summary = summary;
                self.pending_batch.clear();
                None
            }
            StateDelta::QueueExtended(batch) => {
                self.queue.enqueue(batch);
                None
            }
            StateDelta::QueueCleared => {
                self.queue.clear();
                None
            }
            StateDelta::QueueAdvanced => {
                let message = self.queue.pop()?;
                Some(self.upsert(message))
            }
            StateDelta::TurnStarted { id, kind, stage } => {
                self.phase = TurnPhase::Busy(stage);
                self.active_turn = Some(ActiveTurn { id, kind, placeholder: None });
                None
            }
            StateDelta::StageChanged(stage) => {
                if self.is_busy() {
                    self.phase = TurnPhase::Busy(stage);
                }
                None
            }
            StateDelta::TurnEnded => {
                self.phase = TurnPhase::Idle;
                self.active_turn = None;
                None
            }
            StateDelta::BackoffReset => {
                self.backoff.reset();
                None
            }
            StateDelta::BackoffAdvanced => {
                self.backoff.advance();
                None
            }
            StateDelta::RosterReplaced(roster) => {
                self.roster = roster;
                None
            }
            StateDelta::AutonomyPaused(paused) => {
                self.autonomy_paused = paused;
                None
            }
        }
    }

    fn upsert(&mut self, message: ChatMessage) -> MessageId {
        let id = message.id;
        let counts = message.counts_toward_summary();
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
        if counts {
            self.count(id);
        }
        id
    }

    /// A message joins the batch once, when it first becomes final.
    fn count(&mut self, id: MessageId) {
        if !self.pending_batch.contains(&id) {
            self.pending_batch.push(id);
        }
    }
}
