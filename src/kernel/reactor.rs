use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cancel::{classify, InputCommand};
use super::event::{BusyStage, Event, TurnId, TurnProgress};
use super::message::ChatMessage;
use super::pacer::{pacer_action, PacerAction};
use super::scheduler::{Scheduler, SideEffect, TurnContext, TurnPlan, TurnRequest, RESPONSE_CANCELLED};
use super::state::{SessionState, StateDelta};
use super::timers::{TimerBank, TimerKind};
use crate::config::ArenaConfig;
use crate::outputs::Presenter;
use crate::roster::NpcProfile;
use crate::turns::TurnOrchestrator;

pub const NO_NPCS_NOTICE: &str = "There are no NPCs in the room. Add one with /add <name>: <persona>.";
pub const BUSY_NOTICE: &str = "The NPCs are still answering. Type \"stop\" to interrupt.";
pub const STOPPED_NOTICE: &str = "Stopped. The NPCs will wait for your next message.";

/// Inputs to the idle-timer decision. Timers are re-armed only when this changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IdleKey {
    messages: usize,
    busy: bool,
    queued: usize,
    roster: usize,
    paused: bool,
}

pub struct Reactor {
    pub receiver: mpsc::Receiver<Event>,
    // Turn tasks and timer sleeps report back through this
    tx_clone: mpsc::Sender<Event>,
    pub state: SessionState,
    pub timers: TimerBank,
    pub scheduler: Scheduler,
    config: ArenaConfig,
    idle_key: Option<IdleKey>,
}

impl Reactor {
    pub fn new(receiver: mpsc::Receiver<Event>, tx: mpsc::Sender<Event>, config: ArenaConfig, roster: Vec<NpcProfile>) -> Self {
        Self {
            receiver,
            tx_clone: tx,
            state: SessionState::new(&config.timing, roster),
            timers: TimerBank::new(),
            scheduler: Scheduler,
            config,
            idle_key: None,
        }
    }

    /// Arms the idle timers for a fresh session.
    pub fn start(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        self.reconcile(&mut effects);
        effects
    }

    /// Pure step: advances state for one event and returns the side effects
    /// for the driver. MUST NOT await I/O or timers.
    pub fn step(&mut self, event: Event) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        match event {
            Event::Input(input) => match classify(&input) {
                InputCommand::Blank => {}
                InputCommand::Stop => self.stop(&mut effects),
                InputCommand::Message(text) => self.submit(text, &mut effects),
            },
            Event::TimerFired { kind, token } => {
                if !self.timers.accept(kind, token) {
                    debug!(?kind, ?token, "Discarded stale timer firing");
                    return effects;
                }
                match kind {
                    TimerKind::Display => self.apply(StateDelta::QueueAdvanced, &mut effects),
                    TimerKind::Continuation => self.start_autonomous(TurnPlan::Continuation, &mut effects),
                    TimerKind::Reengagement => self.start_autonomous(TurnPlan::Reengagement, &mut effects),
                }
            }
            Event::Turn { id, progress } => self.progress(id, progress, &mut effects),
            Event::RosterChanged(roster) => {
                info!(npcs = roster.len(), "Roster replaced");
                self.apply(StateDelta::RosterReplaced(roster), &mut effects);
            }
        }

        self.reconcile(&mut effects);
        effects
    }

    fn apply(&mut self, delta: StateDelta, effects: &mut Vec<SideEffect>) {
        if let Some(id) = self.state.reduce(delta) {
            if let Some(message) = self.state.message(id) {
                effects.push(SideEffect::Render(message.clone()));
            }
        }
    }

    fn submit(&mut self, text: String, effects: &mut Vec<SideEffect>) {
        if self.state.roster.is_empty() {
            effects.push(SideEffect::Notice(NO_NPCS_NOTICE.to_string()));
            return;
        }
        if self.state.is_busy() {
            effects.push(SideEffect::Notice(BUSY_NOTICE.to_string()));
            return;
        }

        // The user preempts anything still queued or pending.
        self.cancel_all_timers(effects);
        self.apply(StateDelta::QueueCleared, effects);
        self.apply(StateDelta::BackoffReset, effects);
        self.apply(StateDelta::AutonomyPaused(false), effects);

        let message = ChatMessage::user(text);
        self.apply(StateDelta::MessageAppended(message.clone()), effects);

        let summary_batch = (self.state.pending_batch_len() >= self.config.context.summary_threshold)
            .then(|| self.state.pending_batch_lines());
        let stage = if summary_batch.is_some() { BusyStage::Summarizing } else { BusyStage::Prioritizing };

        self.begin_turn(TurnPlan::User { message, summary_batch }, stage, effects);
    }

    fn start_autonomous(&mut self, plan: TurnPlan, effects: &mut Vec<SideEffect>) {
        if !self.idle_eligible() {
            debug!(kind = ?plan.kind(), "Autonomous turn skipped, session not idle");
            return;
        }
        self.cancel_all_timers(effects);
        let stage = match plan {
            TurnPlan::Reengagement => BusyStage::Reengaging,
            _ => BusyStage::SelectingSpeaker,
        };
        self.begin_turn(plan, stage, effects);
    }

    fn begin_turn(&mut self, plan: TurnPlan, stage: BusyStage, effects: &mut Vec<SideEffect>) {
        let id = self.state.allocate_turn();
        let kind = plan.kind();
        self.apply(StateDelta::TurnStarted { id, kind, stage }, effects);
        effects.push(SideEffect::Status(stage));
        info!(turn = id.0, ?kind, "Turn started");

        effects.push(SideEffect::StartTurn(TurnRequest {
            id,
            plan,
            context: TurnContext {
                roster: self.state.roster.clone(),
                transcript: self.state.messages().to_vec(),
                summary: self.state.summary.clone(),
            },
        }));
    }

    fn stop(&mut self, effects: &mut Vec<SideEffect>) {
        self.cancel_all_timers(effects);
        let dropped = self.state.queue.len();
        self.apply(StateDelta::QueueCleared, effects);

        if let Some(turn) = self.state.active_turn.clone() {
            effects.push(SideEffect::AbortTurn(turn.id));
            if let Some(placeholder) = turn.placeholder {
                self.apply(
                    StateDelta::PlaceholderFailed { id: placeholder, text: RESPONSE_CANCELLED.to_string() },
                    effects,
                );
            }
            self.apply(StateDelta::TurnEnded, effects);
        }

        self.apply(StateDelta::AutonomyPaused(true), effects);
        info!(dropped, "Stop command handled");
        effects.push(SideEffect::Notice(STOPPED_NOTICE.to_string()));
    }

    fn progress(&mut self, id: TurnId, progress: TurnProgress, effects: &mut Vec<SideEffect>) {
        let Some(turn) = self.state.active_turn.clone().filter(|t| t.id == id) else {
            debug!(turn = id.0, "Discarded progress from stale turn");
            return;
        };

        match &progress {
            TurnProgress::Stage(stage) => effects.push(SideEffect::Status(*stage)),
            TurnProgress::Finished(outcome) => info!(turn = id.0, kind = ?turn.kind, ?outcome, "Turn finished"),
            _ => {}
        }

        let placeholder = turn
            .placeholder
            .and_then(|pid| self.state.message(pid))
            .filter(|m| m.is_loading)
            .map(|m| (m.id, m.sender_name.clone()));

        for delta in self.scheduler.project(turn.kind, placeholder, progress) {
            self.apply(delta, effects);
        }
    }

    fn cancel_all_timers(&mut self, effects: &mut Vec<SideEffect>) {
        for kind in TimerKind::ALL {
            if self.timers.disarm(kind) {
                effects.push(SideEffect::CancelTimer(kind));
            }
        }
    }

    fn idle_eligible(&self) -> bool {
        !self.state.roster.is_empty()
            && !self.state.is_busy()
            && self.state.queue.is_empty()
            && !self.state.autonomy_paused
    }

    /// Keeps the display timer and the two idle timers consistent with state.
    fn reconcile(&mut self, effects: &mut Vec<SideEffect>) {
        match pacer_action(self.state.queue.len(), self.state.is_busy(), self.timers.is_armed(TimerKind::Display)) {
            PacerAction::Arm => {
                let token = self.timers.arm(TimerKind::Display);
                effects.push(SideEffect::ArmTimer {
                    kind: TimerKind::Display,
                    token,
                    after: self.config.timing.display_delay,
                });
            }
            PacerAction::Cancel => {
                self.timers.disarm(TimerKind::Display);
                effects.push(SideEffect::CancelTimer(TimerKind::Display));
            }
            PacerAction::Nothing => {}
        }

        let key = IdleKey {
            messages: self.state.messages().len(),
            busy: self.state.is_busy(),
            queued: self.state.queue.len(),
            roster: self.state.roster.len(),
            paused: self.state.autonomy_paused,
        };
        if self.idle_key == Some(key) {
            return;
        }
        self.idle_key = Some(key);

        for kind in [TimerKind::Continuation, TimerKind::Reengagement] {
            if self.timers.disarm(kind) {
                effects.push(SideEffect::CancelTimer(kind));
            }
        }
        if self.idle_eligible() {
            let delays = [
                (TimerKind::Continuation, self.state.backoff.current()),
                (TimerKind::Reengagement, self.config.timing.reengagement_timeout),
            ];
            for (kind, after) in delays {
                let token = self.timers.arm(kind);
                effects.push(SideEffect::ArmTimer { kind, token, after });
            }
        }
    }

    /// Async driver loop.
    pub async fn run(
        &mut self,
        orchestrator: Arc<TurnOrchestrator>,
        presenter: &mut dyn Presenter,
        shutdown: CancellationToken,
    ) {
        info!(npcs = self.state.roster.len(), "Reactor started");
        let mut driver = Driver::default();

        let effects = self.start();
        self.execute(effects, &mut driver, &orchestrator, presenter);

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            let effects = self.step(event);
            self.execute(effects, &mut driver, &orchestrator, presenter);
        }

        driver.abort_all();
        info!("Reactor stopped");
    }

    fn execute(
        &self,
        effects: Vec<SideEffect>,
        driver: &mut Driver,
        orchestrator: &Arc<TurnOrchestrator>,
        presenter: &mut dyn Presenter,
    ) {
        for effect in effects {
            match effect {
                SideEffect::Notice(text) => presenter.notice(&text),
                SideEffect::Render(message) => presenter.render(&message),
                SideEffect::ArmTimer { kind, token, after } => {
                    let tx = self.tx_clone.clone();
                    driver.arm(kind, after, async move {
                        let _ = tx.send(Event::TimerFired { kind, token }).await;
                    });
                }
                SideEffect::CancelTimer(kind) => driver.cancel(kind),
                SideEffect::Status(stage) => presenter.status(stage.label()),
                SideEffect::StartTurn(request) => {
                    let id = request.id;
                    let orchestrator = orchestrator.clone();
                    let tx = self.tx_clone.clone();
                    let handle = tokio::spawn(async move { orchestrator.run(request, tx).await });
                    driver.track_turn(id, handle);
                }
                SideEffect::AbortTurn(id) => driver.abort_turn(id),
            }
        }
    }
}

/// Live task handles owned by the async driver.
#[derive(Default)]
struct Driver {
    timers: HashMap<TimerKind, JoinHandle<()>>,
    turns: HashMap<TurnId, JoinHandle<()>>,
}

impl Driver {
    fn arm<F>(&mut self, kind: TimerKind, after: Duration, fire: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            fire.await;
        });
        if let Some(old) = self.timers.insert(kind, handle) {
            old.abort();
        }
    }

    fn cancel(&mut self, kind: TimerKind) {
        if let Some(handle) = self.timers.remove(&kind) {
            handle.abort();
        }
    }

    fn track_turn(&mut self, id: TurnId, handle: JoinHandle<()>) {
        self.turns.retain(|_, h| !h.is_finished());
        self.turns.insert(id, handle);
    }

    fn abort_turn(&mut self, id: TurnId) {
        match self.turns.remove(&id) {
            Some(handle) => handle.abort(),
            None => warn!(turn = id.0, "Abort requested for unknown turn"),
        }
    }

    fn abort_all(&mut self) {
        for (_, handle) in self.timers.drain() {
            handle.abort();
        }
        for (_, handle) in self.turns.drain() {
            handle.abort();
        }
    }
}
