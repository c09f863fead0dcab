#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use npc_arena::config::ArenaConfig;
use npc_arena::kernel::event::{Event, InputEvent, TurnId, TurnProgress};
use npc_arena::kernel::reactor::Reactor;
use npc_arena::kernel::scheduler::{SideEffect, TurnRequest};
use npc_arena::kernel::timers::{TimerKind, TimerToken};
use npc_arena::roster::NpcProfile;
use npc_arena::services::llm::{GatewayError, GatewayPurpose, GatewayRequest, LlmGateway};

pub enum Scripted {
    Reply(String),
    Fail(GatewayError),
    /// Never answers; the per-call timeout or an abort ends it.
    Hang,
}

/// Gateway double answering from a per-purpose script. Unscripted calls fail.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<GatewayPurpose, VecDeque<Scripted>>>,
    calls: Mutex<Vec<GatewayRequest>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, purpose: GatewayPurpose, text: &str) -> Self {
        self.push(purpose, Scripted::Reply(text.to_string()))
    }

    pub fn fail(self, purpose: GatewayPurpose, error: GatewayError) -> Self {
        self.push(purpose, Scripted::Fail(error))
    }

    pub fn hang(self, purpose: GatewayPurpose) -> Self {
        self.push(purpose, Scripted::Hang)
    }

    fn push(self, purpose: GatewayPurpose, step: Scripted) -> Self {
        self.scripts.lock().unwrap().entry(purpose).or_default().push_back(step);
        self
    }

    pub fn purposes(&self) -> Vec<GatewayPurpose> {
        self.calls.lock().unwrap().iter().map(|r| r.purpose).collect()
    }

    pub fn calls(&self) -> Vec<GatewayRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, request: GatewayRequest) -> Result<String, GatewayError> {
        let purpose = request.purpose;
        self.calls.lock().unwrap().push(request);
        let step = self.scripts.lock().unwrap().get_mut(&purpose).and_then(|q| q.pop_front());
        match step {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(GatewayError::Empty)
            }
            None => Err(GatewayError::Transport(format!("unscripted {purpose:?} call"))),
        }
    }
}

pub fn npc(name: &str) -> NpcProfile {
    NpcProfile::new(name, format!("You are {name}."))
}

pub fn reactor(roster: Vec<NpcProfile>) -> Reactor {
    reactor_with(ArenaConfig::default(), roster)
}

pub fn reactor_with(config: ArenaConfig, roster: Vec<NpcProfile>) -> Reactor {
    let (tx, rx) = mpsc::channel(100);
    Reactor::new(rx, tx, config, roster)
}

pub fn say(text: &str) -> Event {
    Event::Input(InputEvent::text("test", text))
}

pub fn progress(id: TurnId, progress: TurnProgress) -> Event {
    Event::Turn { id, progress }
}

pub fn started_turn(effects: &[SideEffect]) -> Option<TurnRequest> {
    effects.iter().find_map(|e| match e {
        SideEffect::StartTurn(request) => Some(request.clone()),
        _ => None,
    })
}

pub fn armed(effects: &[SideEffect], kind: TimerKind) -> Option<(TimerToken, Duration)> {
    effects.iter().find_map(|e| match e {
        SideEffect::ArmTimer { kind: k, token, after } if *k == kind => Some((*token, *after)),
        _ => None,
    })
}

pub fn cancelled(effects: &[SideEffect], kind: TimerKind) -> bool {
    effects.iter().any(|e| matches!(e, SideEffect::CancelTimer(k) if *k == kind))
}

pub fn notices(effects: &[SideEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            SideEffect::Notice(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}
