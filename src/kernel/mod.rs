//! Session kernel: a single-owner reducer driven by events.
//!
//! `Reactor::step` is pure and returns side effects; `Reactor::run` is the
//! only place that spawns tasks or sleeps.

pub mod cancel;
pub mod event;
pub mod history;
pub mod message;
pub mod pacer;
pub mod reactor;
pub mod scheduler;
pub mod state;
pub mod timers;

pub use event::{BusyStage, Event, InputEvent, TurnId, TurnKind, TurnOutcome, TurnProgress};
pub use message::{ChatMessage, Line, MessageId, SenderType};
pub use reactor::Reactor;
pub use scheduler::{SideEffect, TurnContext, TurnPlan, TurnRequest};
pub use state::{SessionState, TurnPhase};
pub use timers::{TimerKind, TimerToken};
