use std::collections::HashMap;
use std::time::Duration;

use crate::config::TimingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Autonomous NPC continuation after the backoff interval.
    Continuation,
    /// Short nudge after the fixed re-engagement timeout.
    Reengagement,
    /// Display pacer: reveal one queued message.
    Display,
}

impl TimerKind {
    pub const ALL: [TimerKind; 3] = [TimerKind::Continuation, TimerKind::Reengagement, TimerKind::Display];
}

/// Identifies one arming of a timer. A firing is honoured only if its token
/// is still the armed one for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Which timers are currently armed. The real sleeps live in the driver;
/// this only tracks tokens so the kernel can reject stale firings.
#[derive(Debug, Default)]
pub struct TimerBank {
    armed: HashMap<TimerKind, TimerToken>,
    next: u64,
}

impl TimerBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `kind`, replacing any earlier arming.
    pub fn arm(&mut self, kind: TimerKind) -> TimerToken {
        self.next += 1;
        let token = TimerToken(self.next);
        self.armed.insert(kind, token);
        token
    }

    /// Returns true if something was armed.
    pub fn disarm(&mut self, kind: TimerKind) -> bool {
        self.armed.remove(&kind).is_some()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    /// Consume a firing. False means stale or already cancelled.
    pub fn accept(&mut self, kind: TimerKind, token: TimerToken) -> bool {
        if self.armed.get(&kind) == Some(&token) {
            self.armed.remove(&kind);
            true
        } else {
            false
        }
    }
}

/// Continuation interval: grows by a fixed step after each autonomous turn,
/// capped, and snaps back when the user speaks.
#[derive(Debug, Clone)]
pub struct ContinuationBackoff {
    current: Duration,
    initial: Duration,
    increment: Duration,
    max: Duration,
}

impl ContinuationBackoff {
    pub fn new(timing: &TimingConfig) -> Self {
        Self {
            current: timing.initial_continuation,
            initial: timing.initial_continuation,
            increment: timing.continuation_increment,
            max: timing.max_continuation,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }

    pub fn advance(&mut self) {
        self.current = (self.current + self.increment).min(self.max);
    }
}
