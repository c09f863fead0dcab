use std::collections::VecDeque;

use super::message::ChatMessage;

/// Pre-generated NPC follow-ups waiting to be revealed, ordered by logical timestamp.
#[derive(Debug, Clone, Default)]
pub struct DisplayQueue {
    items: VecDeque<ChatMessage>,
}

impl DisplayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a batch in, keeping the whole queue sorted by timestamp.
    /// Equal timestamps keep insertion order.
    pub fn enqueue(&mut self, batch: Vec<ChatMessage>) {
        if batch.is_empty() {
            return;
        }
        let mut all: Vec<ChatMessage> = self.items.drain(..).chain(batch).collect();
        all.sort_by_key(|m| m.timestamp);
        self.items = all.into();
    }

    pub fn pop(&mut self) -> Option<ChatMessage> {
        self.items.pop_front()
    }

    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.items.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacerAction {
    /// Schedule the one drain timer.
    Arm,
    /// Drop the pending drain timer without draining.
    Cancel,
    Nothing,
}

/// Single-slot drain decision.
///
/// Arm only when there is something to show, no turn is running and no
/// timer is pending. A pending timer is cancelled as soon as a turn starts
/// or the queue runs dry.
pub fn pacer_action(queue_len: usize, busy: bool, timer_armed: bool) -> PacerAction {
    match (queue_len > 0, busy, timer_armed) {
        (true, false, false) => PacerAction::Arm,
        (_, true, true) | (false, _, true) => PacerAction::Cancel,
        _ => PacerAction::Nothing,
    }
}
