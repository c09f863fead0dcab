use std::sync::{Arc, Mutex, MutexGuard};

use super::Presenter;
use crate::kernel::message::{ChatMessage, MessageId};

#[derive(Debug, Default)]
pub struct TranscriptLog {
    /// Latest version of every rendered message, in first-render order.
    pub messages: Vec<ChatMessage>,
    /// Every render call, for ordering checks.
    pub renders: Vec<MessageId>,
    pub notices: Vec<String>,
    pub statuses: Vec<String>,
}

/// Recording presenter. Clones share one log, so a test can keep a handle
/// while the reactor owns the presenter.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    inner: Arc<Mutex<TranscriptLog>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, TranscriptLog> {
        // A poisoned log still holds everything recorded before the panic.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.log().messages.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log().notices.clone()
    }
}

impl Presenter for Transcript {
    fn render(&mut self, message: &ChatMessage) {
        let mut log = self.log();
        log.renders.push(message.id);
        match log.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message.clone(),
            None => log.messages.push(message.clone()),
        }
    }

    fn notice(&mut self, text: &str) {
        self.log().notices.push(text.to_string());
    }

    fn status(&mut self, label: &str) {
        self.log().statuses.push(label.to_string());
    }
}
