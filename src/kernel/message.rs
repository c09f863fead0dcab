use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roster::NpcProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    Npc,
    System,
}

pub const USER_SENDER: &str = "User";
pub const SYSTEM_SENDER: &str = "System";

/// One transcript entry.
///
/// Placeholders (`is_loading`, empty text) are finalized exactly once;
/// finalized messages are never touched again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: MessageId,
    pub text: String,
    pub sender_name: String,
    pub sender_type: SenderType,
    /// Wall clock, milliseconds.
    pub timestamp: i64,
    #[serde(default)]
    pub is_loading: bool,
    /// Why this NPC was picked to lead. Diagnostic only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc_reasoning: Option<String>,
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::build(text.into(), USER_SENDER.to_string(), SenderType::User)
    }

    pub fn npc(npc: &NpcProfile, text: impl Into<String>) -> Self {
        Self::build(text.into(), npc.name.clone(), SenderType::Npc)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::build(text.into(), SYSTEM_SENDER.to_string(), SenderType::System)
    }

    pub fn placeholder(npc: &NpcProfile, reasoning: Option<String>) -> Self {
        Self {
            is_loading: true,
            npc_reasoning: reasoning,
            ..Self::npc(npc, String::new())
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    fn build(text: String, sender_name: String, sender_type: SenderType) -> Self {
        Self {
            id: MessageId::new(),
            text,
            sender_name,
            sender_type,
            timestamp: now_millis(),
            is_loading: false,
            npc_reasoning: None,
        }
    }

    /// Whether this message belongs in the pending summary batch.
    pub fn counts_toward_summary(&self) -> bool {
        matches!(self.sender_type, SenderType::User | SenderType::Npc)
            && !self.is_loading
            && !self.text.trim().is_empty()
    }
}

/// Speaker and text, as listed in prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub sender_name: String,
    pub text: String,
}

impl From<&ChatMessage> for Line {
    fn from(message: &ChatMessage) -> Self {
        Self { sender_name: message.sender_name.clone(), text: message.text.clone() }
    }
}

