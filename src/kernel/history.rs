use serde::{Deserialize, Serialize};
use tracing::debug;

use super::message::{ChatMessage, MessageId, SenderType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of the role-alternating history handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmTurn {
    pub role: Role,
    pub text: String,
}

impl LlmTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into() }
    }
}

/// Collapse same-role runs to their last entry, then drop any leading model entries.
///
/// Pure and idempotent: the output never has two adjacent entries with the
/// same role and never opens with `Role::Model`.
pub fn sanitize(history: Vec<LlmTurn>) -> Vec<LlmTurn> {
    let mut out: Vec<LlmTurn> = Vec::with_capacity(history.len());
    for turn in history {
        match out.last_mut() {
            Some(last) if last.role == turn.role => *last = turn,
            _ => out.push(turn),
        }
    }

    let leading_models = out.iter().take_while(|t| t.role == Role::Model).count();
    if leading_models > 0 {
        debug!(dropped = leading_models, "History opened with model turns, dropping them");
        out.drain(..leading_models);
    }
    out
}

/// Bounded, sanitized gateway view of a transcript.
///
/// System messages, placeholders and blank messages never appear. The bound
/// is applied before sanitizing, so the result has at most `max` entries.
pub fn build_llm_history(messages: &[ChatMessage], max: usize) -> Vec<LlmTurn> {
    let eligible: Vec<&ChatMessage> = messages
        .iter()
        .filter(|m| m.sender_type != SenderType::System && !m.is_loading && !m.text.trim().is_empty())
        .collect();
    let start = eligible.len().saturating_sub(max);

    let raw = eligible[start..]
        .iter()
        .map(|m| LlmTurn {
            role: if m.sender_type == SenderType::User { Role::User } else { Role::Model },
            text: m.text.clone(),
        })
        .collect();
    sanitize(raw)
}

/// History of everything that came before `trigger` (the trigger itself is sent separately).
pub fn build_llm_history_before(messages: &[ChatMessage], trigger: MessageId, max: usize) -> Vec<LlmTurn> {
    let cut = messages.iter().position(|m| m.id == trigger).unwrap_or(messages.len());
    build_llm_history(&messages[..cut], max)
}
