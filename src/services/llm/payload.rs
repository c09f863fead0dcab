//! Structured answers the gateway is asked for, and their validation.
//!
//! Models like to wrap JSON in prose or code fences, so parsing first cuts
//! out the outermost JSON value. Anything that then fails to deserialize or
//! validate is a `GatewayError::Schema`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::gateway::GatewayError;

pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderChoice {
    pub leading_npc: String,
    pub reasoning: String,
}

impl Validate for LeaderChoice {
    fn validate(&self) -> Result<(), String> {
        require("leadingNpc", &self.leading_npc)?;
        require("reasoning", &self.reasoning)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub npc_name: String,
    pub response: String,
}

/// Collaboration answers come back either as a bare array or, when the
/// endpoint forces a JSON object, wrapped under `contributions`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CollaborationPayload {
    List(Vec<Contribution>),
    Wrapped { contributions: Vec<Contribution> },
}

impl CollaborationPayload {
    pub fn into_contributions(self) -> Vec<Contribution> {
        match self {
            CollaborationPayload::List(list) => list,
            CollaborationPayload::Wrapped { contributions } => contributions,
        }
    }
}

impl Validate for CollaborationPayload {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationChoice {
    pub npc_name: String,
    /// Must be present, but the roster's own persona text is what gets used.
    #[serde(default)]
    pub npc_system_prompt: String,
    #[serde(default)]
    pub trigger_user_message: Option<String>,
}

impl Validate for ContinuationChoice {
    fn validate(&self) -> Result<(), String> {
        require("npcName", &self.npc_name)?;
        require("npcSystemPrompt", &self.npc_system_prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReengagementChoice {
    pub npc_name: String,
    pub reengagement_text: String,
}

impl Validate for ReengagementChoice {
    fn validate(&self) -> Result<(), String> {
        require("npcName", &self.npc_name)?;
        require("reengagementText", &self.reengagement_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPayload {
    pub new_summary: String,
}

impl Validate for SummaryPayload {
    fn validate(&self) -> Result<(), String> {
        require("newSummary", &self.new_summary)
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("`{field}` is missing or blank"))
    } else {
        Ok(())
    }
}

/// Cut the outermost JSON object or array out of free-form model text.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_structured<T>(text: &str) -> Result<T, GatewayError>
where
    T: DeserializeOwned + Validate,
{
    let json = extract_json(text).ok_or_else(|| GatewayError::Schema("no JSON value in answer".to_string()))?;
    let value: T = serde_json::from_str(json).map_err(|e| GatewayError::Schema(e.to_string()))?;
    value.validate().map_err(GatewayError::Schema)?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_leader_choice() {
        let text = "Sure!\n```json\n{\"leadingNpc\": \"Kant\", \"reasoning\": \"ethics\"}\n```";
        let choice: LeaderChoice = parse_structured(text).unwrap();
        assert_eq!(choice.leading_npc, "Kant");
    }

    #[test]
    fn blank_field_is_schema_error() {
        let err = parse_structured::<LeaderChoice>(r#"{"leadingNpc": " ", "reasoning": "x"}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Schema(_)));
    }

    #[test]
    fn collaboration_accepts_array_and_wrapper() {
        let bare: CollaborationPayload = parse_structured(r#"[{"npcName": "A", "response": "hi"}]"#).unwrap();
        assert_eq!(bare.into_contributions().len(), 1);

        let wrapped: CollaborationPayload = parse_structured(r#"{"contributions": []}"#).unwrap();
        assert!(wrapped.into_contributions().is_empty());
    }

    #[test]
    fn continuation_without_persona_text_is_rejected() {
        let err = parse_structured::<ContinuationChoice>(r#"{"npcName": "Kant", "triggerUserMessage": "Go on."}"#)
            .unwrap_err();
        assert!(matches!(err, GatewayError::Schema(_)));

        let ok: ContinuationChoice =
            parse_structured(r#"{"npcName": "Kant", "npcSystemPrompt": "philosopher"}"#).unwrap();
        assert!(ok.trigger_user_message.is_none());
    }

    #[test]
    fn prose_without_json_is_rejected() {
        assert!(parse_structured::<SummaryPayload>("I cannot do that").is_err());
    }
}
