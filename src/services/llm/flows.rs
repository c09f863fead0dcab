use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::warn;

use super::gateway::{GatewayError, GatewayPurpose, GatewayRequest, LlmGateway};
use super::payload::{
    parse_structured, CollaborationPayload, Contribution, ContinuationChoice, LeaderChoice, ReengagementChoice,
    SummaryPayload, Validate,
};
use super::prompts::{self, Line};
use crate::kernel::history::LlmTurn;
use crate::roster::NpcProfile;

const LEADER_TEMPERATURE: f32 = 0.3;
const RESPONSE_TEMPERATURE: f32 = 0.75;
const COLLABORATION_TEMPERATURE: f32 = 0.7;
const CONTINUATION_TEMPERATURE: f32 = 0.6;
const REENGAGEMENT_TEMPERATURE: f32 = 0.8;
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Typed gateway steps. Each call is bounded by `call_timeout`.
#[derive(Clone)]
pub struct Flows {
    gateway: Arc<dyn LlmGateway>,
    call_timeout: Duration,
}

impl Flows {
    pub fn new(gateway: Arc<dyn LlmGateway>, call_timeout: Duration) -> Self {
        Self { gateway, call_timeout }
    }

    async fn call(&self, request: GatewayRequest) -> Result<String, GatewayError> {
        let purpose = request.purpose;
        match tokio::time::timeout(self.call_timeout, self.gateway.complete(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?purpose, timeout = ?self.call_timeout, "Gateway call timed out");
                Err(GatewayError::Timeout(self.call_timeout))
            }
        }
    }

    async fn structured<T>(&self, request: GatewayRequest) -> Result<T, GatewayError>
    where
        T: DeserializeOwned + Validate,
    {
        let text = self.call(request).await?;
        parse_structured(&text)
    }

    pub async fn select_leader(
        &self,
        user_message: &str,
        roster: &[NpcProfile],
        history: Vec<LlmTurn>,
    ) -> Result<LeaderChoice, GatewayError> {
        let profiles: Vec<&NpcProfile> = roster.iter().collect();
        self.structured(GatewayRequest {
            purpose: GatewayPurpose::LeaderSelection,
            system_instruction: prompts::ORCHESTRATOR_ROLE.to_string(),
            history,
            prompt: prompts::leader_selection(user_message, &profiles),
            temperature: LEADER_TEMPERATURE,
        })
        .await
    }

    /// In-character reply.
    ///
    /// Blank or unreadable output becomes an apology in the NPC's voice;
    /// only transport-level failures (network, HTTP status, timeout) are errors.
    pub async fn respond(
        &self,
        npc: &NpcProfile,
        trigger: &str,
        history: Vec<LlmTurn>,
        summary: &str,
    ) -> Result<String, GatewayError> {
        if npc.prompt.trim().is_empty() || trigger.trim().is_empty() {
            warn!(npc = %npc.name, "Response requested without persona or trigger text");
            return Ok(format!("I seem to be missing something I need to answer ({}).", npc.name));
        }

        let request = GatewayRequest {
            purpose: GatewayPurpose::Response,
            system_instruction: prompts::persona_instruction(&npc.name, &npc.prompt, summary),
            history,
            prompt: trigger.to_string(),
            temperature: RESPONSE_TEMPERATURE,
        };

        match self.call(request).await {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) | Err(GatewayError::Empty) | Err(GatewayError::Schema(_)) => {
                warn!(npc = %npc.name, "Unreadable or empty reply, substituting apology");
                Ok(format!(
                    "I received an empty or unreadable reply ({}). Please try again in a moment.",
                    npc.name
                ))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn collaborate(
        &self,
        user_message: &str,
        leader: &NpcProfile,
        leader_text: &str,
        others: &[&NpcProfile],
        history: Vec<LlmTurn>,
        summary: &str,
    ) -> Result<Vec<Contribution>, GatewayError> {
        if others.is_empty() {
            return Ok(Vec::new());
        }
        let mut system_instruction = prompts::ORCHESTRATOR_ROLE.to_string();
        if !summary.trim().is_empty() {
            system_instruction.push_str(&format!(" Conversation focus: \"{summary}\"."));
        }
        let payload: CollaborationPayload = self
            .structured(GatewayRequest {
                purpose: GatewayPurpose::Collaboration,
                system_instruction,
                history,
                prompt: prompts::collaboration(user_message, leader, leader_text, others),
                temperature: COLLABORATION_TEMPERATURE,
            })
            .await?;
        Ok(payload.into_contributions())
    }

    pub async fn select_continuation(
        &self,
        recent: &[Line],
        roster: &[NpcProfile],
        history: Vec<LlmTurn>,
    ) -> Result<ContinuationChoice, GatewayError> {
        let profiles: Vec<&NpcProfile> = roster.iter().collect();
        self.structured(GatewayRequest {
            purpose: GatewayPurpose::ContinuationSelection,
            system_instruction: prompts::ORCHESTRATOR_ROLE.to_string(),
            history,
            prompt: prompts::continuation_selection(recent, &profiles),
            temperature: CONTINUATION_TEMPERATURE,
        })
        .await
    }

    pub async fn reengage(
        &self,
        roster: &[NpcProfile],
        history: Vec<LlmTurn>,
    ) -> Result<ReengagementChoice, GatewayError> {
        let profiles: Vec<&NpcProfile> = roster.iter().collect();
        self.structured(GatewayRequest {
            purpose: GatewayPurpose::Reengagement,
            system_instruction: prompts::ORCHESTRATOR_ROLE.to_string(),
            history,
            prompt: prompts::reengagement(&profiles),
            temperature: REENGAGEMENT_TEMPERATURE,
        })
        .await
    }

    pub async fn summarize(&self, previous: &str, batch: &[Line]) -> Result<String, GatewayError> {
        let payload: SummaryPayload = self
            .structured(GatewayRequest {
                purpose: GatewayPurpose::Summary,
                system_instruction: prompts::SUMMARIZER_ROLE.to_string(),
                history: Vec::new(),
                prompt: prompts::summary(previous, batch),
                temperature: SUMMARY_TEMPERATURE,
            })
            .await?;
        Ok(payload.new_summary.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::llm::gateway::MockLlmGateway;

    fn flows(mock: MockLlmGateway) -> Flows {
        Flows::new(Arc::new(mock), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn empty_reply_becomes_persona_apology() {
        let mut mock = MockLlmGateway::new();
        mock.expect_complete().returning(|_| Err(GatewayError::Empty));
        let npc = NpcProfile::new("Kant", "philosopher");

        let text = flows(mock).respond(&npc, "hello", Vec::new(), "").await.unwrap();

        assert!(text.contains("Kant"));
    }

    #[tokio::test]
    async fn transport_failure_propagates_from_respond() {
        let mut mock = MockLlmGateway::new();
        mock.expect_complete()
            .returning(|_| Err(GatewayError::Transport("connection refused".into())));
        let npc = NpcProfile::new("Kant", "philosopher");

        let err = flows(mock).respond(&npc, "hello", Vec::new(), "").await.unwrap_err();

        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn missing_trigger_skips_gateway() {
        let mut mock = MockLlmGateway::new();
        mock.expect_complete().never();
        let npc = NpcProfile::new("Kant", "philosopher");

        let text = flows(mock).respond(&npc, "  ", Vec::new(), "").await.unwrap();

        assert!(text.contains("missing"));
    }

    #[tokio::test]
    async fn summary_constraint_reaches_instruction() {
        let mut mock = MockLlmGateway::new();
        mock.expect_complete()
            .withf(|r| r.purpose == GatewayPurpose::Response && r.system_instruction.contains("French Revolution"))
            .returning(|_| Ok("Indeed.".into()));
        let npc = NpcProfile::new("Kant", "philosopher");

        let text = flows(mock)
            .respond(&npc, "and then?", Vec::new(), "User asks about the French Revolution")
            .await
            .unwrap();

        assert_eq!(text, "Indeed.");
    }

    #[tokio::test]
    async fn collaboration_without_others_skips_gateway() {
        let mut mock = MockLlmGateway::new();
        mock.expect_complete().never();
        let leader = NpcProfile::new("Kant", "philosopher");

        let out = flows(mock)
            .collaborate("hi", &leader, "hello", &[], Vec::new(), "")
            .await
            .unwrap();

        assert!(out.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_gateway_times_out() {
        struct Hung;
        #[async_trait::async_trait]
        impl LlmGateway for Hung {
            async fn complete(&self, _: GatewayRequest) -> Result<String, GatewayError> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok("late".into())
            }
        }
        let flows = Flows::new(Arc::new(Hung), Duration::from_secs(2));

        let err = flows.summarize("", &[]).await.unwrap_err();

        assert_eq!(err, GatewayError::Timeout(Duration::from_secs(2)));
    }
}
