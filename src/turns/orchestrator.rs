use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::policy::{best_effort, required, TurnError, TurnStep};
use super::summarizer::{summary_notice, ContextSummarizer};
use crate::config::{ArenaConfig, ContextConfig};
use crate::kernel::event::{BusyStage, Event, TurnId, TurnOutcome, TurnProgress};
use crate::kernel::history::{build_llm_history, build_llm_history_before};
use crate::kernel::message::{ChatMessage, Line};
use crate::kernel::scheduler::{TurnContext, TurnPlan, TurnRequest};
use crate::roster::{find_by_name, NpcProfile};
use crate::services::llm::payload::Contribution;
use crate::services::llm::{Flows, LlmGateway};

/// Trigger used when continuation selection failed outright.
pub const FALLBACK_TRIGGER: &str = "Please continue the conversation.";
/// Trigger used when the selector named a speaker but gave no prompt.
pub const DEFAULT_TRIGGER: &str = "Please continue the conversation and keep it coherent.";
/// Nudge used when re-engagement produced nothing usable.
pub const FALLBACK_NUDGE: &str = "Still there?";

/// Spacing between queued contributions, in logical milliseconds.
const CONTRIBUTION_SPACING_MS: i64 = 10;

/// Runs one turn at a time against the gateway and streams progress back
/// to the reactor. Every run ends with exactly one `Finished`.
pub struct TurnOrchestrator {
    flows: Flows,
    summarizer: ContextSummarizer,
    context: ContextConfig,
}

/// Progress channel for one turn.
struct Sink {
    id: TurnId,
    tx: mpsc::Sender<Event>,
}

impl Sink {
    async fn send(&self, progress: TurnProgress) {
        // A closed channel means the session is gone; nothing to report to.
        let _ = self.tx.send(Event::Turn { id: self.id, progress }).await;
    }

    async fn stage(&self, stage: BusyStage) {
        self.send(TurnProgress::Stage(stage)).await;
    }
}

impl TurnOrchestrator {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: &ArenaConfig) -> Self {
        let flows = Flows::new(gateway, config.llm.call_timeout);
        Self {
            summarizer: ContextSummarizer::new(flows.clone(), config.context.clone()),
            flows,
            context: config.context.clone(),
        }
    }

    pub async fn run(&self, request: TurnRequest, tx: mpsc::Sender<Event>) {
        let sink = Sink { id: request.id, tx };
        let kind = request.plan.kind();

        let result = match request.plan {
            TurnPlan::User { message, summary_batch } => {
                self.user_turn(message, summary_batch, request.context, &sink).await
            }
            TurnPlan::Continuation => self.continuation_turn(request.context, &sink).await,
            TurnPlan::Reengagement => self.reengagement_turn(request.context, &sink).await,
        };

        let outcome = match result {
            Ok(()) => TurnOutcome::Completed,
            Err(e) => {
                warn!(turn = request.id.0, ?kind, error = %e, "Turn failed");
                TurnOutcome::Failed { error: e.to_string() }
            }
        };
        sink.send(TurnProgress::Finished(outcome)).await;
    }

    async fn user_turn(
        &self,
        message: ChatMessage,
        summary_batch: Option<Vec<Line>>,
        ctx: TurnContext,
        sink: &Sink,
    ) -> Result<(), TurnError> {
        let mut summary = ctx.summary;
        let mut transcript = ctx.transcript;

        if let Some(batch) = summary_batch {
            sink.stage(BusyStage::Summarizing).await;
            let outcome = self.summarizer.summarize(&summary, &batch).await;
            summary = outcome.summary;
            let notice = summary_notice(&summary);
            transcript.push(ChatMessage::system(notice.clone()));
            sink.send(TurnProgress::SummaryUpdated { summary: summary.clone(), notice }).await;
        }

        sink.stage(BusyStage::Prioritizing).await;
        let history = build_llm_history_before(&transcript, message.id, self.context.max_history);
        let choice = required(
            TurnStep::LeaderSelection,
            self.flows.select_leader(&message.text, &ctx.roster, history.clone()).await,
        )?;
        let leader = find_by_name(&ctx.roster, &choice.leading_npc)
            .cloned()
            .ok_or_else(|| TurnError::UnknownNpc(choice.leading_npc.clone()))?;
        info!(leader = %leader.name, reasoning = %choice.reasoning, "Leader selected");

        let placeholder = ChatMessage::placeholder(&leader, Some(choice.reasoning));
        sink.send(TurnProgress::Placeholder(placeholder.clone())).await;

        sink.stage(BusyStage::LeadingResponse).await;
        let text = required(
            TurnStep::LeaderResponse,
            self.flows.respond(&leader, &message.text, history, &summary).await,
        )?;
        sink.send(TurnProgress::PlaceholderResolved { id: placeholder.id, text: text.clone() }).await;

        let leader_message = ChatMessage { text, is_loading: false, ..placeholder };
        transcript.push(leader_message.clone());

        self.collaborate(&message.text, &leader, &leader_message, &ctx.roster, &transcript, &summary, sink)
            .await;
        Ok(())
    }

    async fn continuation_turn(&self, ctx: TurnContext, sink: &Sink) -> Result<(), TurnError> {
        let mut transcript = ctx.transcript;
        let history = build_llm_history(&transcript, self.context.max_history);
        let done: Vec<&ChatMessage> = transcript.iter().filter(|m| !m.is_loading).collect();
        let recent: Vec<Line> = done[done.len().saturating_sub(self.context.selector_recent_messages)..]
            .iter()
            .map(|m| Line::from(*m))
            .collect();

        sink.stage(BusyStage::SelectingSpeaker).await;
        let choice = best_effort(
            TurnStep::ContinuationSelection,
            self.flows.select_continuation(&recent, &ctx.roster, history.clone()).await,
        );

        let picked = match choice {
            Some(choice) => {
                let trigger = choice
                    .trigger_user_message
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_TRIGGER.to_string());
                match find_by_name(&ctx.roster, &choice.npc_name) {
                    Some(npc) => Some((npc.clone(), trigger)),
                    None => {
                        warn!(name = %choice.npc_name, "Continuation picked an unknown NPC, using the first one");
                        ctx.roster.first().cloned().map(|npc| (npc, trigger))
                    }
                }
            }
            None => random_member(&ctx.roster).map(|npc| (npc, FALLBACK_TRIGGER.to_string())),
        };
        let Some((speaker, trigger)) = picked else {
            warn!("Continuation requested with an empty roster");
            return Ok(());
        };

        sink.stage(BusyStage::Responding).await;
        let text = required(
            TurnStep::ContinuationResponse,
            self.flows.respond(&speaker, &trigger, history, &ctx.summary).await,
        )?;
        let message = ChatMessage::npc(&speaker, text);
        sink.send(TurnProgress::NpcMessage(message.clone())).await;
        transcript.push(message.clone());

        self.collaborate("", &speaker, &message, &ctx.roster, &transcript, &ctx.summary, sink)
            .await;
        Ok(())
    }

    async fn reengagement_turn(&self, ctx: TurnContext, sink: &Sink) -> Result<(), TurnError> {
        let history = build_llm_history(&ctx.transcript, self.context.max_history);

        sink.stage(BusyStage::Reengaging).await;
        let choice = best_effort(TurnStep::Reengagement, self.flows.reengage(&ctx.roster, history).await);

        let resolved = choice.and_then(|c| {
            let npc = find_by_name(&ctx.roster, &c.npc_name)?;
            Some((npc.clone(), c.reengagement_text))
        });
        let picked = resolved.or_else(|| random_member(&ctx.roster).map(|npc| (npc, FALLBACK_NUDGE.to_string())));
        let Some((speaker, text)) = picked else {
            warn!("Re-engagement requested with an empty roster");
            return Ok(());
        };

        sink.send(TurnProgress::NpcMessage(ChatMessage::npc(&speaker, text))).await;
        Ok(())
    }

    /// Best-effort follow-ups from everyone except `leader`, queued for paced display.
    #[allow(clippy::too_many_arguments)]
    async fn collaborate(
        &self,
        user_message: &str,
        leader: &NpcProfile,
        leader_message: &ChatMessage,
        roster: &[NpcProfile],
        transcript: &[ChatMessage],
        summary: &str,
        sink: &Sink,
    ) {
        let others: Vec<&NpcProfile> = roster.iter().filter(|p| p.id != leader.id).collect();
        if others.is_empty() {
            return;
        }

        sink.stage(BusyStage::Collaborating).await;
        let history = build_llm_history(transcript, self.context.max_history);
        let contributions = best_effort(
            TurnStep::Collaboration,
            self.flows
                .collaborate(user_message, leader, &leader_message.text, &others, history, summary)
                .await,
        )
        .unwrap_or_default();

        let queued = queue_contributions(contributions, leader, leader_message, roster);
        if !queued.is_empty() {
            info!(count = queued.len(), "Contributions queued");
            sink.send(TurnProgress::Contributions(queued)).await;
        }
    }
}

fn random_member(roster: &[NpcProfile]) -> Option<NpcProfile> {
    roster.choose(&mut rand::thread_rng()).cloned()
}

/// Turn raw contributions into queued messages.
///
/// Drops blank entries, echoes of the leader's own reply and names not in
/// the roster. Survivors are stamped strictly after the leader's message.
pub fn queue_contributions(
    contributions: Vec<Contribution>,
    leader: &NpcProfile,
    leader_message: &ChatMessage,
    roster: &[NpcProfile],
) -> Vec<ChatMessage> {
    contributions
        .into_iter()
        .filter(|c| !c.response.trim().is_empty())
        .filter(|c| !(c.npc_name == leader.name && c.response.trim() == leader_message.text.trim()))
        .filter_map(|c| match find_by_name(roster, &c.npc_name) {
            Some(npc) => Some(ChatMessage::npc(npc, c.response.trim())),
            None => {
                warn!(name = %c.npc_name, "Dropping contribution from unknown NPC");
                None
            }
        })
        .enumerate()
        .map(|(i, message)| {
            let ts = leader_message.timestamp + i as i64 * CONTRIBUTION_SPACING_MS + 1;
            message.at(ts)
        })
        .collect()
}
