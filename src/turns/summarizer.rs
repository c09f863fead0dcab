use tracing::{info, warn};

use crate::config::ContextConfig;
use crate::services::llm::prompts::Line;
use crate::services::llm::Flows;

pub const NOTHING_TO_SUMMARIZE: &str = "No new messages to summarize. Conversation context is unchanged.";
const NOTICE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryOutcome {
    pub summary: String,
    pub used_fallback: bool,
}

/// Condenses the pending batch into a new running summary.
///
/// Never fails: a gateway error falls back to a local digest of the batch.
pub struct ContextSummarizer {
    flows: Flows,
    config: ContextConfig,
}

impl ContextSummarizer {
    pub fn new(flows: Flows, config: ContextConfig) -> Self {
        Self { flows, config }
    }

    pub async fn summarize(&self, previous: &str, batch: &[Line]) -> SummaryOutcome {
        if batch.is_empty() {
            let summary = if previous.trim().is_empty() {
                NOTHING_TO_SUMMARIZE.to_string()
            } else {
                previous.to_string()
            };
            return SummaryOutcome { summary, used_fallback: false };
        }

        match self.flows.summarize(previous, batch).await {
            Ok(summary) => {
                info!(batch = batch.len(), "Context summary refreshed");
                SummaryOutcome {
                    summary: truncate_chars(&summary, self.config.max_summary_chars),
                    used_fallback: false,
                }
            }
            Err(e) => {
                warn!(error = %e, batch = batch.len(), "Summary generation failed, using local digest");
                SummaryOutcome {
                    summary: truncate_chars(
                        &fallback_summary(previous, batch, self.config.fallback_summary_chars),
                        self.config.max_summary_chars,
                    ),
                    used_fallback: true,
                }
            }
        }
    }
}

/// Deterministic digest: previous summary plus the clipped batch.
pub fn fallback_summary(previous: &str, batch: &[Line], budget: usize) -> String {
    let joined = batch
        .iter()
        .map(|l| format!("{}: {}", l.sender_name, l.text))
        .collect::<Vec<_>>()
        .join("; ");
    let clipped = truncate_chars(&joined, budget);
    if previous.trim().is_empty() {
        format!("Summary unavailable. Recent: {clipped}")
    } else {
        format!("{previous} | Recent points: {clipped}")
    }
}

/// Transcript notice shown after a refresh.
pub fn summary_notice(summary: &str) -> String {
    let preview = truncate_chars(summary, NOTICE_PREVIEW_CHARS);
    let ellipsis = if summary.chars().count() > NOTICE_PREVIEW_CHARS { "..." } else { "" };
    format!("[Context updated. Focus: {preview}{ellipsis}]")
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
