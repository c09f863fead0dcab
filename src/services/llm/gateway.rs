use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::kernel::history::LlmTurn;

/// Which step a gateway call serves. Structured steps expect JSON back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayPurpose {
    LeaderSelection,
    Response,
    Collaboration,
    ContinuationSelection,
    Reengagement,
    Summary,
}

impl GatewayPurpose {
    pub fn expects_json(self) -> bool {
        !matches!(self, GatewayPurpose::Response)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub purpose: GatewayPurpose,
    pub system_instruction: String,
    /// Sanitized, bounded, role-alternating.
    pub history: Vec<LlmTurn>,
    /// Final user/trigger text, sent after the history.
    pub prompt: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(String),
    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),
    #[error("gateway returned no text")]
    Empty,
    #[error("gateway answer failed validation: {0}")]
    Schema(String),
}

/// The opaque LLM collaborator: instruction + history in, text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmGateway: Send + Sync {
    async fn complete(&self, request: GatewayRequest) -> Result<String, GatewayError>;
}
