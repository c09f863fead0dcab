use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::gateway::{GatewayError, GatewayRequest, LlmGateway};
use crate::config::LlmConfig;
use crate::kernel::history::Role;

/// Gateway over an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl LlmService {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(config.call_timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn wire_messages(request: &GatewayRequest) -> Vec<WireMessage> {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        messages.push(WireMessage {
            role: "system",
            content: request.system_instruction.clone(),
        });
        for turn in &request.history {
            messages.push(WireMessage {
                role: match turn.role {
                    Role::User => "user",
                    Role::Model => "assistant",
                },
                content: turn.text.clone(),
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: request.prompt.clone(),
        });
        messages
    }
}

#[async_trait]
impl LlmGateway for LlmService {
    async fn complete(&self, request: GatewayRequest) -> Result<String, GatewayError> {
        debug!(purpose = ?request.purpose, history = request.history.len(), "Gateway request");

        let body = ChatRequest {
            model: self.model.clone(),
            messages: Self::wire_messages(&request),
            temperature: request.temperature,
            stream: false,
            response_format: request
                .purpose
                .expects_json()
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let mut call = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let response = call
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Schema(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GatewayError::Empty);
        }
        Ok(text)
    }
}
