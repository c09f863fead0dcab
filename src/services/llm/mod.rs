pub mod client;
pub mod flows;
pub mod gateway;
pub mod payload;
pub mod prompts;

pub use client::LlmService;
pub use flows::Flows;
pub use gateway::{GatewayError, GatewayPurpose, GatewayRequest, LlmGateway};
