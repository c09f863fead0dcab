use std::path::PathBuf;
use std::time::Duration;

/// Default OpenAI-compatible endpoint (llama-server, Ollama and friends all speak it).
pub const DEFAULT_LLM_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_LLM_MODEL: &str = "local-model";
pub const DEFAULT_ROSTER_PATH: &str = "npc-roster.json";

/// Timing knobs for the idle timers and the display pacer.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingConfig {
    pub initial_continuation: Duration,
    pub continuation_increment: Duration,
    pub max_continuation: Duration,
    pub reengagement_timeout: Duration,
    pub display_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            initial_continuation: Duration::from_millis(8_000),
            continuation_increment: Duration::from_millis(5_000),
            max_continuation: Duration::from_millis(30_000),
            reengagement_timeout: Duration::from_millis(45_000),
            display_delay: Duration::from_millis(1_000),
        }
    }
}

/// Bounds on how much conversation gets fed back into the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Pending batch size that triggers a summary.
    pub summary_threshold: usize,
    /// Max entries in the LLM history view.
    pub max_history: usize,
    /// Character budget for the local fallback summary.
    pub fallback_summary_chars: usize,
    /// Hard cap on any stored summary.
    pub max_summary_chars: usize,
    /// Messages shown to the continuation selector.
    pub selector_recent_messages: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            summary_threshold: 10,
            max_history: 10,
            fallback_summary_chars: 500,
            max_summary_chars: 1_000,
            selector_recent_messages: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Applied to every gateway round-trip; expiry counts as a gateway failure.
    pub call_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            call_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArenaConfig {
    pub timing: TimingConfig,
    pub context: ContextConfig,
    pub llm: LlmConfig,
    pub roster_path: Option<PathBuf>,
}

impl ArenaConfig {
    /// Build from environment variables, falling back to defaults when unset.
    ///
    /// Reads `ARENA_LLM_BASE_URL`, `ARENA_LLM_MODEL`, `ARENA_LLM_API_KEY`,
    /// `ARENA_LLM_TIMEOUT_SECS` and `ARENA_ROSTER_PATH`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("ARENA_LLM_BASE_URL") {
            config.llm.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = std::env::var("ARENA_LLM_MODEL") {
            config.llm.model = model;
        }
        config.llm.api_key = std::env::var("ARENA_LLM_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Some(secs) = std::env::var("ARENA_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.llm.call_timeout = Duration::from_secs(secs.max(1));
        }
        config.roster_path = Some(
            std::env::var("ARENA_ROSTER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ROSTER_PATH)),
        );

        config
    }
}
