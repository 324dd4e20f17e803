use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use vizflow_llm::planner::{DEFAULT_MODEL, PlannerSettings, PromptStyle};
use vizflow_llm::{DEFAULT_BASE_URL, LlmConfig, RetryPolicy};

/// Process configuration, read once at startup from flags or environment.
#[derive(Clone, Parser)]
#[command(name = "vizflow", version, about = "Turns task descriptions into workflow plans")]
pub struct ServerConfig {
    /// API key for the chat-completion endpoint
    #[arg(long, env = "FEATHERLESS_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "FEATHERLESS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "VIZFLOW_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// steps, branching or graph-edit
    #[arg(long, env = "VIZFLOW_PROMPT_STYLE", default_value = "graph-edit")]
    pub prompt_style: PromptStyle,

    /// Sampling temperature (defaults per prompt style)
    #[arg(long, env = "VIZFLOW_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Completion token budget (defaults per prompt style)
    #[arg(long, env = "VIZFLOW_MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    /// Timeout for each upstream attempt, in seconds
    #[arg(long, env = "VIZFLOW_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    #[arg(long, env = "VIZFLOW_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    #[arg(long, env = "VIZFLOW_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Also write JSON logs to daily files in this directory
    #[arg(long, env = "VIZFLOW_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            base_url: self.base_url.clone(),
            api_key: Some(self.api_key.clone()).filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy::default(),
        }
    }

    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            style: self.prompt_style,
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
