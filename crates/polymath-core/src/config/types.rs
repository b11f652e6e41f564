//! Configuration types for Polymath
//!
//! Defines the structure of `.polymath.toml` configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolymathConfig {
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// External tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Run execution and checkpointing
    #[serde(default)]
    pub runs: RunsConfig,
}

/// LLM configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Default provider to use (openai, gemini, ollama)
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Sampling temperature shared by every role
    #[serde(default)]
    pub temperature: f32,

    /// Tool calls a single role invocation may make before it must answer
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,

    /// Provider configurations
    #[serde(default = "default_providers")]
    pub providers: HashMap<String, ProviderConfig>,

    /// Per-role provider/model overrides, keyed by role name
    #[serde(default)]
    pub roles: HashMap<String, RoleModelConfig>,
}

fn default_provider() -> String {
    "ollama".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_max_tool_rounds() -> usize {
    8
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout: default_timeout(),
            temperature: 0.0,
            max_tool_rounds: default_max_tool_rounds(),
            providers: default_providers(),
            roles: HashMap::new(),
        }
    }
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// API key (supports ${ENV_VAR} syntax)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL for the API
    #[serde(default)]
    pub base_url: Option<String>,

    /// Default model for this provider
    #[serde(default)]
    pub default_model: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: None,
            default_model: None,
        }
    }
}

/// Provider/model override for one role
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleModelConfig {
    /// Provider ID; falls back to `llm.default_provider`
    #[serde(default)]
    pub provider: Option<String>,

    /// Model name; falls back to the provider's default model
    #[serde(default)]
    pub model: Option<String>,
}

/// Create default provider configurations
fn default_providers() -> HashMap<String, ProviderConfig> {
    let mut providers = HashMap::new();

    // Ollama - local, no API key needed
    providers.insert(
        "ollama".to_string(),
        ProviderConfig {
            enabled: true,
            api_key: None,
            base_url: Some("http://localhost:11434".to_string()),
            default_model: Some("llama3.1".to_string()),
        },
    );

    // OpenAI - requires API key
    providers.insert(
        "openai".to_string(),
        ProviderConfig {
            enabled: false,
            api_key: None,
            base_url: Some("https://api.openai.com/v1".to_string()),
            default_model: Some("gpt-4o".to_string()),
        },
    );

    // Gemini - requires API key
    providers.insert(
        "gemini".to_string(),
        ProviderConfig {
            enabled: false,
            api_key: None,
            base_url: Some("https://generativelanguage.googleapis.com".to_string()),
            default_model: Some("gemini-2.0-flash".to_string()),
        },
    );

    providers
}

/// External tool configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Tavily API key for web search; web search is disabled without it
    #[serde(default)]
    pub tavily_api_key: Option<String>,

    /// Wikipedia articles returned per query
    #[serde(default = "default_result_count")]
    pub wikipedia_results: usize,

    /// arXiv papers returned per query
    #[serde(default = "default_result_count")]
    pub arxiv_results: usize,

    /// Tool output longer than this is truncated before the model sees it
    #[serde(default = "default_max_result_chars")]
    pub max_result_chars: usize,

    /// HTTP timeout for lookup tools in seconds
    #[serde(default = "default_tool_timeout")]
    pub timeout: u64,

    /// Code execution sandbox
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

fn default_result_count() -> usize {
    3
}

fn default_max_result_chars() -> usize {
    8_000
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            tavily_api_key: None,
            wikipedia_results: default_result_count(),
            arxiv_results: default_result_count(),
            max_result_chars: default_max_result_chars(),
            timeout: default_tool_timeout(),
            sandbox: SandboxConfig::default(),
        }
    }
}

/// Sandbox for model-authored Python code
///
/// The command receives the program on stdin. It must isolate the code from
/// the host (container, VM, or equivalent); the orchestrator never runs
/// generated code in its own process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Command and arguments, e.g. a container runtime invocation
    #[serde(default = "default_sandbox_command")]
    pub command: Vec<String>,

    /// Wall-clock limit for one execution in seconds
    #[serde(default = "default_sandbox_timeout")]
    pub timeout: u64,
}

fn default_sandbox_command() -> Vec<String> {
    [
        "docker",
        "run",
        "--rm",
        "-i",
        "--network",
        "none",
        "--memory",
        "512m",
        "--cpus",
        "1",
        "python:3.12-slim",
        "python",
        "-",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_sandbox_timeout() -> u64 {
    60
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            command: default_sandbox_command(),
            timeout: default_sandbox_timeout(),
        }
    }
}

/// Run execution section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunsConfig {
    /// Directory for run checkpoints; runs are kept in memory when unset
    #[serde(default)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Hard ceiling on role steps per run
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
}

fn default_max_steps() -> usize {
    8
}

impl Default for RunsConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: None,
            max_steps: default_max_steps(),
        }
    }
}

impl PolymathConfig {
    /// Get a provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(name)
    }
}
