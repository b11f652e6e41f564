//! Configuration loader with environment variable expansion
//!
//! Loads configuration from `.polymath.toml` in the working directory or the
//! user config directory.

use super::types::{PolymathConfig, ProviderConfig};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid expansion pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<ConfigError> for crate::PolymathError {
    fn from(err: ConfigError) -> Self {
        crate::PolymathError::Config(err.to_string())
    }
}

/// Load configuration from various sources
///
/// Priority order:
/// 1. Project-level `.polymath.toml`
/// 2. User-level `~/.config/polymath/config.toml`
/// 3. Default configuration
pub fn load_config(project_dir: &Path) -> Result<PolymathConfig, ConfigError> {
    let project_config = project_dir.join(".polymath.toml");
    if project_config.exists() {
        return load_from_file(&project_config);
    }

    if let Some(user_config) = get_user_config_path() {
        if user_config.exists() {
            return load_from_file(&user_config);
        }
    }

    Ok(apply_env_overrides(PolymathConfig::default()))
}

/// Get user config directory path
fn get_user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("polymath").join("config.toml"))
}

/// Load configuration from a specific file
pub fn load_from_file(path: &Path) -> Result<PolymathConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: PolymathConfig = toml::from_str(&content)?;

    expand_env_vars(&mut config)?;

    Ok(apply_env_overrides(config))
}

/// Expand ${VAR} patterns in string values
fn expand_env_vars(config: &mut PolymathConfig) -> Result<(), ConfigError> {
    let env_regex = Regex::new(r"\$\{([^}]+)\}")?;

    for provider in config.llm.providers.values_mut() {
        if let Some(ref api_key) = provider.api_key {
            provider.api_key = Some(expand_string(api_key, &env_regex));
        }
        if let Some(ref base_url) = provider.base_url {
            provider.base_url = Some(expand_string(base_url, &env_regex));
        }
    }

    if let Some(ref key) = config.tools.tavily_api_key {
        config.tools.tavily_api_key = Some(expand_string(key, &env_regex));
    }

    Ok(())
}

/// Expand environment variables in a single string
fn expand_string(s: &str, regex: &Regex) -> String {
    regex
        .replace_all(s, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}

/// Apply environment variable overrides for common settings
///
/// Supports direct environment variables:
/// - OPENAI_API_KEY -> openai.api_key
/// - GOOGLE_API_KEY / GEMINI_API_KEY -> gemini.api_key
/// - OLLAMA_BASE_URL -> ollama.base_url
/// - TAVILY_API_KEY -> tools.tavily_api_key
/// - POLYMATH_DEFAULT_PROVIDER -> llm.default_provider
/// - POLYMATH_CHECKPOINT_DIR -> runs.checkpoint_dir
fn apply_env_overrides(mut config: PolymathConfig) -> PolymathConfig {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            let provider = config
                .llm
                .providers
                .entry("openai".to_string())
                .or_insert_with(ProviderConfig::default);
            provider.api_key = Some(key);
            provider.enabled = true;
        }
    }

    for env_var in ["GOOGLE_API_KEY", "GEMINI_API_KEY"] {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                let provider = config
                    .llm
                    .providers
                    .entry("gemini".to_string())
                    .or_insert_with(ProviderConfig::default);
                provider.api_key = Some(key);
                provider.enabled = true;
                break;
            }
        }
    }

    if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
        if !url.is_empty() {
            let provider = config
                .llm
                .providers
                .entry("ollama".to_string())
                .or_insert_with(ProviderConfig::default);
            provider.base_url = Some(url);
        }
    }

    if let Ok(key) = std::env::var("TAVILY_API_KEY") {
        if !key.is_empty() {
            config.tools.tavily_api_key = Some(key);
        }
    }

    if let Ok(provider) = std::env::var("POLYMATH_DEFAULT_PROVIDER") {
        if !provider.is_empty() {
            config.llm.default_provider = provider;
        }
    }

    if let Ok(dir) = std::env::var("POLYMATH_CHECKPOINT_DIR") {
        if !dir.is_empty() {
            config.runs.checkpoint_dir = Some(PathBuf::from(dir));
        }
    }

    config
}

/// Create a sample configuration file content
pub fn sample_config() -> &'static str {
    r#"# Polymath Configuration
# Place this file in your project root as .polymath.toml
# or in ~/.config/polymath/config.toml for global settings

[llm]
# Default provider: openai, gemini, ollama
default_provider = "openai"

# Request timeout in seconds
timeout = 120

# Sampling temperature for every role
temperature = 0.0

# Tool calls allowed per role invocation
max_tool_rounds = 8

[llm.providers.openai]
enabled = true
api_key = "${OPENAI_API_KEY}"
default_model = "gpt-4o"

[llm.providers.gemini]
enabled = true
api_key = "${GOOGLE_API_KEY}"
default_model = "gemini-2.0-flash"

[llm.providers.ollama]
enabled = true
base_url = "http://localhost:11434"
default_model = "llama3.1"

# Route a single role to a different model
[llm.roles.verifier]
provider = "gemini"
model = "gemini-1.5-pro"

[tools]
tavily_api_key = "${TAVILY_API_KEY}"
wikipedia_results = 3
arxiv_results = 3
max_result_chars = 8000

[tools.sandbox]
# Receives Python source on stdin; must isolate it from the host
command = ["docker", "run", "--rm", "-i", "--network", "none", "python:3.12-slim", "python", "-"]
timeout = 60

[runs]
# Keep run checkpoints on disk (omit to keep them in memory)
checkpoint_dir = ".polymath/runs"
max_steps = 8
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PolymathConfig::default();
        assert_eq!(config.llm.default_provider, "ollama");
        assert!(config.llm.providers.contains_key("ollama"));
        assert_eq!(config.runs.max_steps, 8);
        assert_eq!(config.llm.temperature, 0.0);
    }

    #[test]
    fn test_expand_env_var() {
        let regex = Regex::new(r"\$\{([^}]+)\}").unwrap();
        std::env::set_var("POLYMATH_TEST_VAR", "test_value");
        let result = expand_string("prefix_${POLYMATH_TEST_VAR}_suffix", &regex);
        assert_eq!(result, "prefix_test_value_suffix");
        std::env::remove_var("POLYMATH_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let regex = Regex::new(r"\$\{([^}]+)\}").unwrap();
        let result = expand_string("${POLYMATH_NONEXISTENT_VAR}", &regex);
        assert_eq!(result, "${POLYMATH_NONEXISTENT_VAR}");
    }

    #[test]
    fn test_sample_config_parses() {
        let config: PolymathConfig = toml::from_str(sample_config()).unwrap();
        assert_eq!(config.llm.default_provider, "openai");
        assert_eq!(config.llm.roles["verifier"].model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(config.tools.sandbox.timeout, 60);
        assert_eq!(
            config.runs.checkpoint_dir,
            Some(PathBuf::from(".polymath/runs"))
        );
    }

    #[test]
    fn test_load_from_file_applies_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".polymath.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[llm]\ndefault_provider = \"gemini\"\n\n[runs]\nmax_steps = 12").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.runs.max_steps, 12);
        assert_eq!(config.llm.timeout, 120);
        assert_eq!(config.llm.max_tool_rounds, 8);
        assert!(config.llm.providers.contains_key("ollama"));
        assert_eq!(config.tools.wikipedia_results, 3);
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[llm\ndefault_provider = ").unwrap();

        assert!(matches!(load_from_file(&path), Err(ConfigError::ParseError(_))));
    }
}
