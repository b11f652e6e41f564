//! Configuration module for Polymath
//!
//! Handles loading and parsing of `.polymath.toml` configuration files
//! with support for environment variable expansion.

mod loader;
mod types;

pub use loader::{load_config, load_from_file, sample_config, ConfigError};
pub use types::{
    LlmConfig, PolymathConfig, ProviderConfig, RoleModelConfig, RunsConfig, SandboxConfig,
    ToolsConfig,
};
