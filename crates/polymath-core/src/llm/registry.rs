//! Provider registry for managing multiple LLM providers

use super::{
    GeminiProvider, LlmError, LlmProvider, OllamaProvider, OpenAIProvider, ProviderStatus,
    SharedProvider,
};
use crate::config::{PolymathConfig, ProviderConfig};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for managing multiple LLM providers
///
/// Holds one shared instance per enabled provider, plus dedicated instances
/// for roles whose configuration pins a different provider or model.
pub struct ProviderRegistry {
    /// All registered providers
    providers: HashMap<String, SharedProvider>,

    /// Providers bound to a single role, keyed by role name
    role_providers: RwLock<HashMap<String, SharedProvider>>,

    /// Currently active provider ID
    active_provider: RwLock<String>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            role_providers: RwLock::new(HashMap::new()),
            active_provider: RwLock::new(String::new()),
        }
    }

    /// Create a registry from configuration
    pub fn from_config(config: &PolymathConfig) -> Self {
        let mut registry = Self::new();

        *registry.active_provider.write() = config.llm.default_provider.clone();

        for (id, provider_config) in &config.llm.providers {
            if !provider_config.enabled {
                continue;
            }
            match build_provider(id, provider_config, None) {
                Some(provider) => registry.register(provider),
                None => tracing::warn!(provider = %id, "unknown provider in config, skipping"),
            }
        }

        for (role, role_config) in &config.llm.roles {
            let provider_id = role_config
                .provider
                .clone()
                .unwrap_or_else(|| config.llm.default_provider.clone());
            let Some(provider_config) = config.get_provider(&provider_id) else {
                tracing::warn!(role = %role, provider = %provider_id, "role override names an unconfigured provider");
                continue;
            };
            if let Some(provider) =
                build_provider(&provider_id, provider_config, role_config.model.as_deref())
            {
                registry
                    .role_providers
                    .write()
                    .insert(role.clone(), provider);
            }
        }

        registry
    }

    /// Register a provider
    pub fn register(&mut self, provider: SharedProvider) {
        let id = provider.id().to_string();
        if self.active_provider.read().is_empty() {
            *self.active_provider.write() = id.clone();
        }
        self.providers.insert(id, provider);
    }

    /// Get a provider by ID
    pub fn get(&self, id: &str) -> Option<SharedProvider> {
        self.providers.get(id).cloned()
    }

    /// Get the currently active provider
    pub fn active(&self) -> Option<SharedProvider> {
        let id = self.active_provider.read();
        self.get(&id)
    }

    /// Get active provider ID
    pub fn active_id(&self) -> String {
        self.active_provider.read().clone()
    }

    /// Bind a role to a specific provider instance
    pub fn set_role_provider(&self, role: &str, provider: SharedProvider) {
        self.role_providers
            .write()
            .insert(role.to_string(), provider);
    }

    /// Provider that serves `role`: its override if one exists, else the active provider
    pub fn for_role(&self, role: &str) -> Result<SharedProvider, LlmError> {
        if let Some(provider) = self.role_providers.read().get(role) {
            return Ok(provider.clone());
        }
        self.active().ok_or_else(|| {
            LlmError::ProviderUnavailable(format!(
                "Provider '{}' not registered (is it enabled?)",
                self.active_id()
            ))
        })
    }

    /// Status of every registered provider, sorted by ID
    ///
    /// Role overrides are listed after the shared providers. Checking status
    /// may touch the network (Ollama pings its server).
    pub fn provider_info(&self) -> Vec<ProviderInfo> {
        let active = self.active_id();
        let mut shared: Vec<ProviderInfo> = self
            .providers
            .values()
            .map(|p| ProviderInfo::new(p.as_ref(), None, p.id() == active))
            .collect();
        shared.sort_by(|a, b| a.id.cmp(&b.id));

        let mut roles: Vec<ProviderInfo> = self
            .role_providers
            .read()
            .iter()
            .map(|(role, p)| ProviderInfo::new(p.as_ref(), Some(role.clone()), false))
            .collect();
        roles.sort_by(|a, b| a.role.cmp(&b.role));

        shared.extend(roles);
        shared
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Construct a provider from its configuration block
///
/// Returns `None` for provider IDs this crate does not implement.
pub fn build_provider(
    id: &str,
    config: &ProviderConfig,
    model: Option<&str>,
) -> Option<SharedProvider> {
    let api_key = config.api_key.clone().unwrap_or_default();
    let model = model
        .map(str::to_string)
        .or_else(|| config.default_model.clone());

    let provider: SharedProvider = match id {
        "openai" => {
            let mut provider =
                OpenAIProvider::new(&api_key, model.as_deref().unwrap_or("gpt-4o"));
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        "gemini" => {
            let mut provider =
                GeminiProvider::new(&api_key, model.as_deref().unwrap_or("gemini-2.0-flash"));
            if let Some(url) = &config.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider)
        }
        "ollama" => Arc::new(OllamaProvider::new(
            config
                .base_url
                .as_deref()
                .unwrap_or("http://localhost:11434"),
            model.as_deref().unwrap_or("llama3.1"),
        )),
        _ => return None,
    };

    Some(provider)
}

/// Provider summary for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub model: String,
    /// Role this instance is dedicated to, if it is an override
    pub role: Option<String>,
    /// Whether this is the default provider for roles without overrides
    pub active: bool,
    pub status: ProviderStatus,
}

impl ProviderInfo {
    fn new(provider: &dyn LlmProvider, role: Option<String>, active: bool) -> Self {
        Self {
            id: provider.id().to_string(),
            name: provider.name().to_string(),
            model: provider.model(),
            role,
            active,
            status: provider.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoleModelConfig;
    use pretty_assertions::assert_eq;

    fn config_with_openai() -> PolymathConfig {
        let mut config = PolymathConfig::default();
        config.llm.default_provider = "openai".to_string();
        if let Some(openai) = config.llm.providers.get_mut("openai") {
            openai.enabled = true;
            openai.api_key = Some("sk-test".to_string());
        }
        config
    }

    #[test]
    fn test_from_config_registers_enabled_providers() {
        let registry = ProviderRegistry::from_config(&PolymathConfig::default());
        assert!(registry.get("ollama").is_some());
        assert!(registry.get("openai").is_none());
        assert_eq!(registry.active_id(), "ollama");
    }

    #[test]
    fn test_role_override_gets_own_instance() {
        let mut config = config_with_openai();
        config.llm.roles.insert(
            "verifier".to_string(),
            RoleModelConfig {
                provider: None,
                model: Some("gpt-4o-mini".to_string()),
            },
        );

        let registry = ProviderRegistry::from_config(&config);
        let verifier = registry.for_role("verifier").unwrap();
        let router = registry.for_role("router").unwrap();

        assert_eq!(verifier.id(), "openai");
        assert_eq!(verifier.model(), "gpt-4o-mini");
        assert_eq!(router.model(), "gpt-4o");
    }

    #[test]
    fn test_for_role_without_active_provider() {
        let mut config = PolymathConfig::default();
        config.llm.default_provider = "openai".to_string();
        let registry = ProviderRegistry::from_config(&config);

        let Err(err) = registry.for_role("router") else {
            panic!("router resolved without an active provider");
        };
        assert!(matches!(err, LlmError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_role_override_with_unconfigured_provider_is_skipped() {
        let mut config = config_with_openai();
        config.llm.roles.insert(
            "reasoner".to_string(),
            RoleModelConfig {
                provider: Some("mistral".to_string()),
                model: None,
            },
        );

        let registry = ProviderRegistry::from_config(&config);
        assert_eq!(registry.for_role("reasoner").unwrap().id(), "openai");
    }

    #[test]
    fn test_provider_info_lists_shared_then_roles() {
        let mut config = config_with_openai();
        if let Some(ollama) = config.llm.providers.get_mut("ollama") {
            ollama.enabled = false;
        }
        config.llm.roles.insert(
            "verifier".to_string(),
            RoleModelConfig {
                provider: None,
                model: Some("gpt-4o-mini".to_string()),
            },
        );

        let info = ProviderRegistry::from_config(&config).provider_info();
        assert_eq!(
            info,
            vec![
                ProviderInfo {
                    id: "openai".to_string(),
                    name: "OpenAI".to_string(),
                    model: "gpt-4o".to_string(),
                    role: None,
                    active: true,
                    status: ProviderStatus::Ready,
                },
                ProviderInfo {
                    id: "openai".to_string(),
                    name: "OpenAI".to_string(),
                    model: "gpt-4o-mini".to_string(),
                    role: Some("verifier".to_string()),
                    active: false,
                    status: ProviderStatus::Ready,
                },
            ]
        );
    }

    #[test]
    fn test_build_unknown_provider() {
        assert!(build_provider("anthropic", &ProviderConfig::default(), None).is_none());
    }
}
