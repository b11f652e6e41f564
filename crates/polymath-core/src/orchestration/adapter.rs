//! Capability adapter: one role invocation against a language model
//!
//! From the orchestrator's point of view an invocation is atomic. Any tool
//! calls the model makes along the way happen inside [`LlmAdapter::invoke`].

use super::prompts;
use super::types::Role;
use crate::config::LlmConfig;
use crate::llm::{ChatMessage, CompletionOptions, ProviderRegistry};
use crate::tools::ToolSet;
use crate::{PolymathError, Result};
use std::sync::Arc;
use std::time::Duration;

/// Everything a role hands to the adapter
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub role: Role,
    /// Fully rendered instruction for this role
    pub instruction: String,
    pub tools: &'a ToolSet,
    pub conversation: Vec<ChatMessage>,
}

/// The role's concluding output
#[derive(Debug, Clone)]
pub struct AdapterResponse {
    pub output: String,
    pub raw: serde_json::Value,
}

/// Uniform interface for invoking a role
pub trait CapabilityAdapter: Send + Sync {
    /// Run the role to completion and return its final text
    ///
    /// Fails with `EmptyResponse` when no final text is produced. No retries
    /// happen at this layer.
    fn invoke(&self, invocation: &Invocation<'_>) -> Result<AdapterResponse>;
}

/// Shared handle to an adapter
pub type SharedAdapter = Arc<dyn CapabilityAdapter>;

/// Model call settings shared by all roles
#[derive(Debug, Clone)]
pub struct AdapterOptions {
    pub temperature: f32,
    pub timeout: Duration,
    pub max_tool_rounds: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            timeout: Duration::from_secs(120),
            max_tool_rounds: 8,
        }
    }
}

impl AdapterOptions {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout),
            max_tool_rounds: config.max_tool_rounds,
        }
    }

    fn completion(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            timeout: self.timeout,
            max_tokens: None,
        }
    }
}

/// One parsed model turn inside the tool loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelAction {
    /// Call a tool with the given input
    Call { tool: String, input: String },
    /// Finished; this is the role's output
    Final(String),
}

/// Interpret a model reply under the JSON tool protocol
///
/// Replies that are not a JSON object naming an `action` or a `final_answer`
/// are taken verbatim as the final answer.
pub fn parse_action(content: &str) -> ModelAction {
    let clean = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let Ok(serde_json::Value::Object(json)) = serde_json::from_str::<serde_json::Value>(clean)
    else {
        return ModelAction::Final(content.trim().to_string());
    };

    if let Some(answer) = json.get("final_answer") {
        return ModelAction::Final(value_text(answer));
    }

    if let Some(tool) = json.get("action").and_then(|a| a.as_str()) {
        let input = json
            .get("input")
            .or_else(|| json.get("action_input"))
            .map(value_text)
            .unwrap_or_default();
        return ModelAction::Call {
            tool: tool.to_string(),
            input,
        };
    }

    ModelAction::Final(content.trim().to_string())
}

fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Adapter backed by the configured model providers
pub struct LlmAdapter {
    registry: Arc<ProviderRegistry>,
    options: AdapterOptions,
}

impl LlmAdapter {
    pub fn new(registry: Arc<ProviderRegistry>, options: AdapterOptions) -> Self {
        Self { registry, options }
    }

    fn non_empty(role: Role, text: &str) -> Result<String> {
        let text = text.trim();
        if text.is_empty() {
            Err(PolymathError::EmptyResponse { role })
        } else {
            Ok(text.to_string())
        }
    }
}

impl CapabilityAdapter for LlmAdapter {
    fn invoke(&self, invocation: &Invocation<'_>) -> Result<AdapterResponse> {
        let role = invocation.role;
        let provider = self.registry.for_role(role.as_str())?;
        let options = self.options.completion();

        let mut system = invocation.instruction.clone();
        if !invocation.tools.is_empty() {
            system.push_str("\n\n");
            system.push_str(&prompts::tool_protocol(invocation.tools));
        }

        let mut messages = Vec::with_capacity(invocation.conversation.len() + 1);
        messages.push(ChatMessage::system(system));
        messages.extend(invocation.conversation.iter().cloned());

        if invocation.tools.is_empty() {
            let completion = provider.complete(&messages, &options)?;
            let output = Self::non_empty(role, &completion.text)?;
            return Ok(AdapterResponse {
                output,
                raw: completion.raw,
            });
        }

        for round in 0..self.options.max_tool_rounds {
            let completion = provider.complete(&messages, &options)?;
            match parse_action(&completion.text) {
                ModelAction::Final(answer) => {
                    tracing::debug!(role = %role, rounds = round, "role finished");
                    return Ok(AdapterResponse {
                        output: Self::non_empty(role, &answer)?,
                        raw: completion.raw,
                    });
                }
                ModelAction::Call { tool, input } => {
                    tracing::debug!(role = %role, round, tool = %tool, "model requested tool");
                    let observation = invocation.tools.call(&tool, &input);
                    messages.push(ChatMessage::assistant(completion.text));
                    messages.push(ChatMessage::user(prompts::observation(&tool, &observation)));
                }
            }
        }

        tracing::debug!(
            role = %role,
            limit = self.options.max_tool_rounds,
            "tool round limit reached, asking for final answer"
        );
        messages.push(ChatMessage::user(prompts::FINAL_ANSWER_NUDGE));
        let completion = provider.complete(&messages, &options)?;
        match parse_action(&completion.text) {
            ModelAction::Final(answer) => Ok(AdapterResponse {
                output: Self::non_empty(role, &answer)?,
                raw: completion.raw,
            }),
            ModelAction::Call { .. } => Err(PolymathError::EmptyResponse { role }),
        }
    }
}
