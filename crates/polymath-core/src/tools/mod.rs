//! External capabilities a role may call during its own invocation
//!
//! Every tool takes one natural-language (or code) input and returns text.
//! Failures never escape a [`ToolSet`]: they come back as a descriptive string
//! so the calling role can decide what to do next.

mod arxiv;
mod python;
mod web_search;
mod wikipedia;

pub use arxiv::ArxivTool;
pub use python::PythonSandboxTool;
pub use web_search::WebSearchTool;
pub use wikipedia::WikipediaTool;

use crate::config::ToolsConfig;
use std::sync::Arc;
use std::time::Duration;

/// Error raised inside a tool implementation
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for ToolError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, _) => ToolError::Http(format!("HTTP {}", status)),
            ureq::Error::Transport(t) => ToolError::Http(t.to_string()),
        }
    }
}

/// A named external capability
pub trait Tool: Send + Sync {
    /// Identifier the model uses to call the tool
    fn name(&self) -> &str;

    /// One-line description shown to the model
    fn description(&self) -> &str;

    /// Run the tool on a single input
    fn call(&self, input: &str) -> Result<String, ToolError>;
}

/// Shared handle to a tool
pub type SharedTool = Arc<dyn Tool>;

/// Ordered set of tools granted to one role
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<SharedTool>,
    max_result_chars: Option<usize>,
}

impl ToolSet {
    /// A set with no tools
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a set from tools, keeping the given order
    pub fn new(tools: Vec<SharedTool>) -> Self {
        Self {
            tools,
            max_result_chars: None,
        }
    }

    /// Truncate tool output beyond `limit` characters
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.max_result_chars = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tool names in order
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Catalogue of `- name: description` lines
    pub fn describe(&self) -> String {
        self.tools
            .iter()
            .map(|t| format!("- {}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Call a tool by name; errors are rendered as text
    pub fn call(&self, name: &str, input: &str) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            tracing::warn!(tool = %name, "model requested an unknown tool");
            return format!(
                "Tool '{}' failed: no such tool (available: {})",
                name,
                self.names().join(", ")
            );
        };

        tracing::debug!(tool = %name, input_len = input.len(), "calling tool");
        match tool.call(input) {
            Ok(output) => self.truncate(output),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "tool call failed");
                format!("Tool '{}' failed: {}", name, e)
            }
        }
    }

    fn truncate(&self, output: String) -> String {
        match self.max_result_chars {
            Some(limit) if output.chars().count() > limit => {
                let mut cut: String = output.chars().take(limit).collect();
                cut.push_str("\n[output truncated]");
                cut
            }
            _ => output,
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.names())
            .field("max_result_chars", &self.max_result_chars)
            .finish()
    }
}

/// Tool sets for the roles that use tools
#[derive(Clone, Debug, Default)]
pub struct ToolRegistry {
    /// Lookup tools for the researcher
    pub research: ToolSet,

    /// Code execution for the data analyst
    pub analysis: ToolSet,
}

impl ToolRegistry {
    pub fn new(research: ToolSet, analysis: ToolSet) -> Self {
        Self { research, analysis }
    }

    /// Registry with no tools at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build both tool sets from configuration
    ///
    /// Web search is only offered when a Tavily key is configured.
    pub fn from_config(config: &ToolsConfig) -> crate::Result<Self> {
        let timeout = Duration::from_secs(config.timeout);

        let mut research: Vec<SharedTool> = Vec::new();
        match config.tavily_api_key.as_deref() {
            Some(key) if !key.is_empty() && !key.starts_with("${") => {
                research.push(Arc::new(WebSearchTool::new(key, timeout)));
            }
            _ => tracing::info!("no Tavily API key configured, web search disabled"),
        }
        research.push(Arc::new(WikipediaTool::new(config.wikipedia_results, timeout)));
        research.push(Arc::new(ArxivTool::new(config.arxiv_results, timeout)?));

        let sandbox = PythonSandboxTool::new(
            config.sandbox.command.clone(),
            Duration::from_secs(config.sandbox.timeout),
        )?;

        Ok(Self {
            research: ToolSet::new(research).with_result_limit(config.max_result_chars),
            analysis: ToolSet::new(vec![Arc::new(sandbox)])
                .with_result_limit(config.max_result_chars),
        })
    }
}

/// Remove a surrounding markdown code fence, if present
pub(crate) fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
