//! QuestionAnswering - Main backend facade
//!
//! The entry points any surface (CLI, HTTP server) calls. `answer` and
//! `answer_with_attachment` never fail: a run that aborts is logged and
//! yields an empty answer. `run` and `resume` expose the error and the full
//! run report for callers that want them.
//!
//! # Example
//!
//! ```no_run
//! use polymath_core::{load_config, QuestionAnswering};
//! use std::path::Path;
//!
//! let config = load_config(Path::new(".")).unwrap();
//! let service = QuestionAnswering::from_config(&config).unwrap();
//!
//! let report = service.run("Who wrote Dune?", None, None).unwrap();
//! println!("{} ({} steps)", report.answer, report.steps);
//! ```

use crate::attachment::Attachment;
use crate::config::PolymathConfig;
use crate::error::{PolymathError, Result};
use crate::llm::{ProviderInfo, ProviderRegistry};
use crate::orchestration::{
    AdapterOptions, Checkpoint, Execution, FileRunStore, InMemoryRunStore, LlmAdapter,
    Orchestrator, OrchestratorOptions, RunEvent, RunId, RunStore, SharedState,
};
use crate::tools::ToolRegistry;
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub answer: String,
    pub transcript: String,
    pub steps: usize,
    pub state: SharedState,
}

/// Question-answering service
pub struct QuestionAnswering {
    orchestrator: Orchestrator,
    /// Set when the adapter is backed by configured providers
    registry: Option<Arc<ProviderRegistry>>,
}

impl QuestionAnswering {
    /// Wire providers, tools and the run store from configuration
    pub fn from_config(config: &PolymathConfig) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::from_config(config));
        let adapter = Arc::new(LlmAdapter::new(
            registry.clone(),
            AdapterOptions::from_config(&config.llm),
        ));
        let tools = ToolRegistry::from_config(&config.tools)?;

        let store: Arc<dyn RunStore> = match &config.runs.checkpoint_dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "checkpointing runs to disk");
                Arc::new(FileRunStore::new(dir.clone()))
            }
            None => Arc::new(InMemoryRunStore::new()),
        };

        let orchestrator = Orchestrator::new(adapter, tools)
            .with_store(store)
            .with_options(OrchestratorOptions {
                max_steps: config.runs.max_steps,
            });

        Ok(Self {
            orchestrator,
            registry: Some(registry),
        })
    }

    /// Wrap an already-built orchestrator
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            registry: None,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Configured providers and their status; empty for a custom adapter
    ///
    /// Status checks may touch the network (Ollama is pinged).
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.registry
            .as_ref()
            .map(|registry| registry.provider_info())
            .unwrap_or_default()
    }

    /// Answer a plain question; empty on failure
    pub fn answer(&self, question: &str) -> String {
        self.answer_or_empty(self.run(question, None, None))
    }

    /// Answer a question with a pre-processed attachment; empty on failure
    pub fn answer_with_attachment(&self, question: &str, attachment: &Attachment) -> String {
        self.answer_or_empty(self.run(question, Some(attachment), None))
    }

    fn answer_or_empty(&self, result: Result<RunReport>) -> String {
        match result {
            Ok(report) => report.answer,
            Err(e) => {
                tracing::error!(error = %e, adapter_failure = e.is_adapter_failure(), "question answering failed");
                String::new()
            }
        }
    }

    /// Run a question under a fresh run ID
    pub fn run(
        &self,
        question: &str,
        attachment: Option<&Attachment>,
        events: Option<Sender<RunEvent>>,
    ) -> Result<RunReport> {
        self.run_as(RunId::new(), question, attachment, events)
    }

    /// Run a question under a caller-supplied run ID
    pub fn run_as(
        &self,
        run_id: RunId,
        question: &str,
        attachment: Option<&Attachment>,
        events: Option<Sender<RunEvent>>,
    ) -> Result<RunReport> {
        if question.trim().is_empty() {
            return Err(PolymathError::config("question must not be empty"));
        }

        let state = match attachment {
            Some(attachment) => SharedState::with_attachment(question, attachment),
            None => SharedState::new(question),
        };

        let execution = self.orchestrator.start_with_id(run_id, state)?;
        Self::finish(execution, events)
    }

    /// Continue a checkpointed run to completion
    pub fn resume(&self, run_id: RunId, events: Option<Sender<RunEvent>>) -> Result<RunReport> {
        let execution = self.orchestrator.resume(run_id)?;
        Self::finish(execution, events)
    }

    /// Latest checkpoint for a run
    pub fn checkpoint(&self, run_id: RunId) -> Result<Checkpoint> {
        self.orchestrator
            .checkpoint(run_id)?
            .ok_or_else(|| PolymathError::not_found(format!("run {}", run_id)))
    }

    /// All checkpointed runs, newest first
    pub fn runs(&self) -> Result<Vec<Checkpoint>> {
        self.orchestrator.store().list()
    }

    fn finish(execution: Execution<'_>, events: Option<Sender<RunEvent>>) -> Result<RunReport> {
        let run_id = execution.run_id();
        let mut execution = match events {
            Some(sender) => execution.with_events(sender),
            None => execution,
        };

        while execution.step()?.is_some() {}

        let steps = execution.steps();
        let state = execution.into_state();
        Ok(RunReport {
            run_id,
            answer: state.final_answer().to_string(),
            transcript: state.transcript().to_string(),
            steps,
            state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let service = QuestionAnswering::from_config(&PolymathConfig::default()).unwrap();
        assert!(service.runs().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_run() {
        let service = QuestionAnswering::from_config(&PolymathConfig::default()).unwrap();
        let err = service.checkpoint(RunId::new()).unwrap_err();
        assert!(matches!(err, PolymathError::NotFound(_)));
        assert!(service.resume(RunId::new(), None).is_err());
    }

    #[test]
    fn test_providers_follow_configuration() {
        let mut config = PolymathConfig::default();
        config.llm.default_provider = "gemini".to_string();
        for (id, provider) in config.llm.providers.iter_mut() {
            provider.enabled = id == "gemini";
        }

        let service = QuestionAnswering::from_config(&config).unwrap();
        let providers = service.providers();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id, "gemini");
        assert!(providers[0].active);
        assert_eq!(providers[0].role, None);
    }

    #[test]
    fn test_empty_question_rejected() {
        let service = QuestionAnswering::from_config(&PolymathConfig::default()).unwrap();
        assert!(service.run("   ", None, None).is_err());
        assert_eq!(service.answer(""), "");
    }
}
