//! Polymath Core - Backend library for Polymath
//!
//! This crate answers questions with a fixed team of role agents that share
//! one state record:
//! - Router, Researcher, Reasoner, Data analyst, Generator, Verifier
//! - Capability adapter over LLM providers (OpenAI, Gemini, Ollama)
//! - External tools (web search, Wikipedia, arXiv, sandboxed Python)
//! - Checkpointed runs that can be inspected and resumed
//!
//! Any surface (CLI, HTTP server) consumes this crate through the
//! `QuestionAnswering` facade or drives an `Orchestrator` directly.
//!
//! # Architecture
//!
//! ```text
//!            ┌──────────┐
//!  START ──→ │  Router  │ ──┬──→ Researcher ──→ Reasoner ──┐
//!            └──────────┘   ├──→ Reasoner ─────────────────┤
//!                           └──→ Data analyst ─────────────┤
//!                                                          ▼
//!                            TERMINAL ←── Generator ⇄ Verifier
//! ```
//!
//! # Example
//!
//! ```no_run
//! use polymath_core::{PolymathConfig, QuestionAnswering};
//!
//! let config = PolymathConfig::default();
//! let service = QuestionAnswering::from_config(&config).unwrap();
//! println!("{}", service.answer("What is 2+2?"));
//! ```

// Public API modules
pub mod attachment;
pub mod error;

// Configuration loading
pub mod config;

// LLM provider system
pub mod llm;

// External capabilities available to roles
pub mod tools;

// Agent graph
pub mod orchestration;

// Main service facade
pub mod service;

pub use attachment::{seed_messages, Attachment, AttachmentKind, Seed};
pub use config::{load_config, PolymathConfig};
pub use error::{PolymathError, Result};
pub use llm::{ChatMessage, LlmError, LlmProvider, ProviderRegistry, SharedProvider};
pub use orchestration::{
    CapabilityAdapter, Checkpoint, Execution, LlmAdapter, NextStep, Orchestrator, Role,
    RouteTarget, RunEvent, RunId, RunStatus, RunStore, SharedState, StateUpdate, StepRecord,
};
pub use service::{QuestionAnswering, RunReport};
pub use tools::{Tool, ToolError, ToolRegistry, ToolSet};

/// Get the crate version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
