//! Agent orchestration graph
//!
//! A fixed team of roles answers one question by passing a shared state
//! record along the graph:
//! - Router: picks the first expert
//! - Researcher / Reasoner / Data analyst: gather and work through evidence
//! - Generator and Verifier: draft, critique, refine once, finish
//!
//! # Example
//!
//! ```no_run
//! use polymath_core::orchestration::{Orchestrator, SharedState};
//! # fn demo(orchestrator: &Orchestrator) -> polymath_core::Result<()> {
//! let mut execution = orchestrator.start(SharedState::new("What is 2+2?"));
//! while let Some(record) = execution.step()? {
//!     println!("{} -> {}", record.role, record.next);
//! }
//! println!("{}", execution.state().final_answer());
//! # Ok(())
//! # }
//! ```

mod adapter;
mod engine;
mod events;
pub mod prompts;
mod roles;
mod state;
mod store;
mod types;

pub use adapter::{
    parse_action, AdapterOptions, AdapterResponse, CapabilityAdapter, Invocation, LlmAdapter,
    ModelAction, SharedAdapter,
};
pub use engine::{
    transition_allowed, validate_update, Execution, Orchestrator, OrchestratorOptions,
    StepRecord,
};
pub use events::RunEvent;
pub use roles::{parse_route, RoleOutcome};
pub use state::{question_entry, transcript_entry, GeneratorMode, SharedState, StateUpdate};
pub use store::{Checkpoint, FileRunStore, InMemoryRunStore, RunStatus, RunStore};
pub use types::{NextStep, Role, RouteTarget, RunId};
