//! Role agents
//!
//! Each role is a function of the current state: it renders its instruction,
//! calls the capability adapter once, and returns a [`RoleOutcome`]. None of
//! them touch the state directly.

mod data_analyst;
mod generator;
mod reasoner;
mod researcher;
mod router;
mod verifier;

pub use router::parse_route;

use super::adapter::{CapabilityAdapter, Invocation};
use super::state::{GeneratorMode, SharedState, StateUpdate};
use super::types::{NextStep, Role};
use crate::llm::ChatMessage;
use crate::tools::{ToolRegistry, ToolSet};
use crate::Result;

/// What a role step produced
#[derive(Debug, Clone, PartialEq)]
pub struct RoleOutcome {
    pub update: StateUpdate,
    pub next: NextStep,
}

/// Collaborators available to every role
pub(crate) struct RoleContext<'a> {
    pub adapter: &'a dyn CapabilityAdapter,
    pub tools: &'a ToolRegistry,
}

impl RoleContext<'_> {
    /// Invoke the adapter and return the role's output text
    fn invoke(
        &self,
        role: Role,
        instruction: String,
        tools: &ToolSet,
        conversation: Vec<ChatMessage>,
    ) -> Result<String> {
        let response = self.adapter.invoke(&Invocation {
            role,
            instruction,
            tools,
            conversation,
        })?;
        Ok(response.output)
    }
}

/// Run one role against the state
pub(crate) fn dispatch(role: Role, state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    match role {
        Role::Router => router::run(state, ctx),
        Role::Researcher => researcher::run(state, ctx),
        Role::Reasoner => reasoner::run(state, ctx),
        Role::DataAnalyst => data_analyst::run(state, ctx),
        Role::Generator => generator::run(state, GeneratorMode::from_state(state), ctx),
        Role::Verifier => verifier::run(state, ctx),
    }
}

/// State messages followed by one new user turn for this role
fn conversation_with(state: &SharedState, turn: ChatMessage) -> Vec<ChatMessage> {
    let mut conversation = state.messages().to_vec();
    conversation.push(turn);
    conversation
}
