use super::{conversation_with, RoleContext, RoleOutcome};
use crate::llm::ChatMessage;
use crate::orchestration::prompts;
use crate::orchestration::state::{SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role};
use crate::Result;

/// Researcher: looks things up, then hands its findings to the reasoner
pub(super) fn run(state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    let output = ctx.invoke(
        Role::Researcher,
        prompts::researcher(state.transcript()),
        &ctx.tools.research,
        conversation_with(state, ChatMessage::user(state.pending_input())),
    )?;

    Ok(RoleOutcome {
        update: StateUpdate::new()
            .record(Role::Researcher, &output)
            .pending_input(output),
        next: NextStep::Goto(Role::Reasoner),
    })
}
