use super::{conversation_with, RoleContext, RoleOutcome};
use crate::llm::ChatMessage;
use crate::orchestration::prompts;
use crate::orchestration::state::{SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role};
use crate::Result;

/// Data analyst: runs model-written code through the sandbox tool only
pub(super) fn run(state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    let output = ctx.invoke(
        Role::DataAnalyst,
        prompts::data_analyst(state.question(), state.transcript()),
        &ctx.tools.analysis,
        conversation_with(state, ChatMessage::user(state.pending_input())),
    )?;

    Ok(RoleOutcome {
        update: StateUpdate::new()
            .record(Role::DataAnalyst, &output)
            .pending_input(output),
        next: NextStep::Goto(Role::Generator),
    })
}
