use super::{conversation_with, RoleContext, RoleOutcome};
use crate::llm::ChatMessage;
use crate::orchestration::prompts;
use crate::orchestration::state::{SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role};
use crate::tools::ToolSet;
use crate::Result;

/// Reasoner: no tools, optionally sees the attached image
pub(super) fn run(state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    let turn = match state.image() {
        Some(image) => ChatMessage::user_with_image(state.pending_input(), image),
        None => ChatMessage::user(state.pending_input()),
    };

    let output = ctx.invoke(
        Role::Reasoner,
        prompts::reasoner(state.question(), state.transcript()),
        &ToolSet::empty(),
        conversation_with(state, turn),
    )?;

    Ok(RoleOutcome {
        update: StateUpdate::new()
            .record(Role::Reasoner, &output)
            .pending_input(output),
        next: NextStep::Goto(Role::Generator),
    })
}
