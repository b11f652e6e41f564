use super::{conversation_with, RoleContext, RoleOutcome};
use crate::llm::ChatMessage;
use crate::orchestration::prompts;
use crate::orchestration::state::{SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role};
use crate::tools::ToolSet;
use crate::Result;

/// Verifier: critiques the draft held in `pending_input`
pub(super) fn run(state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    let output = ctx.invoke(
        Role::Verifier,
        prompts::verifier(state.pending_input(), state.transcript()),
        &ToolSet::empty(),
        conversation_with(state, ChatMessage::user(state.question())),
    )?;

    Ok(RoleOutcome {
        update: StateUpdate::new()
            .record(Role::Verifier, &output)
            .pending_input(output.clone())
            .answer_feedback(output),
        next: NextStep::Goto(Role::Generator),
    })
}
