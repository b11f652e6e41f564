//! Generator: draft first, then exactly one refinement

use super::{conversation_with, RoleContext, RoleOutcome};
use crate::llm::ChatMessage;
use crate::orchestration::prompts;
use crate::orchestration::state::{GeneratorMode, SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role};
use crate::tools::ToolSet;
use crate::Result;

pub(super) fn run(
    state: &SharedState,
    mode: GeneratorMode,
    ctx: &RoleContext<'_>,
) -> Result<RoleOutcome> {
    let instruction = match &mode {
        GeneratorMode::Draft => prompts::generator_draft(state.transcript()),
        GeneratorMode::Refine { draft, feedback } => {
            prompts::generator_refine(draft, feedback, state.transcript())
        }
    };

    let output = ctx.invoke(
        Role::Generator,
        instruction,
        &ToolSet::empty(),
        conversation_with(state, ChatMessage::user(state.question())),
    )?;

    // Feedback is consumed on every pass.
    let update = StateUpdate::new()
        .record(Role::Generator, &output)
        .pending_input(output.clone())
        .answer_feedback("");

    Ok(match mode {
        GeneratorMode::Draft => RoleOutcome {
            update: update.draft_answer(output).final_answer(""),
            next: NextStep::Goto(Role::Verifier),
        },
        GeneratorMode::Refine { .. } => RoleOutcome {
            update: update.final_answer(output).draft_answer(""),
            next: NextStep::Terminal,
        },
    })
}
