//! Router: picks the first expert

use super::{RoleContext, RoleOutcome};
use crate::orchestration::prompts;
use crate::orchestration::state::{question_entry, transcript_entry, SharedState, StateUpdate};
use crate::orchestration::types::{NextStep, Role, RouteTarget};
use crate::llm::ChatMessage;
use crate::tools::ToolSet;
use crate::{PolymathError, Result};

pub(super) fn run(state: &SharedState, ctx: &RoleContext<'_>) -> Result<RoleOutcome> {
    let output = ctx.invoke(
        Role::Router,
        prompts::router(state.question()),
        &ToolSet::empty(),
        state.messages().to_vec(),
    )?;

    let (target, input) = parse_route(&output)?;
    let input = if input.is_empty() {
        state.question().to_string()
    } else {
        input
    };

    let decision = format!("Route to {} agent with input {}", target.as_str(), input);

    let update = StateUpdate::new()
        .transcript(question_entry(state.question()))
        .transcript(transcript_entry(Role::Router, &decision))
        .message(ChatMessage::assistant(decision).with_name(Role::Router.as_str()))
        .active_role(target)
        .pending_input(input);

    Ok(RoleOutcome {
        update,
        next: NextStep::Goto(target.role()),
    })
}

/// Parse the router's `{"expert_agent", "agent_input"}` decision
///
/// Anything that does not name one of the route targets is a routing
/// failure, including output that is not JSON at all.
pub fn parse_route(content: &str) -> Result<(RouteTarget, String)> {
    let clean = content
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let routing_error = |value: &str| PolymathError::Routing {
        value: value.to_string(),
        allowed: RouteTarget::allowed(),
    };

    let json: serde_json::Value =
        serde_json::from_str(clean).map_err(|_| routing_error(clean))?;

    let agent = json
        .get("expert_agent")
        .and_then(|v| v.as_str())
        .ok_or_else(|| routing_error(clean))?;

    let target: RouteTarget = agent.parse().map_err(|_| routing_error(agent))?;

    let input = json
        .get("agent_input")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok((target, input))
}
