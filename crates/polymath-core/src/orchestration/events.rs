//! Run progress notifications
//!
//! Serializable so that any surface (terminal, WebSocket) can forward them
//! as-is.

use super::state::SharedState;
use super::types::{NextStep, Role, RunId};
use serde::{Deserialize, Serialize};

/// Progress of a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RunEvent {
    /// Run started (or resumed) and is about to execute `role`
    Started {
        run_id: RunId,
        question: String,
        role: Role,
    },

    /// One role step was applied
    Step {
        run_id: RunId,

        /// 1-based step number
        step: usize,

        /// Role that just ran
        role: Role,

        /// Where control goes next
        next: NextStep,

        /// State after the step
        state: SharedState,
    },

    /// Run reached the terminal state
    Finished {
        run_id: RunId,
        answer: String,
    },

    /// Run aborted
    Failed {
        run_id: RunId,
        role: Option<Role>,
        reason: String,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            RunEvent::Started { run_id, .. }
            | RunEvent::Step { run_id, .. }
            | RunEvent::Finished { run_id, .. }
            | RunEvent::Failed { run_id, .. } => *run_id,
        }
    }

    /// Whether no further events follow for this run
    pub fn is_final(&self) -> bool {
        matches!(self, RunEvent::Finished { .. } | RunEvent::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_tag() {
        let run_id = RunId::new();
        let event = RunEvent::Finished {
            run_id,
            answer: "4".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Finished");
        assert_eq!(json["answer"], "4");
        assert_eq!(json["run_id"], run_id.to_string());
        assert!(event.is_final());
    }

    #[test]
    fn test_step_event_next_is_string() {
        let event = RunEvent::Step {
            run_id: RunId::new(),
            step: 2,
            role: Role::Reasoner,
            next: NextStep::Goto(Role::Generator),
            state: SharedState::new("q"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["role"], "reasoner");
        assert_eq!(json["next"], "generator");
        assert!(!event.is_final());
    }
}
