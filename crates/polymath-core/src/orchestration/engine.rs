//! Graph engine
//!
//! Drives a run from the router to the terminal state one role at a time.
//! Each step dispatches the current role, checks the requested edge against
//! the transition table, validates the update, applies it, and checkpoints.
//!
//! ```text
//! START -> router
//! router -> researcher | reasoner | data_analyst
//! researcher -> reasoner
//! reasoner -> generator
//! data_analyst -> generator
//! generator -> verifier | TERMINAL
//! verifier -> generator
//! ```

use super::adapter::SharedAdapter;
use super::events::RunEvent;
use super::roles::{self, RoleContext, RoleOutcome};
use super::state::SharedState;
use super::store::{Checkpoint, InMemoryRunStore, RunStatus, RunStore};
use super::types::{NextStep, Role, RunId};
use crate::tools::ToolRegistry;
use crate::{PolymathError, Result};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Whether the graph has an edge `from -> to`
pub fn transition_allowed(from: Role, to: NextStep) -> bool {
    use NextStep::{Goto, Terminal};
    matches!(
        (from, to),
        (Role::Router, Goto(Role::Researcher | Role::Reasoner | Role::DataAnalyst))
            | (Role::Researcher, Goto(Role::Reasoner))
            | (Role::Reasoner, Goto(Role::Generator))
            | (Role::DataAnalyst, Goto(Role::Generator))
            | (Role::Generator, Goto(Role::Verifier) | Terminal)
            | (Role::Verifier, Goto(Role::Generator))
    )
}

/// Check a role's update against the state invariants
///
/// - only the verifier sets feedback, and it always sets some
/// - the generator clears feedback on every pass
/// - a final answer appears only on the generator's terminal step, and that
///   step must carry one
pub fn validate_update(role: Role, outcome: &RoleOutcome) -> Result<()> {
    let update = &outcome.update;
    let non_empty = |field: &Option<String>| field.as_deref().map_or(false, |s| !s.is_empty());

    match role {
        Role::Verifier if !non_empty(&update.answer_feedback) => {
            return Err(PolymathError::invalid_update(role, "verifier must provide feedback"));
        }
        Role::Generator if update.answer_feedback.as_deref() != Some("") => {
            return Err(PolymathError::invalid_update(role, "generator must clear feedback"));
        }
        Role::Verifier | Role::Generator => {}
        _ if non_empty(&update.answer_feedback) => {
            return Err(PolymathError::invalid_update(role, "only the verifier may set feedback"));
        }
        _ => {}
    }

    let sets_final = non_empty(&update.final_answer);
    let terminal = outcome.next.is_terminal();
    if sets_final && !(role == Role::Generator && terminal) {
        return Err(PolymathError::invalid_update(
            role,
            "final answer may only be set on the terminal step",
        ));
    }
    if terminal && !sets_final {
        return Err(PolymathError::invalid_update(role, "terminal step without a final answer"));
    }

    Ok(())
}

/// Engine limits
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Abort a run that has not terminated after this many steps
    pub max_steps: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self { max_steps: 8 }
    }
}

/// Result of one applied step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step number within the run
    pub step: usize,
    pub role: Role,
    pub next: NextStep,
    /// State after the update was applied
    pub state: SharedState,
}

/// The graph engine
///
/// Every run owns its own state, so one orchestrator can drive many runs
/// concurrently. A given run is driven by at most one [`Execution`] at a time.
pub struct Orchestrator {
    adapter: SharedAdapter,
    tools: ToolRegistry,
    store: Arc<dyn RunStore>,
    options: OrchestratorOptions,
    /// Runs with a live execution
    in_flight: Mutex<HashSet<RunId>>,
}

impl Orchestrator {
    /// Create an orchestrator with an in-memory run store
    pub fn new(adapter: SharedAdapter, tools: ToolRegistry) -> Self {
        Self {
            adapter,
            tools,
            store: Arc::new(InMemoryRunStore::new()),
            options: OrchestratorOptions::default(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    /// Begin a new run at the router under a fresh identifier
    pub fn start(&self, state: SharedState) -> Execution<'_> {
        let run_id = RunId::new();
        self.in_flight.lock().insert(run_id);
        let claim = RunClaim {
            in_flight: &self.in_flight,
            run_id,
        };
        self.execution(claim, state, Some(Role::Router), 0)
    }

    /// Begin a new run under a caller-chosen identifier
    ///
    /// Fails with `RunExists` if the store already holds a checkpoint for
    /// `run_id`, and with `RunInProgress` if another execution owns it.
    pub fn start_with_id(&self, run_id: RunId, state: SharedState) -> Result<Execution<'_>> {
        let claim = self.claim(run_id)?;
        if self.store.load(run_id)?.is_some() {
            return Err(PolymathError::RunExists { run_id });
        }
        Ok(self.execution(claim, state, Some(Role::Router), 0))
    }

    /// Drive a new run to the terminal state
    pub fn run(&self, state: SharedState) -> Result<SharedState> {
        self.start(state).run_to_end()
    }

    fn claim(&self, run_id: RunId) -> Result<RunClaim<'_>> {
        if !self.in_flight.lock().insert(run_id) {
            return Err(PolymathError::RunInProgress { run_id });
        }
        Ok(RunClaim {
            in_flight: &self.in_flight,
            run_id,
        })
    }

    fn execution<'a>(
        &'a self,
        claim: RunClaim<'a>,
        state: SharedState,
        next: Option<Role>,
        step: usize,
    ) -> Execution<'a> {
        Execution {
            orchestrator: self,
            run_id: claim.run_id,
            state,
            next,
            step,
            started: false,
            done: next.is_none(),
            events: None,
            _claim: claim,
        }
    }

    /// Continue a checkpointed run
    ///
    /// A failed run retries the role that failed. A completed run yields an
    /// execution that is already finished.
    pub fn resume(&self, run_id: RunId) -> Result<Execution<'_>> {
        let claim = self.claim(run_id)?;
        let checkpoint = self
            .store
            .load(run_id)?
            .ok_or_else(|| PolymathError::not_found(format!("run {}", run_id)))?;

        let next = match checkpoint.status {
            RunStatus::Completed => None,
            RunStatus::Running | RunStatus::Failed { .. } => checkpoint.next,
        };

        tracing::info!(run_id = %run_id, step = checkpoint.step, next = ?next, "resuming run");

        Ok(self.execution(claim, checkpoint.state, next, checkpoint.step))
    }

    /// Latest checkpoint for a run
    pub fn checkpoint(&self, run_id: RunId) -> Result<Option<Checkpoint>> {
        self.store.load(run_id)
    }
}

/// Marks a run as owned by a live execution until dropped
struct RunClaim<'a> {
    in_flight: &'a Mutex<HashSet<RunId>>,
    run_id: RunId,
}

impl Drop for RunClaim<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.run_id);
    }
}

/// One run in progress
///
/// Only this type mutates the run's state. Dropping it between steps
/// cancels the run and releases it; the last checkpoint remains resumable.
pub struct Execution<'a> {
    orchestrator: &'a Orchestrator,
    run_id: RunId,
    state: SharedState,
    next: Option<Role>,
    step: usize,
    started: bool,
    done: bool,
    events: Option<Sender<RunEvent>>,
    _claim: RunClaim<'a>,
}

impl<'a> Execution<'a> {
    /// Publish progress on a channel
    pub fn with_events(mut self, sender: Sender<RunEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Role that runs on the next call to [`step`](Self::step)
    pub fn next_role(&self) -> Option<Role> {
        if self.done {
            None
        } else {
            self.next
        }
    }

    /// Steps applied so far
    pub fn steps(&self) -> usize {
        self.step
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Apply exactly one role
    ///
    /// Returns `Ok(None)` once the run is finished. On error nothing is
    /// applied, the run is checkpointed as failed, and the execution stops.
    pub fn step(&mut self) -> Result<Option<StepRecord>> {
        if self.done {
            return Ok(None);
        }
        let Some(role) = self.next else {
            self.done = true;
            return Ok(None);
        };

        if !self.started {
            self.started = true;
            self.emit(RunEvent::Started {
                run_id: self.run_id,
                question: self.state.question().to_string(),
                role,
            });
            if self.step == 0 {
                if let Err(e) = self.save(RunStatus::Running) {
                    return Err(self.fail(role, e));
                }
            }
        }

        let orchestrator = self.orchestrator;
        let limit = orchestrator.options.max_steps;
        if self.step >= limit {
            return Err(self.fail(role, PolymathError::StepLimit { limit }));
        }

        let ctx = RoleContext {
            adapter: orchestrator.adapter.as_ref(),
            tools: &orchestrator.tools,
        };
        let outcome = match roles::dispatch(role, &self.state, &ctx).and_then(|outcome| {
            if !transition_allowed(role, outcome.next) {
                return Err(PolymathError::InvalidTransition {
                    from: role,
                    to: outcome.next,
                });
            }
            validate_update(role, &outcome)?;
            Ok(outcome)
        }) {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.fail(role, e)),
        };

        let next = outcome.next;
        self.state.apply(outcome.update);
        self.step += 1;
        self.next = next.role();

        let status = if next.is_terminal() {
            RunStatus::Completed
        } else {
            RunStatus::Running
        };
        if let Err(e) = self.save(status) {
            return Err(self.fail(role, e));
        }

        tracing::info!(
            run_id = %self.run_id,
            step = self.step,
            role = %role,
            next = %next,
            "step applied"
        );

        let record = StepRecord {
            step: self.step,
            role,
            next,
            state: self.state.clone(),
        };

        self.emit(RunEvent::Step {
            run_id: self.run_id,
            step: record.step,
            role,
            next,
            state: record.state.clone(),
        });

        if next.is_terminal() {
            self.done = true;
            self.emit(RunEvent::Finished {
                run_id: self.run_id,
                answer: self.state.final_answer().to_string(),
            });
        }

        Ok(Some(record))
    }

    /// Step until the terminal state and return the final state
    pub fn run_to_end(mut self) -> Result<SharedState> {
        while self.step()?.is_some() {}
        Ok(self.state)
    }

    /// Consume the execution, returning the state as it stands
    pub fn into_state(self) -> SharedState {
        self.state
    }

    fn save(&self, status: RunStatus) -> Result<()> {
        let checkpoint = Checkpoint::new(
            self.run_id,
            self.step,
            self.next,
            status,
            self.state.clone(),
        );
        self.orchestrator.store.save(&checkpoint)
    }

    /// Record a failure; `next` stays on the failed role so a resume retries it
    fn fail(&mut self, role: Role, error: PolymathError) -> PolymathError {
        self.done = true;
        self.next = Some(role);

        tracing::error!(
            run_id = %self.run_id,
            role = %role,
            step = self.step,
            error = %error,
            "run aborted"
        );

        let reason = error.to_string();
        if let Err(e) = self.save(RunStatus::Failed {
            reason: reason.clone(),
        }) {
            tracing::warn!(run_id = %self.run_id, error = %e, "could not checkpoint failed run");
        }

        self.emit(RunEvent::Failed {
            run_id: self.run_id,
            role: Some(role),
            reason,
        });

        error
    }

    fn emit(&self, event: RunEvent) {
        if let Some(sender) = &self.events {
            let _ = sender.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::state::StateUpdate;

    fn outcome(update: StateUpdate, next: NextStep) -> RoleOutcome {
        RoleOutcome { update, next }
    }

    #[test]
    fn test_transition_table() {
        use NextStep::{Goto, Terminal};

        assert!(transition_allowed(Role::Router, Goto(Role::Researcher)));
        assert!(transition_allowed(Role::Router, Goto(Role::DataAnalyst)));
        assert!(transition_allowed(Role::Researcher, Goto(Role::Reasoner)));
        assert!(transition_allowed(Role::Generator, Terminal));
        assert!(transition_allowed(Role::Verifier, Goto(Role::Generator)));

        assert!(!transition_allowed(Role::Router, Goto(Role::Generator)));
        assert!(!transition_allowed(Role::Router, Terminal));
        assert!(!transition_allowed(Role::Researcher, Goto(Role::Generator)));
        assert!(!transition_allowed(Role::Reasoner, Terminal));
        assert!(!transition_allowed(Role::Verifier, Terminal));
        for role in Role::ALL {
            assert!(!transition_allowed(role, Goto(Role::Router)));
        }
    }

    #[test]
    fn test_feedback_only_from_verifier() {
        let bad = outcome(
            StateUpdate::new().answer_feedback("looks wrong"),
            NextStep::Goto(Role::Generator),
        );
        assert!(validate_update(Role::Reasoner, &bad).is_err());
        assert!(validate_update(Role::Verifier, &bad).is_ok());
    }

    #[test]
    fn test_verifier_must_give_feedback() {
        let silent = outcome(StateUpdate::new(), NextStep::Goto(Role::Generator));
        assert!(validate_update(Role::Verifier, &silent).is_err());
    }

    #[test]
    fn test_generator_must_clear_feedback() {
        let keeps = outcome(
            StateUpdate::new().draft_answer("4"),
            NextStep::Goto(Role::Verifier),
        );
        assert!(validate_update(Role::Generator, &keeps).is_err());

        let clears = outcome(
            StateUpdate::new().draft_answer("4").answer_feedback(""),
            NextStep::Goto(Role::Verifier),
        );
        assert!(validate_update(Role::Generator, &clears).is_ok());
    }

    #[test]
    fn test_final_answer_only_when_terminal() {
        let early = outcome(
            StateUpdate::new().answer_feedback("").final_answer("4"),
            NextStep::Goto(Role::Verifier),
        );
        assert!(validate_update(Role::Generator, &early).is_err());

        let empty_terminal = outcome(
            StateUpdate::new().answer_feedback("").final_answer(""),
            NextStep::Terminal,
        );
        assert!(validate_update(Role::Generator, &empty_terminal).is_err());

        let ok = outcome(
            StateUpdate::new().answer_feedback("").final_answer("4"),
            NextStep::Terminal,
        );
        assert!(validate_update(Role::Generator, &ok).is_ok());
    }
}
