//! Shared state threaded through a run
//!
//! Roles never mutate [`SharedState`]. They return a [`StateUpdate`] and the
//! orchestrator applies it: scalar fields replace, `messages` and `transcript`
//! append.

use super::types::{Role, RouteTarget};
use crate::attachment::{seed_messages, Attachment, Seed};
use crate::llm::ChatMessage;
use serde::{Deserialize, Serialize};

/// The single record every role reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    question: String,
    messages: Vec<ChatMessage>,
    transcript: String,
    active_role: Option<RouteTarget>,
    pending_input: String,
    draft_answer: String,
    answer_feedback: String,
    final_answer: String,
    image: Option<String>,
}

impl SharedState {
    /// Fresh state for a plain question
    pub fn new(question: impl Into<String>) -> Self {
        let question = question.into();
        let seed = seed_messages(&question, None);
        Self::from_seed(question, seed)
    }

    /// Fresh state for a question with an attachment
    pub fn with_attachment(question: impl Into<String>, attachment: &Attachment) -> Self {
        let question = question.into();
        let seed = seed_messages(&question, Some(attachment));
        Self::from_seed(question, seed)
    }

    /// Fresh state from already-built seed messages
    pub fn from_seed(question: impl Into<String>, seed: Seed) -> Self {
        Self {
            question: question.into(),
            messages: seed.messages,
            transcript: String::new(),
            active_role: None,
            pending_input: String::new(),
            draft_answer: String::new(),
            answer_feedback: String::new(),
            final_answer: String::new(),
            image: seed.image,
        }
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn active_role(&self) -> Option<RouteTarget> {
        self.active_role
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn draft_answer(&self) -> &str {
        &self.draft_answer
    }

    pub fn answer_feedback(&self) -> &str {
        &self.answer_feedback
    }

    pub fn final_answer(&self) -> &str {
        &self.final_answer
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// A non-empty final answer only exists once the run has terminated
    pub fn is_terminal(&self) -> bool {
        !self.final_answer.is_empty()
    }

    /// Merge a role's update into the state
    pub(crate) fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        self.transcript.push_str(&update.transcript);

        if let Some(target) = update.active_role {
            self.active_role = Some(target);
        }
        if let Some(input) = update.pending_input {
            self.pending_input = input;
        }
        if let Some(draft) = update.draft_answer {
            self.draft_answer = draft;
        }
        if let Some(feedback) = update.answer_feedback {
            self.answer_feedback = feedback;
        }
        if let Some(answer) = update.final_answer {
            self.final_answer = answer;
        }
    }
}

/// What a role step changes
///
/// `messages` and `transcript` are appended; every `Some` field replaces the
/// current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<ChatMessage>,
    pub transcript: String,
    pub active_role: Option<RouteTarget>,
    pub pending_input: Option<String>,
    pub draft_answer: Option<String>,
    pub answer_feedback: Option<String>,
    pub final_answer: Option<String>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn transcript(mut self, text: impl Into<String>) -> Self {
        self.transcript.push_str(&text.into());
        self
    }

    pub fn active_role(mut self, target: RouteTarget) -> Self {
        self.active_role = Some(target);
        self
    }

    pub fn pending_input(mut self, input: impl Into<String>) -> Self {
        self.pending_input = Some(input.into());
        self
    }

    pub fn draft_answer(mut self, draft: impl Into<String>) -> Self {
        self.draft_answer = Some(draft.into());
        self
    }

    pub fn answer_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.answer_feedback = Some(feedback.into());
        self
    }

    pub fn final_answer(mut self, answer: impl Into<String>) -> Self {
        self.final_answer = Some(answer.into());
        self
    }

    /// Standard bookkeeping for a role's output: tagged message plus transcript line
    pub fn record(self, role: Role, output: &str) -> Self {
        self.message(ChatMessage::assistant(output).with_name(role.as_str()))
            .transcript(transcript_entry(role, output))
    }
}

/// Which pass the generator is on
///
/// Built by the orchestrator from the state before the generator runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorMode {
    /// No feedback yet: write a draft
    Draft,
    /// Feedback exists: revise the draft once
    Refine { draft: String, feedback: String },
}

impl GeneratorMode {
    pub fn from_state(state: &SharedState) -> Self {
        if state.answer_feedback.is_empty() {
            GeneratorMode::Draft
        } else {
            GeneratorMode::Refine {
                draft: state.draft_answer.clone(),
                feedback: state.answer_feedback.clone(),
            }
        }
    }
}

/// One transcript line for a role's output
pub fn transcript_entry(role: Role, content: &str) -> String {
    format!("**{} agent**: {}\n\n", role.display_name(), content)
}

/// Opening transcript line for the user's question
pub fn question_entry(question: &str) -> String {
    format!("**Human** query: {}\n\n", question)
}
