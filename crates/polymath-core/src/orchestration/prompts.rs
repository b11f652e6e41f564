//! Instruction templates for each role
//!
//! Every function returns a fully rendered instruction; no placeholders
//! survive into the text sent to the model.

use super::types::RouteTarget;
use crate::tools::ToolSet;

/// Sent once the tool-round limit is hit
pub const FINAL_ANSWER_NUDGE: &str =
    "You have used all available tool calls. Reply now with your final answer as plain text. Do not call any more tools.";

pub fn router(question: &str) -> String {
    format!(
        r#"You are the Router in a team of agents that answers questions accurately.

Decide which expert should work on the question first:
- researcher: the question needs facts from outside sources (web, encyclopedia, papers)
- reasoner: the question needs logic, math, puzzles, or reading an attached image, code, or transcript
- data_analyst: the question is about a spreadsheet or other tabular file

Respond with a single JSON object and nothing else:
{{"expert_agent": one of [{targets}], "agent_input": "what the expert should do"}}

## Question:
{question}"#,
        targets = RouteTarget::ALL
            .iter()
            .map(|t| format!("\"{}\"", t.as_str()))
            .collect::<Vec<_>>()
            .join(", "),
        question = question,
    )
}

pub fn researcher(transcript: &str) -> String {
    format!(
        r#"You are the Researcher. Gather the facts needed to answer the user's question from external sources.

- Pick out the key entities and concepts, then search for them.
- Break the question into two or three narrower sub-questions when that helps.
- Prefer verifiable sources and respect any source the question names (for example a specific Wikipedia edition).
- When sources disagree, say so and favor the more reliable or more recent one.
- Finish with a concise summary of what you found, with attribution.

## Conversation so far:
{transcript}"#
    )
}

pub fn reasoner(question: &str, transcript: &str) -> String {
    format!(
        r#"You are the Reasoner. You handle logic, mathematics, and abstract problems.

- Split the problem into explicit steps and show the work.
- Check computations twice; try an alternative route when one exists.
- For formal structures, test the relevant properties directly and give counterexamples when they fail.
- Use any attached image, code, or transcript as evidence.
- End with a clearly stated conclusion.

## Question:
{question}

## Conversation so far:
{transcript}"#
    )
}

pub fn data_analyst(question: &str, transcript: &str) -> String {
    format!(
        r#"You are the Data Analyst. You answer questions about tabular files by writing Python.

- The file path is given in the user's message. Load it with pandas (`pd.read_excel` for .xlsx, `pd.read_csv` for .csv) and print `df.head()` first.
- Only analyze what the question asks about; filter subsets carefully and check which columns distinguish them.
- Print every value you need; only printed output is returned to you.
- Format numbers the way the question implies (for example two decimals for currency).
- Give the final answer as one plain sentence without code.

## Question:
{question}

## Conversation so far:
{transcript}"#
    )
}

pub fn generator_draft(transcript: &str) -> String {
    format!(
        r#"You are the Generator. Write the answer to the user's original question using the conversation below as your only source of facts.

## Conversation so far:
{transcript}

Rules:
- Answer exactly what was asked: a number, a name, a date, a short list.
- Separate list items with a comma followed by one space.
- No explanations, no extra words, no mention of agents or process.

Return only the answer."#
    )
}

pub fn generator_refine(draft: &str, feedback: &str, transcript: &str) -> String {
    format!(
        r#"You are the Generator revising an answer after review.

## Previous answer:
{draft}

## Review feedback:
{feedback}

## Conversation so far:
{transcript}

Rules:
- Fix what the feedback points out; keep what was already right.
- The answer must match the format the question expects and stand on its own.
- Separate list items with a comma followed by one space.
- No explanations, no restating the question, no mention of agents, process, or feedback.

Return only the revised answer."#
    )
}

pub fn verifier(answer: &str, transcript: &str) -> String {
    format!(
        r#"You are the Verifier. Review the proposed answer to the user's question.

Check that it:
- answers the question directly and completely
- is consistent with the facts in the conversation
- has exactly the format the question expects, with nothing extra

## Proposed answer:
{answer}

## Conversation so far:
{transcript}

Give specific, actionable feedback. If the answer is correct, say so briefly."#
    )
}

/// Tool catalogue and the JSON reply protocol
pub fn tool_protocol(tools: &ToolSet) -> String {
    format!(
        r#"## Tools
{catalogue}

To call a tool, reply with only this JSON object:
{{"action": "<tool name>", "input": "<tool input>"}}
The tool result comes back in the next message. Call tools as many times as you need.
When you are done, reply with only:
{{"final_answer": "<your answer>"}}"#,
        catalogue = tools.describe()
    )
}

/// Message carrying a tool result back to the model
pub fn observation(tool: &str, result: &str) -> String {
    format!("Result from {}:\n{}", tool, result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_lists_targets() {
        let text = router("What is 2+2?");
        assert!(text.contains(r#""researcher", "reasoner", "data_analyst""#));
        assert!(text.ends_with("What is 2+2?"));
    }

    #[test]
    fn test_templates_fully_rendered() {
        let rendered = [
            router("q"),
            researcher("t"),
            reasoner("q", "t"),
            data_analyst("q", "t"),
            generator_draft("t"),
            generator_refine("d", "f", "t"),
            verifier("a", "t"),
            tool_protocol(&ToolSet::empty()),
        ];
        for text in rendered {
            assert!(!text.contains("{question}"));
            assert!(!text.contains("{transcript}"));
        }
    }

    #[test]
    fn test_refine_includes_draft_and_feedback() {
        let text = generator_refine("Paris, France", "Only the city is asked for", "log");
        assert!(text.contains("Paris, France"));
        assert!(text.contains("Only the city is asked for"));
    }
}
