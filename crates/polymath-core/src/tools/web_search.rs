//! Web search through the Tavily API

use super::{Tool, ToolError};
use serde_json::{json, Value};
use std::time::Duration;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 5;

pub struct WebSearchTool {
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl WebSearchTool {
    pub fn new(api_key: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: TAVILY_URL.to_string(),
            timeout,
        }
    }

    /// Point at a different search endpoint with the same API
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Input: a search query."
    }

    fn call(&self, input: &str) -> Result<String, ToolError> {
        let body = json!({
            "api_key": self.api_key,
            "query": input.trim(),
            "max_results": MAX_RESULTS,
            "include_answer": true,
        });

        let response = ureq::post(&self.endpoint)
            .timeout(self.timeout)
            .set("Content-Type", "application/json")
            .send_json(&body)?;
        let json: Value = response
            .into_json()
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        format_results(&json)
    }
}

fn format_results(json: &Value) -> Result<String, ToolError> {
    let results = json
        .get("results")
        .and_then(|r| r.as_array())
        .ok_or_else(|| ToolError::Parse("missing 'results' array".to_string()))?;

    let mut sections = Vec::new();
    if let Some(answer) = json.get("answer").and_then(|a| a.as_str()) {
        if !answer.is_empty() {
            sections.push(format!("Answer: {}", answer));
        }
    }
    for result in results {
        let title = result.get("title").and_then(|t| t.as_str()).unwrap_or("");
        let url = result.get("url").and_then(|u| u.as_str()).unwrap_or("");
        let content = result.get("content").and_then(|c| c.as_str()).unwrap_or("");
        sections.push(format!("Title: {}\nURL: {}\nContent: {}", title, url, content));
    }

    if sections.is_empty() {
        Ok("No good search result found".to_string())
    } else {
        Ok(sections.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_results() {
        let json = json!({
            "answer": "Paris",
            "results": [
                { "title": "France", "url": "https://example.org/fr", "content": "Capital: Paris" }
            ]
        });
        assert_eq!(
            format_results(&json).unwrap(),
            "Answer: Paris\n\nTitle: France\nURL: https://example.org/fr\nContent: Capital: Paris"
        );
    }

    #[test]
    fn test_format_empty_results() {
        let json = json!({ "answer": null, "results": [] });
        assert_eq!(format_results(&json).unwrap(), "No good search result found");
    }

    #[test]
    fn test_format_missing_results() {
        assert!(matches!(
            format_results(&json!({ "detail": "Unauthorized" })),
            Err(ToolError::Parse(_))
        ));
    }
}
