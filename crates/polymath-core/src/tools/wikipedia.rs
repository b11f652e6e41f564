//! Encyclopedia lookup through the MediaWiki API

use super::{Tool, ToolError};
use serde_json::Value;
use std::time::Duration;

const API_URL: &str = "https://en.wikipedia.org/w/api.php";
const USER_AGENT: &str = concat!("polymath/", env!("CARGO_PKG_VERSION"));
const MAX_EXTRACT_CHARS: usize = 4_000;

pub struct WikipediaTool {
    results: usize,
    timeout: Duration,
}

impl WikipediaTool {
    pub fn new(results: usize, timeout: Duration) -> Self {
        Self {
            results: results.max(1),
            timeout,
        }
    }
}

impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up encyclopedia articles about people, places, events and concepts. Input: a search query."
    }

    fn call(&self, input: &str) -> Result<String, ToolError> {
        let limit = self.results.to_string();
        let response = ureq::get(API_URL)
            .timeout(self.timeout)
            .set("User-Agent", USER_AGENT)
            .query("action", "query")
            .query("format", "json")
            .query("generator", "search")
            .query("gsrsearch", input.trim())
            .query("gsrlimit", &limit)
            .query("prop", "extracts")
            .query("exintro", "1")
            .query("explaintext", "1")
            .query("exlimit", "max")
            .call()?;
        let json: Value = response
            .into_json()
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        Ok(format_pages(&json))
    }
}

/// Render `Page:`/`Summary:` blocks in search-rank order
fn format_pages(json: &Value) -> String {
    let Some(pages) = json.pointer("/query/pages").and_then(|p| p.as_object()) else {
        return "No good Wikipedia Search Result was found".to_string();
    };

    let mut pages: Vec<&Value> = pages.values().collect();
    pages.sort_by_key(|p| p.get("index").and_then(|i| i.as_u64()).unwrap_or(u64::MAX));

    let blocks: Vec<String> = pages
        .iter()
        .filter_map(|page| {
            let title = page.get("title")?.as_str()?;
            let extract = page.get("extract").and_then(|e| e.as_str()).unwrap_or("");
            let summary: String = extract.chars().take(MAX_EXTRACT_CHARS).collect();
            Some(format!("Page: {}\nSummary: {}", title, summary.trim()))
        })
        .collect();

    if blocks.is_empty() {
        "No good Wikipedia Search Result was found".to_string()
    } else {
        blocks.join("\n\n")
    }
}
