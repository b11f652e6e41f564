//! Academic paper search through the arXiv Atom API

use super::{Tool, ToolError};
use crate::PolymathError;
use regex::Regex;
use std::time::Duration;

const API_URL: &str = "http://export.arxiv.org/api/query";
const MAX_SUMMARY_CHARS: usize = 2_000;

pub struct ArxivTool {
    results: usize,
    timeout: Duration,
    entry: Regex,
    title: Regex,
    summary: Regex,
    published: Regex,
    author: Regex,
}

impl ArxivTool {
    pub fn new(results: usize, timeout: Duration) -> crate::Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| PolymathError::config(format!("arxiv pattern: {}", e)))
        };
        Ok(Self {
            results: results.max(1),
            timeout,
            entry: compile(r"(?s)<entry>(.*?)</entry>")?,
            title: compile(r"(?s)<title>(.*?)</title>")?,
            summary: compile(r"(?s)<summary>(.*?)</summary>")?,
            published: compile(r"<published>(\d{4}-\d{2}-\d{2})")?,
            author: compile(r"(?s)<author>\s*<name>(.*?)</name>")?,
        })
    }

    /// Render each Atom `<entry>` as a short paper summary
    fn format_feed(&self, feed: &str) -> String {
        let papers: Vec<String> = self
            .entry
            .captures_iter(feed)
            .map(|entry| {
                let body = &entry[1];
                let first = |re: &Regex| {
                    re.captures(body)
                        .map(|c| collapse_whitespace(&c[1]))
                        .unwrap_or_default()
                };
                let authors: Vec<String> = self
                    .author
                    .captures_iter(body)
                    .map(|c| collapse_whitespace(&c[1]))
                    .collect();
                let summary: String = first(&self.summary)
                    .chars()
                    .take(MAX_SUMMARY_CHARS)
                    .collect();

                format!(
                    "Published: {}\nTitle: {}\nAuthors: {}\nSummary: {}",
                    first(&self.published),
                    first(&self.title),
                    authors.join(", "),
                    summary
                )
            })
            .collect();

        if papers.is_empty() {
            "No good Arxiv Result was found".to_string()
        } else {
            papers.join("\n\n")
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Tool for ArxivTool {
    fn name(&self) -> &str {
        "arxiv"
    }

    fn description(&self) -> &str {
        "Search scientific papers on arXiv. Input: a search query or arXiv identifier."
    }

    fn call(&self, input: &str) -> Result<String, ToolError> {
        let query = format!("all:{}", input.trim());
        let max_results = self.results.to_string();
        let response = ureq::get(API_URL)
            .timeout(self.timeout)
            .query("search_query", &query)
            .query("start", "0")
            .query("max_results", &max_results)
            .call()?;
        let feed = response.into_string()?;

        Ok(self.format_feed(&feed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: all:attention</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <published>2017-06-12T17:57:34Z</published>
    <title>Attention Is All
      You Need</title>
    <summary>  The dominant sequence transduction models
  are based on recurrent networks.</summary>
    <author>
      <name>Ashish Vaswani</name>
    </author>
    <author>
      <name>Noam Shazeer</name>
    </author>
  </entry>
</feed>"#;

    #[test]
    fn test_format_feed() {
        let tool = ArxivTool::new(3, Duration::from_secs(5)).unwrap();
        assert_eq!(
            tool.format_feed(FEED),
            "Published: 2017-06-12\nTitle: Attention Is All You Need\nAuthors: Ashish Vaswani, Noam Shazeer\nSummary: The dominant sequence transduction models are based on recurrent networks."
        );
    }

    #[test]
    fn test_format_empty_feed() {
        let tool = ArxivTool::new(3, Duration::from_secs(5)).unwrap();
        assert_eq!(
            tool.format_feed("<feed><title>nothing</title></feed>"),
            "No good Arxiv Result was found"
        );
    }
}
