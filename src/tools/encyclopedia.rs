//! Encyclopedia lookup tool.
//!
//! Uses the Wikipedia MediaWiki API: a title search followed by one intro
//! extract per hit. Extracts are truncated on a char boundary so CJK pages
//! cannot split a code point.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::ChatError;
use crate::tools::Tool;

const API_BASE: &str = "https://en.wikipedia.org/w/api.php";
const MAX_HITS: usize = 3;
const MAX_EXTRACT_CHARS: usize = 1000;

pub struct EncyclopediaTool {
    client: reqwest::Client,
}

impl EncyclopediaTool {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn search_titles(&self, query: &str) -> Result<Vec<String>, ChatError> {
        let url = format!(
            "{}?action=query&list=search&srsearch={}&srlimit={}&format=json",
            API_BASE,
            urlencoding::encode(query),
            MAX_HITS
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ChatError::internal)?;
        if !response.status().is_success() {
            return Err(ChatError::Internal(format!(
                "Wikipedia search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ChatError::internal)?;
        let hits = payload["query"]["search"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(hits
            .iter()
            .filter_map(|hit| hit.get("title").and_then(|v| v.as_str()))
            .map(|title| title.to_string())
            .collect())
    }

    async fn fetch_extract(&self, title: &str) -> Result<Option<String>, ChatError> {
        let url = format!(
            "{}?action=query&prop=extracts&exintro=1&explaintext=1&redirects=1&titles={}&format=json",
            API_BASE,
            urlencoding::encode(title)
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ChatError::internal)?;
        if !response.status().is_success() {
            return Err(ChatError::Internal(format!(
                "Wikipedia extract failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ChatError::internal)?;
        let pages = match payload["query"]["pages"].as_object() {
            Some(pages) => pages,
            None => return Ok(None),
        };

        let extract = pages
            .values()
            .filter_map(|page| page.get("extract").and_then(|v| v.as_str()))
            .find(|text| !text.trim().is_empty())
            .map(|text| truncate_chars(text.trim(), MAX_EXTRACT_CHARS));

        Ok(extract)
    }
}

impl Default for EncyclopediaTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for EncyclopediaTool {
    fn name(&self) -> &'static str {
        "encyclopedia"
    }

    fn description(&self) -> &'static str {
        "looks up a topic on Wikipedia and returns a short factual summary per matching page"
    }

    async fn invoke(&self, input: &str) -> Result<String, ChatError> {
        let topic = input.trim();
        if topic.is_empty() {
            return Err(ChatError::Internal("lookup topic is empty".to_string()));
        }

        let titles = self.search_titles(topic).await?;
        let mut pages = Vec::new();
        for title in titles {
            if let Some(extract) = self.fetch_extract(&title).await? {
                pages.push(format!("Page: {}\nSummary: {}", title, extract));
            }
        }

        if pages.is_empty() {
            return Ok("No encyclopedia results found.".to_string());
        }
        Ok(pages.join("\n\n"))
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
