//! Web search tool.
//!
//! Google Programmable Search when credentials are configured, DuckDuckGo's
//! instant-answer API otherwise (or when Google returns nothing). Results are
//! handed to the model as pretty-printed JSON so titles, URLs, and snippets
//! survive for citation.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::ToolSettings;
use crate::core::errors::ChatError;
use crate::tools::Tool;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub struct SearchTool {
    client: reqwest::Client,
    google_api_key: String,
    google_engine_id: String,
    max_results: usize,
}

impl SearchTool {
    pub fn new(settings: &ToolSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            google_api_key: settings.google_search_api_key.clone(),
            google_engine_id: settings.google_search_engine_id.clone(),
            max_results: settings.search_max_results,
        }
    }

    async fn perform_search(&self, query: &str) -> Result<Vec<SearchResult>, ChatError> {
        if !self.google_api_key.is_empty() && !self.google_engine_id.is_empty() {
            if let Ok(results) = self.google_search(query).await {
                if !results.is_empty() {
                    return Ok(results);
                }
            }
        }

        self.duckduckgo_search(query).await
    }

    async fn google_search(&self, query: &str) -> Result<Vec<SearchResult>, ChatError> {
        let url = format!(
            "https://www.googleapis.com/customsearch/v1?key={}&cx={}&q={}",
            self.google_api_key,
            self.google_engine_id,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ChatError::internal)?;

        if !response.status().is_success() {
            return Err(ChatError::Internal(format!(
                "Google search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ChatError::internal)?;
        Ok(google_results(&payload))
    }

    async fn duckduckgo_search(&self, query: &str) -> Result<Vec<SearchResult>, ChatError> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_redirect=1&no_html=1",
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ChatError::internal)?;

        if !response.status().is_success() {
            return Err(ChatError::Internal(format!(
                "DuckDuckGo search failed: {}",
                response.status()
            )));
        }

        let payload: Value = response.json().await.map_err(ChatError::internal)?;
        Ok(ddg_results(&payload))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &'static str {
        "web-search"
    }

    fn description(&self) -> &'static str {
        "searches the web for current information and returns result titles, URLs, and snippets"
    }

    async fn invoke(&self, input: &str) -> Result<String, ChatError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ChatError::Internal("search query is empty".to_string()));
        }

        let mut results = self.perform_search(query).await?;
        results.truncate(self.max_results);

        if results.is_empty() {
            return Ok("No search results found.".to_string());
        }
        Ok(serde_json::to_string_pretty(&results).unwrap_or_default())
    }
}

fn google_results(payload: &Value) -> Vec<SearchResult> {
    payload["items"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            let title = item["title"].as_str().filter(|t| !t.is_empty())?;
            let url = item["link"].as_str().filter(|u| !u.is_empty())?;
            Some(SearchResult {
                title: title.to_string(),
                url: url.to_string(),
                snippet: item["snippet"].as_str().unwrap_or_default().to_string(),
            })
        })
        .collect()
}

fn ddg_results(payload: &Value) -> Vec<SearchResult> {
    let mut results = Vec::new();

    // the instant-answer abstract comes first when present
    if let (Some(text), Some(url)) = (
        payload["AbstractText"].as_str().filter(|t| !t.is_empty()),
        payload["AbstractURL"].as_str().filter(|u| !u.is_empty()),
    ) {
        results.push(snippet_result(text, url));
    }

    for key in ["Results", "RelatedTopics"] {
        if let Some(items) = payload[key].as_array() {
            collect_topics(items, &mut results);
        }
    }
    results
}

/// Topic lists nest one level under disambiguation headings; both shapes end
/// in `Text` + `FirstURL` leaves.
fn collect_topics(items: &[Value], out: &mut Vec<SearchResult>) {
    for item in items {
        match item["Topics"].as_array() {
            Some(nested) => collect_topics(nested, out),
            None => {
                let text = item["Text"].as_str().unwrap_or_default();
                let url = item["FirstURL"].as_str().unwrap_or_default();
                if !text.is_empty() && !url.is_empty() {
                    out.push(snippet_result(text, url));
                }
            }
        }
    }
}

/// DDG gives one text blob per hit; its leading segment doubles as a title.
fn snippet_result(text: &str, url: &str) -> SearchResult {
    SearchResult {
        title: text.split(" - ").next().unwrap_or(text).to_string(),
        url: url.to_string(),
        snippet: text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ddg_abstract_leads_and_topics_flatten_recursively() {
        let payload = json!({
            "AbstractText": "Rust - a systems language",
            "AbstractURL": "https://rust-lang.org",
            "RelatedTopics": [{
                "Topics": [
                    {"Text": "Rust (game)", "FirstURL": "https://example.com/game"},
                    {"Text": "Rust Belt", "FirstURL": "https://example.com/belt"}
                ]
            }]
        });

        let results = ddg_results(&payload);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].url, "https://rust-lang.org");
        assert_eq!(results[0].snippet, "Rust - a systems language");
        assert_eq!(results[1].title, "Rust (game)");
        assert_eq!(results[2].url, "https://example.com/belt");
    }

    #[test]
    fn ddg_entries_without_text_or_url_are_skipped() {
        let payload = json!({
            "RelatedTopics": [
                {"Text": "", "FirstURL": "https://example.com"},
                {"Text": "kept", "FirstURL": "https://example.com/kept"},
                {"Text": "no url"},
            ]
        });

        let results = ddg_results(&payload);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "kept");
    }

    #[test]
    fn google_items_map_onto_titled_results() {
        let payload = json!({
            "items": [
                {"title": "Rust", "link": "https://rust-lang.org", "snippet": "systems language"},
                {"title": "no link"},
                {"title": "Rust book", "link": "https://doc.rust-lang.org/book/"}
            ]
        });

        let results = google_results(&payload);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Rust");
        assert_eq!(results[0].snippet, "systems language");
        assert_eq!(results[1].url, "https://doc.rust-lang.org/book/");
        assert_eq!(results[1].snippet, "");
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_any_request() {
        let tool = SearchTool::new(&ToolSettings::default());
        let err = tool.invoke("   ").await.unwrap_err();
        assert!(err.to_string().contains("search query is empty"));
    }
}
