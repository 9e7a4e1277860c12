//! Wikipedia search via the MediaWiki API.

use super::{query_arg, query_schema, Tool, ToolArgs};
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

const NO_RESULT: &str = "No good Wikipedia Search Result was found";

/// Encyclopedia lookup returning the intro of the best matching pages.
pub struct WikipediaSearch {
    http: reqwest::Client,
    endpoint: Url,
    max_results: usize,
    max_chars: usize,
}

impl WikipediaSearch {
    /// Create a search against the given language edition (e.g. "en").
    pub fn new(
        http: reqwest::Client,
        language: &str,
        max_results: usize,
        max_chars: usize,
    ) -> Result<Self> {
        if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(ScoutError::Config(format!(
                "Invalid Wikipedia language: {:?}",
                language
            )));
        }

        let endpoint = Url::parse(&format!("https://{}.wikipedia.org/w/api.php", language))
            .map_err(|e| ScoutError::Config(format!("Invalid Wikipedia endpoint: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            max_results,
            max_chars,
        })
    }
}

#[async_trait]
impl Tool for WikipediaSearch {
    fn name(&self) -> &str {
        "WikipediaSearch"
    }

    fn description(&self) -> &str {
        "Use this tool to search on Wikipedia."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema()
    }

    #[instrument(skip(self, args))]
    async fn call(&self, args: &ToolArgs) -> Result<String> {
        let query = query_arg(args)?;
        debug!("Wikipedia query: {}", query);

        let limit = self.max_results.to_string();
        let response: SearchResponse = self
            .http
            .get(self.endpoint.clone())
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("formatversion", "2"),
                ("generator", "search"),
                ("gsrsearch", query),
                ("gsrlimit", limit.as_str()),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exlimit", "max"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(render(response, self.max_results, self.max_chars))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    /// Search rank, 1-based.
    #[serde(default)]
    index: u32,
    #[serde(default)]
    extract: String,
}

fn render(response: SearchResponse, max_results: usize, max_chars: usize) -> String {
    let mut pages = response.query.map(|q| q.pages).unwrap_or_default();
    pages.sort_by_key(|p| p.index);

    let summaries: Vec<String> = pages
        .into_iter()
        .filter(|p| !p.extract.trim().is_empty())
        .take(max_results)
        .map(|p| format!("Page: {}\nSummary: {}", p.title, p.extract.trim()))
        .collect();

    if summaries.is_empty() {
        return NO_RESULT.to_string();
    }

    summaries.join("\n\n").chars().take(max_chars).collect()
}
