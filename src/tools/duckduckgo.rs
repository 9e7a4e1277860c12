//! DuckDuckGo search via the Instant Answer API.

use super::{query_arg, query_schema, Tool, ToolArgs};
use crate::error::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

const ENDPOINT: &str = "https://api.duckduckgo.com/";
const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

/// Web search backed by DuckDuckGo.
pub struct DuckDuckGoSearch {
    http: reqwest::Client,
    max_results: usize,
}

impl DuckDuckGoSearch {
    pub fn new(http: reqwest::Client, max_results: usize) -> Self {
        Self { http, max_results }
    }
}

#[async_trait]
impl Tool for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "DuckDuckGoSearch"
    }

    fn description(&self) -> &str {
        "Use this tool to search on DuckDuckGo."
    }

    fn parameters(&self) -> serde_json::Value {
        query_schema()
    }

    #[instrument(skip(self, args))]
    async fn call(&self, args: &ToolArgs) -> Result<String> {
        let query = query_arg(args)?;
        debug!("DuckDuckGo query: {}", query);

        let response: InstantAnswer = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(render(&response, self.max_results))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InstantAnswer {
    heading: String,
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    results: Vec<RelatedTopic>,
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn flatten<'a>(&'a self, out: &mut Vec<(&'a str, &'a str)>) {
        match self {
            RelatedTopic::Topic { text, first_url } => out.push((text.as_str(), first_url.as_str())),
            RelatedTopic::Group { topics } => topics.iter().for_each(|t| t.flatten(out)),
        }
    }
}

fn render(answer: &InstantAnswer, max_results: usize) -> String {
    let mut lines = Vec::new();

    if !answer.abstract_text.is_empty() {
        let heading = if answer.heading.is_empty() {
            String::new()
        } else {
            format!("{}: ", answer.heading)
        };
        lines.push(format!(
            "{}{} ({})",
            heading, answer.abstract_text, answer.abstract_url
        ));
    }

    let mut topics = Vec::new();
    for topic in answer.results.iter().chain(&answer.related_topics) {
        topic.flatten(&mut topics);
    }

    lines.extend(
        topics
            .into_iter()
            .filter(|(text, _)| !text.is_empty())
            .take(max_results)
            .map(|(text, url)| format!("- {} ({})", text, url)),
    );

    if lines.is_empty() {
        NO_RESULT.to_string()
    } else {
        lines.join("\n")
    }
}
