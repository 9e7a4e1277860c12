//! Local tools the remote assistant can call.
//!
//! Tools are registered by function name in a [`ToolRegistry`]. The registry
//! renders the function definitions sent when the assistant is created and
//! resolves the names the remote model asks for while a run is in
//! `requires_action`.

mod duckduckgo;
mod wikipedia;

pub use duckduckgo::DuckDuckGoSearch;
pub use wikipedia::WikipediaSearch;

use crate::config::ToolSettings;
use crate::error::{Result, ScoutError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Parsed arguments of a tool call.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// Timeout for search provider requests.
const TOOL_HTTP_TIMEOUT_SECS: u64 = 30;

/// Function definition advertised to the remote assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object.
    pub parameters: serde_json::Value,
}

/// A locally executed function.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Function name the remote model uses.
    fn name(&self) -> &str;

    /// Description shown to the remote model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments.
    fn parameters(&self) -> serde_json::Value;

    /// Execute the tool and return its textual result.
    async fn call(&self, args: &ToolArgs) -> Result<String>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// The tools shipped with Scout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    DuckDuckGoSearch,
    WikipediaSearch,
}

impl BuiltinTool {
    pub const ALL: [BuiltinTool; 2] = [BuiltinTool::DuckDuckGoSearch, BuiltinTool::WikipediaSearch];

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinTool::DuckDuckGoSearch => "DuckDuckGoSearch",
            BuiltinTool::WikipediaSearch => "WikipediaSearch",
        }
    }

    /// Instantiate the tool with a shared HTTP client.
    pub fn build(&self, settings: &ToolSettings, http: reqwest::Client) -> Result<Arc<dyn Tool>> {
        Ok(match self {
            BuiltinTool::DuckDuckGoSearch => {
                Arc::new(DuckDuckGoSearch::new(http, settings.max_results))
            }
            BuiltinTool::WikipediaSearch => Arc::new(WikipediaSearch::new(
                http,
                &settings.wikipedia_language,
                settings.max_results,
                settings.wikipedia_max_chars,
            )?),
        })
    }
}

impl std::str::FromStr for BuiltinTool {
    type Err = ScoutError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BuiltinTool::ALL
            .into_iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScoutError::Config(format!("Unknown tool in configuration: {}", s)))
    }
}

impl std::fmt::Display for BuiltinTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name-indexed set of tools available to a run.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry of the tools enabled in settings.
    pub fn from_settings(settings: &ToolSettings) -> Result<Self> {
        let builtins = settings
            .enabled
            .iter()
            .map(|name| name.parse::<BuiltinTool>())
            .collect::<Result<Vec<_>>>()?;

        let http = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(TOOL_HTTP_TIMEOUT_SECS))
            .build()?;

        let mut registry = Self::new();
        for builtin in builtins {
            registry.register(builtin.build(settings, http.clone())?);
        }
        Ok(registry)
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> &mut Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Look up a tool, failing with [`ScoutError::UnknownTool`].
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.get(name)
            .cloned()
            .ok_or_else(|| ScoutError::UnknownTool(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.keys()).finish()
    }
}

/// Parse the JSON arguments of a tool call into an object.
pub fn parse_arguments(arguments: &str) -> Result<ToolArgs> {
    if arguments.trim().is_empty() {
        return Ok(ToolArgs::new());
    }

    match serde_json::from_str(arguments)
        .map_err(|e| ScoutError::InvalidInput(format!("Invalid tool arguments: {}", e)))?
    {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(ScoutError::InvalidInput(format!(
            "Tool arguments must be a JSON object, got: {}",
            other
        ))),
    }
}

/// Schema shared by the search tools: a single required `query` string.
pub(crate) fn query_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "The query you will search for"
            }
        },
        "required": ["query"]
    })
}

/// Extract the required `query` argument.
pub(crate) fn query_arg(args: &ToolArgs) -> Result<&str> {
    args.get("query")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ScoutError::InvalidInput("Missing 'query' argument".to_string()))
}
