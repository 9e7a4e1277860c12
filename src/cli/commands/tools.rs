//! Tools command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{ToolArgs, ToolRegistry};
use anyhow::Result;

/// List the configured tools, or call one with a query.
pub async fn run_tools(call: Option<String>, query: Option<String>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Tools, &settings)?;

    let registry = ToolRegistry::from_settings(&settings.tools)?;

    let (Some(name), Some(query)) = (call, query) else {
        Output::header(&format!("Tools ({})", registry.len()));
        for definition in registry.definitions() {
            Output::list_item(&format!("{} - {}", definition.name, definition.description));
        }
        return Ok(());
    };

    let tool = registry.resolve(&name)?;

    let mut args = ToolArgs::new();
    args.insert("query".to_string(), serde_json::Value::String(query));

    let spinner = Output::spinner(&format!("Calling {}...", name));
    let result = tool.call(&args).await;
    spinner.finish_and_clear();

    match result {
        Ok(output) => {
            println!("\n{}\n", output);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("{} failed: {}", name, e));
            Err(e.into())
        }
    }
}
