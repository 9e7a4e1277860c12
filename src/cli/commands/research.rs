//! Research command implementation.

use super::print_outcome;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Researcher;
use anyhow::Result;

/// Run the research command.
pub async fn run_research(
    question: &str,
    model: Option<String>,
    max_wait: Option<u64>,
    mut settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Research, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.assistant.model = model;
    }
    if let Some(secs) = max_wait {
        settings.run.max_wait_secs = secs;
    }

    let researcher = Researcher::from_settings(&settings)?;

    let spinner = Output::spinner("Researching...");
    let result = researcher.research(question).await;
    spinner.finish_and_clear();

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => {
            Output::failure(&e);
            Err(e.into())
        }
    }
}
