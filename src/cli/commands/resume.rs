//! Resume command implementation.

use super::print_outcome;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::session::Researcher;
use anyhow::Result;

/// Drive an existing run to a terminal state.
pub async fn run_resume(thread_id: &str, run_id: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Research, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let researcher = Researcher::from_settings(&settings)?;

    let spinner = Output::spinner(&format!("Waiting for run {}...", run_id));
    let result = researcher.resume(thread_id, run_id).await;
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
