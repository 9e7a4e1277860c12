//! CLI command implementations.

mod chat;
mod config;
mod research;
mod resume;
mod tools;

pub use chat::run_chat;
pub use config::run_config;
pub use research::run_research;
pub use resume::run_resume;
pub use tools::run_tools;

use crate::cli::Output;
use crate::driver::Outcome;

/// Print the outcome of a driven run.
fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Completed(transcript) => println!("\n{}\n", transcript),
        Outcome::Failed(status) => Output::run_failed(*status),
    }
}
