//! CLI module for Scout.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Scout - research assistant
///
/// Asks a hosted OpenAI assistant to research a question, running the
/// DuckDuckGo and Wikipedia searches it requests locally.
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a question on a new thread and print the transcript
    Research {
        /// The question to research
        question: String,

        /// Model for a newly created assistant
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum seconds to wait for the run (0 = no limit)
        #[arg(long)]
        max_wait: Option<u64>,
    },

    /// Start an interactive research session on one thread
    Chat {
        /// Model for a newly created assistant
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Drive an existing run to completion
    Resume {
        /// Thread the run belongs to
        #[arg(long)]
        thread: String,

        /// Run to drive
        #[arg(long)]
        run: String,
    },

    /// List local tools, or call one directly
    Tools {
        /// Tool to call (e.g. WikipediaSearch)
        #[arg(long, requires = "query")]
        call: Option<String>,

        /// Query passed to the tool
        #[arg(long)]
        query: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the current configuration to the config file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}
