//! Scout - research assistant on the OpenAI Assistants API
//!
//! A CLI tool that asks a hosted assistant to research a question and runs the
//! web searches the assistant requests locally.
//!
//! # Overview
//!
//! A question becomes an assistant run on a conversation thread. The run is
//! asynchronous on the service side, so Scout polls it. When the run stops in
//! `requires_action`, Scout executes the requested tools (DuckDuckGo and
//! Wikipedia search) and submits their outputs in one batch. When it
//! completes, Scout renders the thread transcript oldest first.
//!
//! # Architecture
//!
//! - `config` - Configuration management
//! - `assistant` - Remote assistant service abstraction and OpenAI backend
//! - `tools` - Tool trait, registry and the built-in search tools
//! - `driver` - Run polling state machine
//! - `session` - Assistant, thread and run orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use scout::config::Settings;
//! use scout::driver::Outcome;
//! use scout::session::Researcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let researcher = Researcher::from_settings(&settings)?;
//!
//!     match researcher.research("Research the XZ backdoor").await? {
//!         Outcome::Completed(transcript) => println!("{}", transcript),
//!         Outcome::Failed(status) => eprintln!("run ended: {}", status),
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod assistant;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod openai;
pub mod session;
pub mod tools;

pub use error::{Result, ScoutError};
