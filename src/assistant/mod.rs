//! Remote assistant service abstraction.
//!
//! The hosted service owns assistants, threads, runs and messages. Scout only
//! holds their identifiers and observes run state through polling, so every
//! remote call goes through the [`AssistantService`] trait.

mod openai;
#[cfg(test)]
pub(crate) mod scripted;

pub use openai::OpenAIAssistants;

use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Status of a remote run as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
}

impl RunStatus {
    /// Whether the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A function call the remote model wants executed locally.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingToolCall {
    /// Identifier the output must be reported under.
    pub id: String,
    /// Name of the requested function.
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

/// Result of one local tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// Locally observed view of a remote run.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub id: String,
    pub status: RunStatus,
    /// Calls to answer; only populated while `requires_action`.
    pub tool_calls: Vec<PendingToolCall>,
    /// Last error reported by the service, if any.
    pub last_error: Option<String>,
}

/// A message stored on a remote thread.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    /// Primary text content; empty when the message carries no text.
    pub text: String,
}

/// Configuration for creating a remote assistant.
#[derive(Debug, Clone)]
pub struct AssistantSpec {
    pub name: String,
    pub instructions: String,
    pub model: String,
    pub tools: Vec<ToolDefinition>,
}

/// Operations on the remote assistant service.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Create an assistant and return its ID.
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String>;

    /// Create a thread seeded with one user message and return its ID.
    async fn create_thread(&self, first_message: &str) -> Result<String>;

    /// Append a user message to an existing thread.
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()>;

    /// Start a run of the assistant on a thread.
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot>;

    /// Fetch the current state of a run.
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot>;

    /// Answer every pending tool call of a run in one submission.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<()>;

    /// List all thread messages, newest first.
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>>;
}
