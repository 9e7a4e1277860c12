//! Scripted in-memory assistant service used by unit tests.

use super::{
    AssistantService, AssistantSpec, PendingToolCall, RunSnapshot, RunStatus, ThreadMessage,
    ToolOutput,
};
use crate::error::{Result, ScoutError};
use async_openai::error::OpenAIError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) const THREAD_ID: &str = "thread_1";
pub(crate) const RUN_ID: &str = "run_1";

/// Plays back a fixed sequence of run states and records every call.
///
/// The last scripted state repeats once the script is exhausted.
#[derive(Default)]
pub(crate) struct ScriptedService {
    states: Mutex<VecDeque<RunSnapshot>>,
    messages: Mutex<Vec<ThreadMessage>>,
    fail_polls: Mutex<bool>,
    fail_submissions: Mutex<bool>,
    fail_listings: Mutex<bool>,
    pub polls: Mutex<usize>,
    pub message_listings: Mutex<usize>,
    pub submissions: Mutex<Vec<Vec<ToolOutput>>>,
    pub assistants: Mutex<Vec<AssistantSpec>>,
    pub threads: Mutex<Vec<String>>,
    pub added_messages: Mutex<Vec<(String, String)>>,
    pub runs: Mutex<Vec<(String, String)>>,
}

impl ScriptedService {
    pub fn new(states: Vec<RunSnapshot>) -> Self {
        Self {
            states: Mutex::new(states.into()),
            ..Default::default()
        }
    }

    pub fn with_statuses(statuses: &[RunStatus]) -> Self {
        Self::new(statuses.iter().map(|s| state(*s)).collect())
    }

    /// Messages in service order (newest first).
    pub fn with_messages(self, texts: &[&str]) -> Self {
        *self.messages.lock().unwrap() = texts
            .iter()
            .map(|text| ThreadMessage {
                text: text.to_string(),
            })
            .collect();
        self
    }

    pub fn failing_polls(self) -> Self {
        *self.fail_polls.lock().unwrap() = true;
        self
    }

    pub fn failing_submissions(self) -> Self {
        *self.fail_submissions.lock().unwrap() = true;
        self
    }

    pub fn failing_listings(self) -> Self {
        *self.fail_listings.lock().unwrap() = true;
        self
    }

    pub fn poll_count(&self) -> usize {
        *self.polls.lock().unwrap()
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    fn next_state(&self) -> RunSnapshot {
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            states.pop_front().unwrap()
        } else {
            states.front().cloned().unwrap_or_else(|| state(RunStatus::Queued))
        }
    }
}

fn connection_reset() -> ScoutError {
    ScoutError::Transport(OpenAIError::InvalidArgument(
        "connection reset".to_string(),
    ))
}

/// A run state with no pending calls.
pub(crate) fn state(status: RunStatus) -> RunSnapshot {
    RunSnapshot {
        id: RUN_ID.to_string(),
        status,
        tool_calls: Vec::new(),
        last_error: None,
    }
}

/// A `requires_action` state asking for the given `(id, name, arguments)` calls.
pub(crate) fn requires_action(calls: &[(&str, &str, &str)]) -> RunSnapshot {
    RunSnapshot {
        tool_calls: calls
            .iter()
            .map(|(id, name, arguments)| PendingToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            })
            .collect(),
        ..state(RunStatus::RequiresAction)
    }
}

#[async_trait]
impl AssistantService for ScriptedService {
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let mut assistants = self.assistants.lock().unwrap();
        assistants.push(spec.clone());
        Ok(format!("asst_{}", assistants.len()))
    }

    async fn create_thread(&self, first_message: &str) -> Result<String> {
        let mut threads = self.threads.lock().unwrap();
        threads.push(first_message.to_string());
        Ok(format!("thread_{}", threads.len()))
    }

    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()> {
        self.added_messages
            .lock()
            .unwrap()
            .push((thread_id.to_string(), content.to_string()));
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot> {
        self.runs
            .lock()
            .unwrap()
            .push((thread_id.to_string(), assistant_id.to_string()));
        Ok(state(RunStatus::Queued))
    }

    async fn get_run(&self, _thread_id: &str, _run_id: &str) -> Result<RunSnapshot> {
        *self.polls.lock().unwrap() += 1;
        if *self.fail_polls.lock().unwrap() {
            return Err(connection_reset());
        }
        Ok(self.next_state())
    }

    async fn submit_tool_outputs(
        &self,
        _thread_id: &str,
        _run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<()> {
        if *self.fail_submissions.lock().unwrap() {
            return Err(connection_reset());
        }
        self.submissions.lock().unwrap().push(outputs);
        Ok(())
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<ThreadMessage>> {
        *self.message_listings.lock().unwrap() += 1;
        if *self.fail_listings.lock().unwrap() {
            return Err(connection_reset());
        }
        Ok(self.messages.lock().unwrap().clone())
    }
}
