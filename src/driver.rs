//! Run driver: polls a remote run to a terminal state.
//!
//! A run moves through `queued`/`in_progress` while the remote model works.
//! It may stop in `requires_action` to ask for local tool calls, and it ends
//! in `completed` or one of the failure statuses. The driver answers every
//! `requires_action` with a single batched submission. On completion it
//! renders the thread transcript in chronological order.

use crate::assistant::{AssistantService, PendingToolCall, RunStatus, ThreadMessage, ToolOutput};
use crate::config::RunSettings;
use crate::error::{Result, ScoutError};
use crate::tools::{parse_arguments, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Terminal result of driving a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The run completed; holds the full thread transcript, oldest first.
    Completed(String),
    /// The run ended in a failure status.
    Failed(RunStatus),
}

/// Drives remote runs to completion, dispatching tool calls locally.
pub struct RunDriver {
    service: Arc<dyn AssistantService>,
    tools: Arc<ToolRegistry>,
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl RunDriver {
    /// Create a driver with the default polling settings.
    pub fn new(service: Arc<dyn AssistantService>, tools: Arc<ToolRegistry>) -> Self {
        let defaults = RunSettings::default();
        Self {
            service,
            tools,
            poll_interval: defaults.poll_interval(),
            max_wait: defaults.max_wait(),
        }
    }

    /// Apply polling settings from configuration.
    pub fn with_settings(self, settings: &RunSettings) -> Self {
        self.with_poll_interval(settings.poll_interval())
            .with_max_wait(settings.max_wait())
    }

    /// Set the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the total time spent driving a run (`None` = unbounded).
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Drive an existing run until it reaches a terminal state.
    ///
    /// Terminal failure statuses are returned as [`Outcome::Failed`]. Errors
    /// are reserved for unknown tools ([`ScoutError::UnknownTool`]), an
    /// exhausted `max_wait` ([`ScoutError::Timeout`]) and service errors,
    /// which are passed through untouched.
    #[instrument(skip(self))]
    pub async fn drive(&self, thread_id: &str, run_id: &str) -> Result<Outcome> {
        match self.max_wait {
            Some(limit) => tokio::time::timeout(limit, self.poll_until_terminal(thread_id, run_id))
                .await
                .map_err(|_| {
                    warn!("Run {} still pending after {:?}", run_id, limit);
                    ScoutError::Timeout(limit)
                })?,
            None => self.poll_until_terminal(thread_id, run_id).await,
        }
    }

    async fn poll_until_terminal(&self, thread_id: &str, run_id: &str) -> Result<Outcome> {
        let mut polls = 0usize;

        loop {
            polls += 1;
            let run = self.service.get_run(thread_id, run_id).await?;
            debug!("Poll {}: run {} is {}", polls, run_id, run.status);

            match run.status {
                RunStatus::RequiresAction => {
                    let outputs = self.answer_tool_calls(&run.tool_calls).await?;
                    self.service
                        .submit_tool_outputs(thread_id, run_id, outputs)
                        .await?;
                }
                RunStatus::Completed => {
                    let messages = self.service.list_messages(thread_id).await?;
                    info!("Run {} completed after {} polls", run_id, polls);
                    return Ok(Outcome::Completed(assemble_transcript(messages)));
                }
                status if status.is_terminal() => {
                    match &run.last_error {
                        Some(error) => warn!("Run {} ended {}: {}", run_id, status, error),
                        None => warn!("Run {} ended {}", run_id, status),
                    }
                    return Ok(Outcome::Failed(status));
                }
                // queued, in_progress and cancelling
                _ => {}
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Execute every pending call and collect one output per call.
    ///
    /// All names are resolved before anything runs, so an unknown tool
    /// leaves the batch untouched.
    async fn answer_tool_calls(&self, calls: &[PendingToolCall]) -> Result<Vec<ToolOutput>> {
        if calls.is_empty() {
            return Err(ScoutError::Protocol(
                "requires_action without pending tool calls".to_string(),
            ));
        }

        let resolved = calls
            .iter()
            .map(|call| self.tools.resolve(&call.name).map(|tool| (call, tool)))
            .collect::<Result<Vec<_>>>()?;

        let mut outputs = Vec::with_capacity(resolved.len());
        for (call, tool) in resolved {
            info!("Calling tool: {} with args: {}", call.name, call.arguments);

            let result = match parse_arguments(&call.arguments) {
                Ok(args) => tool.call(&args).await,
                Err(e) => Err(e),
            };

            let output = result.unwrap_or_else(|e| {
                warn!("Tool {} failed: {}", call.name, e);
                format!("Tool error: {}", e)
            });

            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }

        Ok(outputs)
    }
}

/// Render thread messages (newest first, as listed by the service) oldest
/// first, separated by blank lines.
pub fn assemble_transcript(mut messages: Vec<ThreadMessage>) -> String {
    messages.reverse();
    messages
        .into_iter()
        .map(|m| m.text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assistant::scripted::{requires_action, state, ScriptedService, RUN_ID, THREAD_ID};
    use crate::tools::{query_schema, Tool, ToolArgs};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingTool {
        name: &'static str,
        fail: bool,
        calls: Mutex<Vec<ToolArgs>>,
    }

    impl RecordingTool {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                fail: true,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Records its calls"
        }

        fn parameters(&self) -> serde_json::Value {
            query_schema()
        }

        async fn call(&self, args: &ToolArgs) -> Result<String> {
            self.calls.lock().unwrap().push(args.clone());
            if self.fail {
                return Err(ScoutError::InvalidInput("provider unavailable".to_string()));
            }
            Ok(format!("{} found {}", self.name, args["query"]))
        }
    }

    fn driver(service: Arc<ScriptedService>, registry: ToolRegistry) -> RunDriver {
        RunDriver::new(service, Arc::new(registry))
            .with_poll_interval(Duration::from_secs(2))
            .with_max_wait(Some(Duration::from_secs(600)))
    }

    fn message(text: &str) -> ThreadMessage {
        ThreadMessage {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_transcript_reverses_service_order() {
        let transcript = assemble_transcript(vec![message("B"), message("A")]);
        assert_eq!(transcript, "A\n\nB");

        let transcript = assemble_transcript(vec![message("m3"), message("m2"), message("m1")]);
        assert_eq!(transcript, "m1\n\nm2\n\nm3");
    }

    #[test]
    fn test_transcript_skips_messages_without_text() {
        let transcript = assemble_transcript(vec![message("B"), message(""), message("A")]);
        assert_eq!(transcript, "A\n\nB");
        assert_eq!(assemble_transcript(Vec::new()), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_completed() {
        let service = Arc::new(
            ScriptedService::with_statuses(&[
                RunStatus::Queued,
                RunStatus::InProgress,
                RunStatus::InProgress,
                RunStatus::Completed,
            ])
            .with_messages(&["Here is what I found.", "What is Rust?"]),
        );

        let outcome = driver(service.clone(), ToolRegistry::new())
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            Outcome::Completed("What is Rust?\n\nHere is what I found.".to_string())
        );
        assert_eq!(service.poll_count(), 4);
        assert_eq!(service.submission_count(), 0);
        assert_eq!(*service.message_listings.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_statuses_are_outcomes() {
        for status in [
            RunStatus::Expired,
            RunStatus::Cancelled,
            RunStatus::Failed,
            RunStatus::Incomplete,
        ] {
            let service = Arc::new(
                ScriptedService::with_statuses(&[RunStatus::Queued, status])
                    .with_messages(&["never read"]),
            );

            let outcome = driver(service.clone(), ToolRegistry::new())
                .drive(THREAD_ID, RUN_ID)
                .await
                .unwrap();

            assert_eq!(outcome, Outcome::Failed(status));
            assert_eq!(*service.message_listings.lock().unwrap(), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelling_settles_into_cancelled() {
        let service = Arc::new(ScriptedService::with_statuses(&[
            RunStatus::InProgress,
            RunStatus::Cancelling,
            RunStatus::Cancelled,
        ]));

        let outcome = driver(service.clone(), ToolRegistry::new())
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Failed(RunStatus::Cancelled));
        assert_eq!(service.poll_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_calls_answered_in_one_batch() {
        let search = RecordingTool::new("DuckDuckGoSearch");
        let wiki = RecordingTool::new("WikipediaSearch");
        let registry = ToolRegistry::new().with(search.clone()).with(wiki.clone());

        let service = Arc::new(
            ScriptedService::new(vec![
                state(RunStatus::Queued),
                requires_action(&[
                    ("call_1", "WikipediaSearch", r#"{"query": "Rust"}"#),
                    ("call_2", "DuckDuckGoSearch", r#"{"query": "Tokio"}"#),
                ]),
                state(RunStatus::InProgress),
                state(RunStatus::Completed),
            ])
            .with_messages(&["answer", "question"]),
        );

        let outcome = driver(service.clone(), registry)
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed("question\n\nanswer".to_string()));
        assert_eq!(search.call_count(), 1);
        assert_eq!(wiki.call_count(), 1);
        assert_eq!(wiki.calls.lock().unwrap()[0]["query"], "Rust");
        assert_eq!(search.calls.lock().unwrap()[0]["query"], "Tokio");

        let submissions = service.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0],
            vec![
                ToolOutput {
                    tool_call_id: "call_1".to_string(),
                    output: r#"WikipediaSearch found "Rust""#.to_string(),
                },
                ToolOutput {
                    tool_call_id: "call_2".to_string(),
                    output: r#"DuckDuckGoSearch found "Tokio""#.to_string(),
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_requires_action_gets_its_own_submission() {
        let search = RecordingTool::new("DuckDuckGoSearch");
        let registry = ToolRegistry::new().with(search.clone());

        let service = Arc::new(ScriptedService::new(vec![
            requires_action(&[("call_1", "DuckDuckGoSearch", r#"{"query": "a"}"#)]),
            state(RunStatus::InProgress),
            requires_action(&[("call_2", "DuckDuckGoSearch", r#"{"query": "b"}"#)]),
            state(RunStatus::Completed),
        ]));

        driver(service.clone(), registry)
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        assert_eq!(search.call_count(), 2);
        let submissions = service.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0][0].tool_call_id, "call_1");
        assert_eq!(submissions[1][0].tool_call_id, "call_2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_tool_submits_nothing() {
        let search = RecordingTool::new("DuckDuckGoSearch");
        let registry = ToolRegistry::new().with(search.clone());

        let service = Arc::new(ScriptedService::new(vec![
            requires_action(&[
                ("call_1", "DuckDuckGoSearch", r#"{"query": "Rust"}"#),
                ("call_2", "GoogleSearch", r#"{"query": "Rust"}"#),
            ]),
            state(RunStatus::Completed),
        ]));

        let result = driver(service.clone(), registry)
            .drive(THREAD_ID, RUN_ID)
            .await;

        match result {
            Err(ScoutError::UnknownTool(name)) => assert_eq!(name, "GoogleSearch"),
            other => panic!("Expected UnknownTool, got {:?}", other),
        }
        assert_eq!(search.call_count(), 0);
        assert_eq!(service.submission_count(), 0);
        assert_eq!(service.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tool_failures_still_answer_their_call() {
        let broken = RecordingTool::failing("DuckDuckGoSearch");
        let wiki = RecordingTool::new("WikipediaSearch");
        let registry = ToolRegistry::new().with(broken.clone()).with(wiki.clone());

        let service = Arc::new(ScriptedService::new(vec![
            requires_action(&[
                ("call_1", "DuckDuckGoSearch", r#"{"query": "Rust"}"#),
                ("call_2", "WikipediaSearch", "{not json"),
            ]),
            state(RunStatus::Completed),
        ]));

        driver(service.clone(), registry)
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        // Malformed arguments never reach the tool.
        assert_eq!(broken.call_count(), 1);
        assert_eq!(wiki.call_count(), 0);

        let submissions = service.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].len(), 2);
        assert_eq!(
            submissions[0][0].output,
            "Tool error: Invalid input: provider unavailable"
        );
        assert!(submissions[0][1]
            .output
            .starts_with("Tool error: Invalid input: Invalid tool arguments"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requires_action_without_calls_is_protocol_error() {
        let service = Arc::new(ScriptedService::new(vec![
            requires_action(&[]),
            state(RunStatus::Completed),
        ]));

        let result = driver(service.clone(), ToolRegistry::new())
            .drive(THREAD_ID, RUN_ID)
            .await;

        assert!(matches!(result, Err(ScoutError::Protocol(_))));
        assert_eq!(service.submission_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_polling() {
        let service = Arc::new(ScriptedService::with_statuses(&[RunStatus::InProgress]));

        let result = RunDriver::new(service.clone(), Arc::new(ToolRegistry::new()))
            .with_poll_interval(Duration::from_secs(2))
            .with_max_wait(Some(Duration::from_secs(9)))
            .drive(THREAD_ID, RUN_ID)
            .await;

        match result {
            Err(ScoutError::Timeout(limit)) => assert_eq!(limit, Duration::from_secs(9)),
            other => panic!("Expected Timeout, got {:?}", other),
        }

        // Polls at t = 0, 2, 4, 6, 8; the deadline hits at t = 9.
        assert_eq!(service.poll_count(), 5);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.poll_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_wait_polls_until_terminal() {
        let mut statuses = vec![RunStatus::InProgress; 500];
        statuses.push(RunStatus::Completed);
        let service = Arc::new(ScriptedService::with_statuses(&statuses).with_messages(&["done"]));

        let outcome = RunDriver::new(service.clone(), Arc::new(ToolRegistry::new()))
            .with_poll_interval(Duration::from_secs(2))
            .with_max_wait(None)
            .drive(THREAD_ID, RUN_ID)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Completed("done".to_string()));
        assert_eq!(service.poll_count(), 501);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_propagate() {
        let service = Arc::new(ScriptedService::with_statuses(&[RunStatus::Queued]).failing_polls());

        let result = driver(service.clone(), ToolRegistry::new())
            .drive(THREAD_ID, RUN_ID)
            .await;

        assert!(matches!(result, Err(ScoutError::Transport(_))));
        assert_eq!(service.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_submission_propagates_without_polling_again() {
        let search = RecordingTool::new("DuckDuckGoSearch");
        let registry = ToolRegistry::new().with(search.clone());
        let service = Arc::new(
            ScriptedService::new(vec![
                requires_action(&[("call_1", "DuckDuckGoSearch", r#"{"query": "Rust"}"#)]),
                state(RunStatus::Completed),
            ])
            .failing_submissions(),
        );

        let result = driver(service.clone(), registry)
            .drive(THREAD_ID, RUN_ID)
            .await;

        match result {
            Err(ScoutError::Transport(e)) => assert!(e.to_string().contains("connection reset")),
            other => panic!("Expected Transport, got {:?}", other),
        }
        assert_eq!(search.call_count(), 1);
        assert_eq!(service.submission_count(), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(service.poll_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_message_listing_propagates() {
        let service = Arc::new(
            ScriptedService::with_statuses(&[RunStatus::InProgress, RunStatus::Completed])
                .with_messages(&["never returned"])
                .failing_listings(),
        );

        let result = driver(service.clone(), ToolRegistry::new())
            .drive(THREAD_ID, RUN_ID)
            .await;

        match result {
            Err(ScoutError::Transport(e)) => assert!(e.to_string().contains("connection reset")),
            other => panic!("Expected Transport, got {:?}", other),
        }
        assert_eq!(service.poll_count(), 2);
        assert_eq!(*service.message_listings.lock().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_run_is_idempotent() {
        let service = Arc::new(
            ScriptedService::with_statuses(&[RunStatus::Completed]).with_messages(&["B", "A"]),
        );
        let driver = driver(service.clone(), ToolRegistry::new());

        let first = driver.drive(THREAD_ID, RUN_ID).await.unwrap();
        let second = driver.drive(THREAD_ID, RUN_ID).await.unwrap();

        assert_eq!(first, Outcome::Completed("A\n\nB".to_string()));
        assert_eq!(first, second);
        assert_eq!(service.submission_count(), 0);
        assert_eq!(service.poll_count(), 2);
    }
}
