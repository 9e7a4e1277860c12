//! Research sessions: assistant setup, conversation threads and runs.
//!
//! A [`Researcher`] owns the assistant configuration and the run driver. A
//! [`Conversation`] owns one remote thread. Its first question creates the
//! thread and later questions are appended to it. Each question starts a run
//! that is driven to completion before `ask` returns, so a thread never has
//! two outstanding runs. A run left behind by a failed drive is driven again
//! before the next question; if it still does not settle, the thread is
//! abandoned for a fresh one.

use crate::assistant::{AssistantService, AssistantSpec, OpenAIAssistants};
use crate::config::Settings;
use crate::driver::{Outcome, RunDriver};
use crate::error::Result;
use crate::tools::ToolRegistry;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

/// Entry point for asking research questions.
pub struct Researcher {
    service: Arc<dyn AssistantService>,
    driver: RunDriver,
    spec: AssistantSpec,
    assistant_id: OnceCell<String>,
}

impl Researcher {
    /// Create a researcher over an arbitrary service.
    pub fn new(
        service: Arc<dyn AssistantService>,
        tools: Arc<ToolRegistry>,
        settings: &Settings,
    ) -> Self {
        let spec = AssistantSpec {
            name: settings.assistant.name.clone(),
            instructions: settings.assistant.instructions.clone(),
            model: settings.assistant.model.clone(),
            tools: tools.definitions(),
        };

        let assistant_id = match &settings.assistant.assistant_id {
            Some(id) if !id.is_empty() => OnceCell::new_with(Some(id.clone())),
            _ => OnceCell::new(),
        };

        Self {
            driver: RunDriver::new(service.clone(), tools).with_settings(&settings.run),
            service,
            spec,
            assistant_id,
        }
    }

    /// Create a researcher backed by the OpenAI Assistants API.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let service = Arc::new(OpenAIAssistants::new(settings)?);
        let tools = Arc::new(ToolRegistry::from_settings(&settings.tools)?);
        Ok(Self::new(service, tools, settings))
    }

    /// ID of the assistant, creating it on first use.
    pub async fn assistant_id(&self) -> Result<&str> {
        let id = self
            .assistant_id
            .get_or_try_init(|| async {
                info!("Creating assistant '{}' ({})", self.spec.name, self.spec.model);
                self.service.create_assistant(&self.spec).await
            })
            .await?;
        Ok(id.as_str())
    }

    /// Start a new conversation thread.
    pub fn conversation(&self) -> Conversation<'_> {
        Conversation {
            researcher: self,
            thread_id: None,
            outstanding_run: None,
            transcript: String::new(),
            history: Vec::new(),
        }
    }

    /// Ask a single question on a fresh thread.
    pub async fn research(&self, question: &str) -> Result<Outcome> {
        self.conversation().ask(question).await
    }

    /// Drive a run that was created elsewhere.
    pub async fn resume(&self, thread_id: &str, run_id: &str) -> Result<Outcome> {
        self.driver.drive(thread_id, run_id).await
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.driver.tools()
    }
}

/// One question and how its run ended.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub outcome: Outcome,
    /// Text the run added after the question.
    pub reply: Option<String>,
}

/// A conversation on a single remote thread.
pub struct Conversation<'a> {
    researcher: &'a Researcher,
    thread_id: Option<String>,
    /// Run whose drive ended in an error and may still be active.
    outstanding_run: Option<String>,
    transcript: String,
    history: Vec<Exchange>,
}

impl Conversation<'_> {
    /// Post a question, run the assistant and wait for the outcome.
    #[instrument(skip(self, question), fields(thread = ?self.thread_id))]
    pub async fn ask(&mut self, question: &str) -> Result<Outcome> {
        let researcher = self.researcher;
        let service = &researcher.service;
        let assistant_id = researcher.assistant_id().await?.to_string();

        self.settle_outstanding_run().await;

        let thread_id = match &self.thread_id {
            Some(id) => {
                service.add_message(id, question).await?;
                id.clone()
            }
            None => {
                let id = service.create_thread(question).await?;
                self.thread_id = Some(id.clone());
                id
            }
        };

        let run = service.create_run(&thread_id, &assistant_id).await?;
        debug!("Started run {} on thread {}", run.id, thread_id);

        let outcome = match researcher.driver.drive(&thread_id, &run.id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.outstanding_run = Some(run.id);
                return Err(e);
            }
        };

        let reply = match &outcome {
            Outcome::Completed(transcript) => {
                let reply = reply_text(&self.transcript, transcript, question).to_string();
                self.transcript = transcript.clone();
                Some(reply)
            }
            Outcome::Failed(_) => None,
        };

        self.history.push(Exchange {
            outcome: outcome.clone(),
            reply,
        });

        Ok(outcome)
    }

    /// Drive a run left behind by a failed `ask` before reusing its thread.
    async fn settle_outstanding_run(&mut self) {
        let Some(run_id) = self.outstanding_run.take() else {
            return;
        };
        let Some(thread_id) = self.thread_id.clone() else {
            return;
        };

        let researcher = self.researcher;
        match researcher.driver.drive(&thread_id, &run_id).await {
            Ok(Outcome::Completed(transcript)) => self.transcript = transcript,
            Ok(Outcome::Failed(status)) => debug!("Earlier run {} ended {}", run_id, status),
            Err(e) => {
                warn!(
                    "Abandoning thread {}: run {} did not settle ({})",
                    thread_id, run_id, e
                );
                self.thread_id = None;
                self.transcript.clear();
            }
        }
    }

    /// Reply text of the most recent completed exchange.
    pub fn last_reply(&self) -> Option<&str> {
        self.history.last().and_then(|e| e.reply.as_deref())
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.thread_id.as_deref()
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    /// Forget the thread; the next question opens a new one.
    pub fn reset(&mut self) {
        self.thread_id = None;
        self.outstanding_run = None;
        self.transcript.clear();
        self.history.clear();
    }
}

/// The part of `transcript` not already shown in `previous`.
fn new_text<'t>(previous: &str, transcript: &'t str) -> &'t str {
    match transcript.strip_prefix(previous) {
        Some(rest) if !previous.is_empty() => rest.trim_start_matches('\n'),
        _ => transcript,
    }
}

/// New transcript text without the leading echo of `question`.
fn reply_text<'t>(previous: &str, transcript: &'t str, question: &str) -> &'t str {
    let added = new_text(previous, transcript);
    match added.strip_prefix(question) {
        Some(rest) => rest.trim_start_matches('\n'),
        None => added,
    }
}
