//! OpenAI Assistants API implementation.

use super::{
    AssistantService, AssistantSpec, PendingToolCall, RunSnapshot, RunStatus, ThreadMessage,
    ToolOutput,
};
use crate::config::Settings;
use crate::error::Result;
use crate::openai::create_client;
use async_openai::types::{
    self as oai, AssistantTools, AssistantToolsFunction, CreateAssistantRequestArgs,
    CreateMessageRequestArgs, CreateRunRequestArgs, CreateThreadRequestArgs, FunctionObject,
    MessageContent, MessageObject, RunObject, SubmitToolOutputsRunRequest, ToolsOutputs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Page size used when listing thread messages.
const MESSAGE_PAGE_SIZE: &str = "100";

/// Assistant service backed by the OpenAI Assistants API.
pub struct OpenAIAssistants {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAIAssistants {
    /// Create a service from settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
        })
    }
}

#[async_trait]
impl AssistantService for OpenAIAssistants {
    #[instrument(skip(self, spec), fields(name = %spec.name, model = %spec.model))]
    async fn create_assistant(&self, spec: &AssistantSpec) -> Result<String> {
        let tools: Vec<AssistantTools> = spec
            .tools
            .iter()
            .map(|tool| {
                AssistantTools::Function(AssistantToolsFunction {
                    function: FunctionObject {
                        name: tool.name.clone(),
                        description: Some(tool.description.clone()),
                        parameters: Some(tool.parameters.clone()),
                        strict: None,
                    },
                })
            })
            .collect();

        let request = CreateAssistantRequestArgs::default()
            .name(&spec.name)
            .instructions(&spec.instructions)
            .model(&spec.model)
            .tools(tools)
            .build()?;

        let assistant = self.client.assistants().create(request).await?;
        debug!("Created assistant {}", assistant.id);
        Ok(assistant.id)
    }

    #[instrument(skip(self, first_message))]
    async fn create_thread(&self, first_message: &str) -> Result<String> {
        let message = CreateMessageRequestArgs::default()
            .role(oai::MessageRole::User)
            .content(first_message.to_string())
            .build()?;

        let request = CreateThreadRequestArgs::default()
            .messages(vec![message])
            .build()?;

        let thread = self.client.threads().create(request).await?;
        debug!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    #[instrument(skip(self, content))]
    async fn add_message(&self, thread_id: &str, content: &str) -> Result<()> {
        let request = CreateMessageRequestArgs::default()
            .role(oai::MessageRole::User)
            .content(content.to_string())
            .build()?;

        self.client
            .threads()
            .messages(thread_id)
            .create(request)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<RunSnapshot> {
        let request = CreateRunRequestArgs::default()
            .assistant_id(assistant_id)
            .build()?;

        let run = self.client.threads().runs(thread_id).create(request).await?;
        debug!("Created run {} ({:?})", run.id, run.status);
        Ok(snapshot(run))
    }

    #[instrument(skip(self))]
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunSnapshot> {
        let run = self.client.threads().runs(thread_id).retrieve(run_id).await?;
        Ok(snapshot(run))
    }

    #[instrument(skip(self, outputs), fields(count = outputs.len()))]
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<()> {
        let request = SubmitToolOutputsRunRequest {
            tool_outputs: outputs
                .into_iter()
                .map(|o| ToolsOutputs {
                    tool_call_id: Some(o.tool_call_id),
                    output: Some(o.output),
                })
                .collect(),
            stream: None,
        };

        self.client
            .threads()
            .runs(thread_id)
            .submit_tool_outputs(run_id, request)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut messages = Vec::new();
        let mut after: Option<String> = None;

        // Default ordering is newest first; follow the cursor until exhausted.
        loop {
            let mut query = vec![("limit", MESSAGE_PAGE_SIZE.to_string())];
            if let Some(cursor) = &after {
                query.push(("after", cursor.clone()));
            }

            let page = self
                .client
                .threads()
                .messages(thread_id)
                .list(&query)
                .await?;

            messages.extend(page.data.into_iter().map(thread_message));

            match page.last_id {
                Some(last_id) if page.has_more => after = Some(last_id),
                _ => break,
            }
        }

        debug!("Listed {} messages", messages.len());
        Ok(messages)
    }
}

impl From<oai::RunStatus> for RunStatus {
    fn from(status: oai::RunStatus) -> Self {
        match status {
            oai::RunStatus::Queued => RunStatus::Queued,
            oai::RunStatus::InProgress => RunStatus::InProgress,
            oai::RunStatus::RequiresAction => RunStatus::RequiresAction,
            oai::RunStatus::Cancelling => RunStatus::Cancelling,
            oai::RunStatus::Cancelled => RunStatus::Cancelled,
            oai::RunStatus::Failed => RunStatus::Failed,
            oai::RunStatus::Completed => RunStatus::Completed,
            oai::RunStatus::Incomplete => RunStatus::Incomplete,
            oai::RunStatus::Expired => RunStatus::Expired,
        }
    }
}

fn snapshot(run: RunObject) -> RunSnapshot {
    let tool_calls = run
        .required_action
        .map(|action| {
            action
                .submit_tool_outputs
                .tool_calls
                .into_iter()
                .map(|call| PendingToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments: call.function.arguments,
                })
                .collect()
        })
        .unwrap_or_default();

    RunSnapshot {
        id: run.id,
        status: run.status.into(),
        tool_calls,
        last_error: run.last_error.map(|e| e.message),
    }
}

fn thread_message(message: MessageObject) -> ThreadMessage {
    let text = message
        .content
        .into_iter()
        .find_map(|content| match content {
            MessageContent::Text(text) => Some(text.text.value),
            _ => None,
        })
        .unwrap_or_default();

    ThreadMessage { text }
}
