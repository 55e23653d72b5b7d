//! The four-stage answer pipeline.
//!
//! A linear state machine over the conversation: query generation, tool
//! execution, assertion extraction, answer synthesis. Each stage appends
//! messages and never touches prior turns. External failures abort the run;
//! retries, if any, belong to the caller.

use crate::assertions::AssertionSet;
use crate::conversation::Conversation;
use crate::retrieval::RetrievalGateway;
use mes_droits_core::{AppError, AppResult};
use mes_droits_llm::{ChatMessage, ChatRequest, LlmClient, ToolCall, ToolChoice};
use std::sync::Arc;

/// Tool name used for the synthetic invocation pairing the assertion set
/// into the conversation.
const SUMMARY_TOOL_NAME: &str = "summary";

/// Sentinel appended when no assertion survives the grounding filter.
const NO_SOURCED_ASSERTIONS: &str = "No sourced assertions were found. \
    Tell the user that you cannot answer their questions.";

const QUERY_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
    Use the search tool to find relevant context about the user's question. \
    Answer in French.";

const ASSERTION_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
    Generate a list of assertions to answer the user's questions. \
    Cite the URL of the source for each of your assertions. \
    Never make an assertion that you can't cite from the search tool. \
    Answer in French.";

const SYNTHESIS_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
    Generate a response to the user's question using the provided assertions. \
    Cite the URL of the source for each of your assertions in the form ( https://SOURCE_URL ) \
    If you cannot find relevant information say to the user that you are unable to answer. \
    Write this as a single paragraph if possible. \
    Answer in French.";

/// Four-stage retrieval-augmented answer pipeline.
pub struct AnswerPipeline {
    client: Arc<dyn LlmClient>,
    gateway: RetrievalGateway,
    model: String,
}

impl AnswerPipeline {
    /// Create a pipeline over a chat client and a retrieval gateway.
    pub fn new(
        client: Arc<dyn LlmClient>,
        gateway: RetrievalGateway,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            gateway,
            model: model.into(),
        }
    }

    /// Run the four stages over a seeded conversation.
    ///
    /// Returns the conversation extended with every intermediate and final
    /// message; callers that only need the answer read the last entry. A
    /// failure mid-run aborts: the partial conversation is not returned.
    pub async fn run(&self, mut conversation: Conversation) -> AppResult<Conversation> {
        self.generate_search_query(&mut conversation).await?;
        self.execute_tool_calls(&mut conversation).await?;
        self.extract_assertions(&mut conversation).await?;
        self.synthesize_answer(&mut conversation).await?;
        Ok(conversation)
    }

    /// Stage 1: have the model emit search tool invocations.
    async fn generate_search_query(&self, conversation: &mut Conversation) -> AppResult<()> {
        let request = ChatRequest::new(&self.model, with_system(QUERY_SYSTEM_PROMPT, conversation))
            .with_tools(vec![RetrievalGateway::tool_spec()])
            .with_tool_choice(ToolChoice::Required);

        let response = self.client.chat(&request).await?;
        let message = response.message;

        // The tool choice is required; a plain answer here would bypass
        // retrieval entirely.
        if message.tool_calls.is_empty() {
            return Err(AppError::Llm(
                "Model answered without requesting a search".to_string(),
            ));
        }

        tracing::info!(
            "Stage 'generate_search_query': {} tool call(s) requested",
            message.tool_calls.len()
        );
        conversation.push(message);
        Ok(())
    }

    /// Stage 2: execute every requested search, in request order.
    async fn execute_tool_calls(&self, conversation: &mut Conversation) -> AppResult<()> {
        let tool_calls: Vec<ToolCall> = conversation
            .last()
            .map(|m| m.tool_calls.clone())
            .unwrap_or_default();

        for tool_call in tool_calls {
            let query = tool_call
                .arguments
                .get("query")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    AppError::Schema(format!(
                        "Tool call '{}' missing string argument 'query'",
                        tool_call.name
                    ))
                })?;

            let result = self.gateway.execute(query).await?;

            tracing::debug!(
                "Stage 'execute_tool_calls': query '{}' returned {} characters",
                query,
                result.len()
            );
            conversation.push(ChatMessage::tool(result, tool_call.id, tool_call.name));
        }

        Ok(())
    }

    /// Stage 3: extract sourced assertions from the retrieved context.
    ///
    /// The serialized set is appended as a tool result paired with a
    /// synthetic invocation, matching the protocol convention that a tool
    /// result answers a preceding tool call. What matters downstream is
    /// only that the assertions are visible to stage 4 as prior context.
    async fn extract_assertions(&self, conversation: &mut Conversation) -> AppResult<()> {
        let schema = AssertionSet::schema();
        let system = format!("{} Use this schema: {}", ASSERTION_SYSTEM_PROMPT, schema);

        let request = ChatRequest::new(&self.model, with_system(&system, conversation))
            .with_format(schema);

        let response = self.client.chat(&request).await?;
        let extracted = AssertionSet::from_json(&response.message.content)?;
        let kept = extracted.retain_sourced();

        let content = if kept.is_empty() {
            tracing::info!("Stage 'extract_assertions': no sourced assertions survived");
            NO_SOURCED_ASSERTIONS.to_string()
        } else {
            tracing::info!(
                "Stage 'extract_assertions': {} sourced assertion(s) kept",
                kept.assertions.len()
            );
            kept.to_json()?
        };

        let summary_call = ToolCall::new(SUMMARY_TOOL_NAME, serde_json::json!({}));
        let summary_call_id = summary_call.id.clone();
        conversation.push(ChatMessage::assistant_tool_calls(vec![summary_call]));
        conversation.push(ChatMessage::tool(content, summary_call_id, SUMMARY_TOOL_NAME));
        Ok(())
    }

    /// Stage 4: synthesize the final answer from the visible assertions.
    async fn synthesize_answer(&self, conversation: &mut Conversation) -> AppResult<()> {
        let request = ChatRequest::new(
            &self.model,
            with_system(SYNTHESIS_SYSTEM_PROMPT, conversation),
        );

        let response = self.client.chat(&request).await?;

        tracing::info!("Stage 'synthesize_answer': final answer generated");
        conversation.push(response.message);
        Ok(())
    }
}

/// Prepend a system instruction to the conversation's turns.
///
/// The instruction travels with the request only; it is never appended to
/// the conversation itself.
fn with_system(prompt: &str, conversation: &Conversation) -> Vec<ChatMessage> {
    std::iter::once(ChatMessage::system(prompt))
        .chain(conversation.messages().iter().cloned())
        .collect()
}
