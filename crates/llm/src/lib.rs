//! Chat integration crate for the Mes Droits assistant.
//!
//! Provides a provider-agnostic abstraction for chat completion with tool
//! calling and schema-constrained output, through a unified trait-based
//! interface.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Mock**: Scripted replay for tests and offline runs
//!
//! # Example
//! ```no_run
//! use mes_droits_llm::{ChatMessage, ChatRequest, LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2", vec![ChatMessage::user("Bonjour !")]);
//! let response = client.chat(&request).await?;
//! println!("{}", response.message.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmUsage, Role, ToolCall, ToolChoice,
    ToolSpec,
};
pub use factory::create_client;
pub use providers::{MockClient, OllamaClient};
