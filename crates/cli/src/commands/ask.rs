//! Ask command handler.
//!
//! Runs the four-stage answer pipeline over a single question and prints
//! the final answer.

use clap::Args;
use mes_droits_agent::{AnswerPipeline, Conversation, RetrievalGateway};
use mes_droits_core::{AppConfig, AppError, AppResult};
use mes_droits_llm::create_client;
use std::sync::Arc;

/// Ask a question, answered from the publication corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question, in French
    pub question: String,

    /// Print every conversation turn, not just the final answer
    #[arg(long)]
    pub transcript: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let store = super::open_store(config).await?;
        let client = create_client(&config.provider, Some(config.endpoint.as_str()))?;

        let pipeline = AnswerPipeline::new(
            client,
            RetrievalGateway::new(Arc::new(store)),
            &config.model,
        );

        let conversation = Conversation::with_user(&self.question);
        let result = pipeline.run(conversation).await?;

        let answer = result
            .final_answer()
            .ok_or_else(|| AppError::Other("Pipeline produced no answer".to_string()))?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer,
                "turns": result.len(),
                "model": config.model,
                "provider": config.provider,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else if self.transcript {
            for message in result.messages() {
                println!("[{}]", message.role.as_str());
                if !message.content.is_empty() {
                    println!("{}", message.content);
                }
                for call in &message.tool_calls {
                    println!("-> {}({})", call.name, call.arguments);
                }
                println!();
            }
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
