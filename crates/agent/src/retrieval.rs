//! Retrieval gateway for the answer pipeline.
//!
//! Wraps the vector-search capability behind a single query-in/text-out
//! call: top-k lookup, per-document content truncation, title + content
//! concatenation. No re-ranking and no retries at this layer.

use mes_droits_core::{AppError, AppResult};
use mes_droits_llm::ToolSpec;
use mes_droits_store::PublicationVectorStore;
use std::sync::Arc;

/// Name of the search tool offered to the model.
pub const SEARCH_TOOL_NAME: &str = "search";

/// Number of documents retrieved per query.
pub const SEARCH_RESULT_COUNT: usize = 20;

/// Character budget per retrieved document, bounding prompt size.
pub const MAX_DOCUMENT_CHARS: usize = 10_000;

/// A document returned by the retrieval capability.
#[derive(Debug, Clone)]
pub struct RetrievedDocument {
    /// Publication title
    pub title: String,

    /// Rendered publication text
    pub content: String,
}

/// The opaque vector-search capability.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` documents ordered by similarity to `query`.
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedDocument>>;
}

#[async_trait::async_trait]
impl Retriever for PublicationVectorStore {
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<RetrievedDocument>> {
        let results = PublicationVectorStore::search(self, query, k).await?;
        Ok(results
            .into_iter()
            .map(|d| RetrievedDocument {
                title: d.title,
                content: d.text,
            })
            .collect())
    }
}

/// Query-in/documents-out wrapper used by the pipeline's tool stage.
pub struct RetrievalGateway {
    retriever: Arc<dyn Retriever>,
    k: usize,
    max_document_chars: usize,
}

impl RetrievalGateway {
    /// Create a gateway with the pipeline defaults.
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self {
            retriever,
            k: SEARCH_RESULT_COUNT,
            max_document_chars: MAX_DOCUMENT_CHARS,
        }
    }

    /// Specification of the search tool offered to the model.
    pub fn tool_spec() -> ToolSpec {
        ToolSpec {
            name: SEARCH_TOOL_NAME.to_string(),
            description: "Search in a vector store of French citizen rights. \
                Use this tool to complement your answers. \
                Generate your own queries to search the document database to \
                better answer the user's questions. \
                Always search first before answering."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query, in French"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Execute one search and format the results for the conversation.
    pub async fn execute(&self, query: &str) -> AppResult<String> {
        tracing::info!("Executing search tool with query: '{}'", query);

        let documents = self
            .retriever
            .search(query, self.k)
            .await
            .map_err(|e| AppError::Retrieval(e.to_string()))?;

        tracing::debug!("Search returned {} documents", documents.len());

        let mut result = String::new();
        for document in &documents {
            result.push_str(&document.title);
            result.push('\n');
            result.push_str(&truncate_chars(&document.content, self.max_document_chars));
        }

        Ok(result)
    }
}

/// Truncate to a character budget without splitting a UTF-8 sequence.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}
