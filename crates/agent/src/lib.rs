//! Retrieval-augmented answer pipeline for French citizen rights questions.
//!
//! The pipeline grounds a language model's output in a corpus of official
//! publications through four fixed stages: query generation, retrieval,
//! assertion extraction, and answer synthesis. Every claim in the final
//! answer traces to a source URL or the answer says it cannot respond.

pub mod assertions;
pub mod conversation;
pub mod pipeline;
pub mod retrieval;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use assertions::{Assertion, AssertionSet};
pub use conversation::Conversation;
pub use pipeline::AnswerPipeline;
pub use retrieval::{
    RetrievalGateway, RetrievedDocument, Retriever, MAX_DOCUMENT_CHARS, SEARCH_RESULT_COUNT,
    SEARCH_TOOL_NAME,
};
