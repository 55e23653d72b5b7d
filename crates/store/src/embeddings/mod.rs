//! Embedding generation for publications.
//!
//! Provider-agnostic embedding generation behind a single trait.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockEmbeddings, OllamaEmbeddings};
