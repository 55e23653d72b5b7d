//! Publication corpus storage for the Mes Droits assistant.
//!
//! Stores official publications as embedded markdown documents in a vector
//! index and keeps the corpus fresh: ingestion runs replace records by id in
//! retried batches, then evict everything older than the run. Also serves
//! similarity search for the answer pipeline and direct lookups.

pub mod embeddings;
pub mod lancedb_index;
pub mod memory_index;
pub mod retry;
pub mod store;
pub mod types;
pub mod vector_index;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider, MockEmbeddings, OllamaEmbeddings};
pub use lancedb_index::{LanceDbIndex, PUBLICATIONS_TABLE};
pub use memory_index::MemoryIndex;
pub use retry::RetryPolicy;
pub use store::{
    PublicationVectorStore, DEFAULT_SEARCH_K, EVICTION_BATCH_SIZE, INGEST_BATCH_SIZE,
};
pub use types::{Breadcrumb, IngestStats, Link, Publication, ScoredDocument, StoredDocument};
pub use vector_index::VectorIndex;
