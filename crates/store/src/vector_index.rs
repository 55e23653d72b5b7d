//! Vector index abstraction for stored publications.
//!
//! Defines a trait for provider-agnostic vector storage and retrieval. The
//! backing store has no native upsert, so the write primitive is an
//! idempotent "replace batch": delete the batch's keys, then insert.

use crate::types::StoredDocument;
use chrono::{DateTime, Utc};
use mes_droits_core::AppResult;

/// Trait for vector index backends.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Replace a batch of documents: delete any records sharing the batch's
    /// ids, then insert the batch. Idempotent, safe to retry.
    async fn replace_batch(&self, documents: &[StoredDocument]) -> AppResult<()>;

    /// Delete records by id. Returns the number of records removed.
    async fn delete_ids(&self, ids: &[String]) -> AppResult<usize>;

    /// Ids of up to `limit` records whose `date_added` predates `cutoff`.
    ///
    /// Returning an empty list means no stale records remain.
    async fn stale_ids(&self, cutoff: DateTime<Utc>, limit: usize) -> AppResult<Vec<String>>;

    /// Search for the top-k most similar documents to the query embedding.
    ///
    /// Returns documents ordered by descending similarity score.
    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>>;

    /// Number of records in the index.
    async fn count(&self) -> AppResult<usize>;
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
