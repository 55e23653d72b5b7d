//! Publication vector store.
//!
//! The ingestion/storage manager: batched, retried replacement of the
//! publication corpus, stale-record eviction, and direct similarity search.

use crate::embeddings::EmbeddingProvider;
use crate::retry::RetryPolicy;
use crate::types::{IngestStats, Publication, ScoredDocument, StoredDocument};
use crate::vector_index::VectorIndex;
use chrono::{DateTime, Utc};
use mes_droits_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Instant;

/// Number of publications written per batch.
pub const INGEST_BATCH_SIZE: usize = 20;

/// Number of stale records deleted per eviction batch.
pub const EVICTION_BATCH_SIZE: usize = 200;

/// Default result count for direct lookups.
pub const DEFAULT_SEARCH_K: usize = 5;

/// Vector store over the official publication corpus.
pub struct PublicationVectorStore {
    index: Arc<dyn VectorIndex>,
    embeddings: Arc<dyn EmbeddingProvider>,
    retry: RetryPolicy,
}

impl PublicationVectorStore {
    /// Create a store with the ingestion retry policy.
    pub fn new(index: Arc<dyn VectorIndex>, embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            embeddings,
            retry: RetryPolicy::ingestion(),
        }
    }

    /// Override the retry policy (tests use [`RetryPolicy::immediate`]).
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Ingest publications, replacing the corpus.
    ///
    /// Every record is stamped with the run timestamp, rendered to markdown
    /// and written in batches of [`INGEST_BATCH_SIZE`]; each batch is
    /// embedded and replaced under the retry policy. Once every batch has
    /// been committed, records from earlier runs are evicted. A batch that
    /// exhausts its retries aborts the run before eviction, leaving the
    /// previous corpus in place.
    pub async fn add_publications(
        &self,
        publications: Vec<Publication>,
    ) -> AppResult<IngestStats> {
        let start = Instant::now();
        let run_timestamp = Utc::now();

        tracing::info!(
            "Starting ingestion of {} publications",
            publications.len()
        );

        let documents: Vec<StoredDocument> = publications
            .iter()
            .map(|publication| {
                let id = publication
                    .id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                StoredDocument {
                    id,
                    title: publication.title.clone().unwrap_or_default(),
                    url: publication.url.clone().unwrap_or_default(),
                    text: publication.to_markdown(),
                    date_added: run_timestamp,
                    embedding: None,
                }
            })
            .collect();

        let mut batches = 0usize;
        for batch in documents.chunks(INGEST_BATCH_SIZE) {
            self.replace_batch_with_retry(batch).await?;
            batches += 1;
            tracing::info!(
                "Committed batch {} ({} publications)",
                batches,
                batch.len()
            );
        }

        // Eviction runs only after every batch insert succeeded
        let evicted = self.evict_stale(run_timestamp).await?;

        let duration = start.elapsed();
        tracing::info!(
            "Ingestion completed: {} publications in {} batches, {} stale records evicted, {:.2}s",
            documents.len(),
            batches,
            evicted,
            duration.as_secs_f64()
        );

        Ok(IngestStats {
            publications: documents.len(),
            batches,
            evicted,
            duration_secs: duration.as_secs_f64(),
        })
    }

    /// Embed and replace one batch under the retry policy.
    ///
    /// The whole embed-then-replace sequence is retried as a unit; the
    /// delete-before-insert inside `replace_batch` keeps it idempotent.
    async fn replace_batch_with_retry(&self, batch: &[StoredDocument]) -> AppResult<()> {
        let index = Arc::clone(&self.index);
        let embeddings = Arc::clone(&self.embeddings);
        let batch: Vec<StoredDocument> = batch.to_vec();

        self.retry
            .run("batch write", move || {
                let index = Arc::clone(&index);
                let embeddings = Arc::clone(&embeddings);
                let batch = batch.clone();
                async move {
                    let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
                    let vectors = embeddings.embed_batch(&texts).await?;

                    let documents: Vec<StoredDocument> = batch
                        .into_iter()
                        .zip(vectors)
                        .map(|(mut document, vector)| {
                            document.embedding = Some(vector);
                            document
                        })
                        .collect();

                    index.replace_batch(&documents).await
                }
            })
            .await
            .map_err(|e| AppError::BatchWrite(e.to_string()))
    }

    /// Delete records older than the cutoff, in batches, until none remain.
    async fn evict_stale(&self, cutoff: DateTime<Utc>) -> AppResult<usize> {
        tracing::info!("Starting eviction of stale publications...");

        let mut total_evicted = 0usize;

        loop {
            let ids = self.index.stale_ids(cutoff, EVICTION_BATCH_SIZE).await?;
            if ids.is_empty() {
                break;
            }

            let deleted = self.index.delete_ids(&ids).await?;
            total_evicted += deleted;
            tracing::info!(
                "Evicted {} stale publications in this batch (total: {})",
                deleted,
                total_evicted
            );

            if deleted == 0 {
                tracing::warn!("Eviction made no progress on {} stale ids, stopping", ids.len());
                break;
            }
        }

        tracing::info!("Completed stale eviction. Total evicted: {}", total_evicted);
        Ok(total_evicted)
    }

    /// Delete a publication by id. Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let deleted = self.index.delete_ids(&[id.to_string()]).await?;
        Ok(deleted > 0)
    }

    /// Search publications by semantic similarity.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<ScoredDocument>> {
        let query_embedding = self.embeddings.embed(query).await?;
        let results = self.index.search(&query_embedding, k).await?;

        Ok(results
            .into_iter()
            .map(|(document, score)| ScoredDocument {
                id: document.id,
                title: document.title,
                url: document.url,
                text: document.text,
                score,
            })
            .collect())
    }

    /// Number of publications currently stored.
    pub async fn count(&self) -> AppResult<usize> {
        self.index.count().await
    }
}
