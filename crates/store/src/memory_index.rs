//! In-memory vector index.
//!
//! A simple map-backed implementation of [`VectorIndex`] for tests and
//! offline runs. Brute-force cosine search over all records.

use crate::types::StoredDocument;
use crate::vector_index::{cosine_similarity, VectorIndex};
use chrono::{DateTime, Utc};
use mes_droits_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Map-backed vector index keyed by document id.
#[derive(Default)]
pub struct MemoryIndex {
    documents: Mutex<HashMap<String, StoredDocument>>,
}

impl MemoryIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a document by id (test inspection helper).
    pub fn get(&self, id: &str) -> Option<StoredDocument> {
        self.documents.lock().unwrap().get(id).cloned()
    }
}

#[async_trait::async_trait]
impl VectorIndex for MemoryIndex {
    async fn replace_batch(&self, documents: &[StoredDocument]) -> AppResult<()> {
        let mut map = self.documents.lock().unwrap();

        for document in documents {
            if document.embedding.is_none() {
                return Err(AppError::Store(format!(
                    "Document '{}' missing embedding",
                    document.id
                )));
            }
        }

        // Delete-then-insert; the map makes this a plain overwrite
        for document in documents {
            map.remove(&document.id);
        }
        for document in documents {
            map.insert(document.id.clone(), document.clone());
        }

        Ok(())
    }

    async fn delete_ids(&self, ids: &[String]) -> AppResult<usize> {
        let mut map = self.documents.lock().unwrap();
        Ok(ids.iter().filter(|id| map.remove(*id).is_some()).count())
    }

    async fn stale_ids(&self, cutoff: DateTime<Utc>, limit: usize) -> AppResult<Vec<String>> {
        let map = self.documents.lock().unwrap();
        let mut ids: Vec<String> = map
            .values()
            .filter(|d| d.date_added < cutoff)
            .map(|d| d.id.clone())
            .collect();
        ids.sort();
        ids.truncate(limit);
        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>> {
        let map = self.documents.lock().unwrap();

        let mut scored: Vec<(StoredDocument, f32)> = map
            .values()
            .map(|d| {
                let score = d
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(query_embedding, e))
                    .unwrap_or(0.0);
                (d.clone(), score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored)
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.documents.lock().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn doc(id: &str, embedding: Vec<f32>, date_added: DateTime<Utc>) -> StoredDocument {
        StoredDocument {
            id: id.to_string(),
            title: format!("Titre {}", id),
            url: format!("https://example.fr/{}", id),
            text: format!("Texte {}", id),
            date_added,
            embedding: Some(embedding),
        }
    }

    #[tokio::test]
    async fn test_replace_batch_overwrites_same_id() {
        let index = MemoryIndex::new();
        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(60);

        index
            .replace_batch(&[doc("A", vec![1.0, 0.0], t1)])
            .await
            .unwrap();
        index
            .replace_batch(&[doc("A", vec![0.0, 1.0], t2)])
            .await
            .unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let stored = index.get("A").unwrap();
        assert_eq!(stored.date_added, t2);
        assert_eq!(stored.embedding, Some(vec![0.0, 1.0]));
    }

    #[tokio::test]
    async fn test_missing_embedding_rejected() {
        let index = MemoryIndex::new();
        let mut document = doc("A", vec![], Utc::now());
        document.embedding = None;

        let result = index.replace_batch(&[document]).await;
        assert!(matches!(result, Err(AppError::Store(_))));
    }

    #[tokio::test]
    async fn test_stale_ids_respects_cutoff_and_limit() {
        let index = MemoryIndex::new();
        let old = Utc::now() - Duration::hours(1);
        let cutoff = Utc::now();
        let fresh = cutoff + Duration::seconds(1);

        index
            .replace_batch(&[
                doc("A", vec![1.0], old),
                doc("B", vec![1.0], old),
                doc("C", vec![1.0], fresh),
            ])
            .await
            .unwrap();

        let stale = index.stale_ids(cutoff, 10).await.unwrap();
        assert_eq!(stale, vec!["A".to_string(), "B".to_string()]);

        let limited = index.stale_ids(cutoff, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let index = MemoryIndex::new();
        let now = Utc::now();

        index
            .replace_batch(&[
                doc("far", vec![0.0, 1.0], now),
                doc("near", vec![1.0, 0.1], now),
            ])
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(results[0].0.id, "near");
        assert!(results[0].1 > results[1].1);
    }

    #[tokio::test]
    async fn test_delete_ids_reports_count() {
        let index = MemoryIndex::new();
        let now = Utc::now();
        index
            .replace_batch(&[doc("A", vec![1.0], now)])
            .await
            .unwrap();

        let deleted = index
            .delete_ids(&["A".to_string(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(index.count().await.unwrap(), 0);
    }
}
