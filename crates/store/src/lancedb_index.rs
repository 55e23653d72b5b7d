//! LanceDB-backed vector index implementation.

use crate::types::StoredDocument;
use crate::vector_index::{cosine_similarity, VectorIndex};
use arrow_array::{Array, FixedSizeListArray, Int64Array, RecordBatch, RecordBatchIterator, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::{DateTime, Utc};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use mes_droits_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;

/// Default table name for the publication corpus.
pub const PUBLICATIONS_TABLE: &str = "publications";

/// LanceDB-backed vector index for publications.
pub struct LanceDbIndex {
    table: Table,
    embedding_dim: usize,
}

impl LanceDbIndex {
    /// Create or open a LanceDB index at the specified path.
    ///
    /// # Arguments
    /// * `db_path` - Directory path for the LanceDB database
    /// * `table_name` - Name of the table (typically "publications")
    /// * `embedding_dim` - Dimension of embedding vectors (e.g., 768)
    pub async fn new(db_path: &Path, table_name: &str, embedding_dim: usize) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Store(format!("Failed to create store directory: {}", e)))?;
        }

        let uri = db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to list tables: {}", e)))?;

        let table = if table_names.contains(&table_name.to_string()) {
            conn.open_table(table_name)
                .execute()
                .await
                .map_err(|e| AppError::Store(format!("Failed to open table: {}", e)))?
        } else {
            let schema = Self::create_schema(embedding_dim);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                table_name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to create table: {}", e)))?
        };

        tracing::debug!("Initialized LanceDB index at {:?}", db_path);

        Ok(Self {
            table,
            embedding_dim,
        })
    }

    /// Create the Arrow schema for the publications table.
    fn create_schema(embedding_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("title", DataType::Utf8, false),
            Field::new("url", DataType::Utf8, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    embedding_dim as i32,
                ),
                false,
            ),
            Field::new("date_added", DataType::Int64, false), // Unix millis
        ]))
    }

    /// Convert a StoredDocument to a single-row Arrow RecordBatch.
    fn document_to_batch(&self, document: &StoredDocument) -> AppResult<RecordBatch> {
        let schema = Self::create_schema(self.embedding_dim);

        let embedding = document
            .embedding
            .as_ref()
            .ok_or_else(|| AppError::Store(format!("Document '{}' missing embedding", document.id)))?;

        if embedding.len() != self.embedding_dim {
            return Err(AppError::Store(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                embedding.len()
            )));
        }

        let id_array = StringArray::from(vec![document.id.as_str()]);
        let title_array = StringArray::from(vec![document.title.as_str()]);
        let url_array = StringArray::from(vec![document.url.as_str()]);
        let text_array = StringArray::from(vec![document.text.as_str()]);

        let embedding_values = arrow_array::Float32Array::from(embedding.clone());
        let embedding_array = FixedSizeListArray::new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.embedding_dim as i32,
            Arc::new(embedding_values),
            None,
        );

        let date_added_array = Int64Array::from(vec![document.date_added.timestamp_millis()]);

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(id_array),
                Arc::new(title_array),
                Arc::new(url_array),
                Arc::new(text_array),
                Arc::new(embedding_array),
                Arc::new(date_added_array),
            ],
        )
        .map_err(|e| AppError::Store(format!("Failed to create RecordBatch: {}", e)))
    }

    /// Convert an Arrow RecordBatch row to a StoredDocument.
    fn batch_to_document(&self, batch: &RecordBatch, row_idx: usize) -> AppResult<StoredDocument> {
        let string_column = |idx: usize, name: &str| -> AppResult<String> {
            Ok(batch
                .column(idx)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| AppError::Store(format!("Invalid {} column", name)))?
                .value(row_idx)
                .to_string())
        };

        let id = string_column(0, "id")?;
        let title = string_column(1, "title")?;
        let url = string_column(2, "url")?;
        let text = string_column(3, "text")?;

        let embedding_list = batch
            .column(4)
            .as_any()
            .downcast_ref::<FixedSizeListArray>()
            .ok_or_else(|| AppError::Store("Invalid embedding column".to_string()))?;

        let embedding_array_ref = embedding_list.value(row_idx);
        let embedding_values = embedding_array_ref
            .as_any()
            .downcast_ref::<arrow_array::Float32Array>()
            .ok_or_else(|| AppError::Store("Invalid embedding values".to_string()))?;

        let embedding: Vec<f32> = (0..embedding_values.len())
            .map(|i| embedding_values.value(i))
            .collect();

        let date_added_ms = batch
            .column(5)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| AppError::Store("Invalid date_added column".to_string()))?
            .value(row_idx);

        let date_added = DateTime::<Utc>::from_timestamp_millis(date_added_ms)
            .ok_or_else(|| AppError::Store(format!("Invalid timestamp: {}", date_added_ms)))?;

        Ok(StoredDocument {
            id,
            title,
            url,
            text,
            date_added,
            embedding: Some(embedding),
        })
    }

    /// Build a SQL predicate matching the given ids.
    fn ids_predicate(ids: &[String]) -> String {
        let quoted: Vec<String> = ids
            .iter()
            .map(|id| format!("'{}'", id.replace('\'', "''")))
            .collect();
        format!("id IN ({})", quoted.join(", "))
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    async fn replace_batch(&self, documents: &[StoredDocument]) -> AppResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        // Delete any existing records sharing the batch's keys; the store
        // has no native upsert and duplicate ids must never accumulate.
        let ids: Vec<String> = documents.iter().map(|d| d.id.clone()).collect();
        self.table
            .delete(&Self::ids_predicate(&ids))
            .await
            .map_err(|e| AppError::Store(format!("Failed to delete batch ids: {}", e)))?;

        let batches: Vec<RecordBatch> = documents
            .iter()
            .map(|d| self.document_to_batch(d))
            .collect::<AppResult<Vec<_>>>()?;

        let combined_batch = if batches.len() == 1 {
            batches.into_iter().next().unwrap()
        } else {
            let schema = batches[0].schema();
            arrow_select::concat::concat_batches(&schema, &batches)
                .map_err(|e| AppError::Store(format!("Failed to concat batches: {}", e)))?
        };

        self.table
            .add(RecordBatchIterator::new(
                vec![Ok(combined_batch.clone())],
                combined_batch.schema(),
            ))
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to insert batch: {}", e)))?;

        tracing::debug!("Replaced batch of {} documents", documents.len());
        Ok(())
    }

    async fn delete_ids(&self, ids: &[String]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let predicate = Self::ids_predicate(ids);

        let existing = self
            .table
            .count_rows(Some(predicate.clone()))
            .await
            .map_err(|e| AppError::Store(format!("Failed to count rows: {}", e)))?;

        self.table
            .delete(&predicate)
            .await
            .map_err(|e| AppError::Store(format!("Failed to delete ids: {}", e)))?;

        Ok(existing)
    }

    async fn stale_ids(&self, cutoff: DateTime<Utc>, limit: usize) -> AppResult<Vec<String>> {
        use futures::TryStreamExt;

        let batches = self
            .table
            .query()
            .only_if(format!("date_added < {}", cutoff.timestamp_millis()))
            .limit(limit)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to query stale records: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to collect stale records: {}", e)))?;

        let mut ids = Vec::new();
        for batch in &batches {
            let id_column = batch
                .column_by_name("id")
                .and_then(|c| c.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| AppError::Store("Invalid id column".to_string()))?;
            for row_idx in 0..batch.num_rows() {
                ids.push(id_column.value(row_idx).to_string());
            }
        }

        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        k: usize,
    ) -> AppResult<Vec<(StoredDocument, f32)>> {
        use futures::TryStreamExt;

        if query_embedding.len() != self.embedding_dim {
            return Err(AppError::Store(format!(
                "Query embedding dimension mismatch: expected {}, got {}",
                self.embedding_dim,
                query_embedding.len()
            )));
        }

        let batches = self
            .table
            .query()
            .nearest_to(query_embedding.to_vec())
            .map_err(|e| AppError::Store(format!("Failed to create query: {}", e)))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| AppError::Store(format!("Failed to execute search: {}", e)))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| AppError::Store(format!("Failed to collect results: {}", e)))?;

        let mut documents_with_scores = Vec::new();

        for batch in &batches {
            for row_idx in 0..batch.num_rows() {
                let document = match self.batch_to_document(batch, row_idx) {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Failed to convert result row {}: {}", row_idx, e);
                        continue;
                    }
                };

                let score = document
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(query_embedding, e))
                    .unwrap_or(0.0);

                documents_with_scores.push((document, score));
            }
        }

        // LanceDB returns by L2 distance; re-rank by cosine similarity
        documents_with_scores
            .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        tracing::debug!(
            "Retrieved {} documents (requested top-{})",
            documents_with_scores.len(),
            k
        );

        Ok(documents_with_scores)
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| AppError::Store(format!("Failed to count rows: {}", e)))
    }
}
