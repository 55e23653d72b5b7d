//! Command handlers for the Mes Droits CLI.

mod ask;
mod delete;
mod ingest;
mod search;

pub use ask::AskCommand;
pub use delete::DeleteCommand;
pub use ingest::IngestCommand;
pub use search::SearchCommand;

use mes_droits_core::{AppConfig, AppResult};
use mes_droits_store::{
    create_provider, LanceDbIndex, PublicationVectorStore, PUBLICATIONS_TABLE,
};
use std::sync::Arc;

/// Open the publication vector store described by the configuration.
pub(crate) async fn open_store(config: &AppConfig) -> AppResult<PublicationVectorStore> {
    let index = LanceDbIndex::new(
        &config.store_path,
        PUBLICATIONS_TABLE,
        config.embedding_dim,
    )
    .await?;

    let embeddings = create_provider(
        &config.embedding_provider,
        Some(config.endpoint.as_str()),
        &config.embedding_model,
        config.embedding_dim,
    )?;

    Ok(PublicationVectorStore::new(Arc::new(index), embeddings))
}
