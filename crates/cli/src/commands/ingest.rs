//! Ingest command handler.
//!
//! Loads publications from the corpus parser's JSON output and replaces
//! the stored corpus with them.

use clap::Args;
use mes_droits_core::{AppConfig, AppError, AppResult};
use mes_droits_store::Publication;
use std::path::PathBuf;

/// Ingest publications from the corpus parser's JSON output
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// JSON file containing an array of publications
    pub file: PathBuf,

    /// Output stats as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.file);

        let contents = std::fs::read_to_string(&self.file).map_err(|e| {
            AppError::Config(format!("Failed to read {:?}: {}", self.file, e))
        })?;

        let publications: Vec<Publication> = serde_json::from_str(&contents).map_err(|e| {
            AppError::Serialization(format!(
                "Failed to parse publications from {:?}: {}",
                self.file, e
            ))
        })?;

        if publications.is_empty() {
            return Err(AppError::Config(format!(
                "No publications found in {:?}",
                self.file
            )));
        }

        let store = super::open_store(config).await?;
        let stats = store.add_publications(publications).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!(
                "Ingested {} publications in {} batches ({} stale records evicted, {:.2}s)",
                stats.publications, stats.batches, stats.evicted, stats.duration_secs
            );
        }

        Ok(())
    }
}
