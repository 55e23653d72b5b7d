//! Search command handler.
//!
//! Direct similarity lookup against the publication corpus, outside the
//! answer pipeline.

use clap::Args;
use mes_droits_core::{AppConfig, AppResult};
use mes_droits_store::DEFAULT_SEARCH_K;

/// Search the publication corpus directly
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Search query, in French
    pub query: String,

    /// Number of results to return
    #[arg(short, default_value_t = DEFAULT_SEARCH_K)]
    pub k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    /// Execute the search command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing search command");

        let store = super::open_store(config).await?;
        let results = store.search(&self.query, self.k).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No matching publications.");
            return Ok(());
        }

        for (i, hit) in results.iter().enumerate() {
            println!("{}. {} (score {:.3})", i + 1, hit.title, hit.score);
            if !hit.url.is_empty() {
                println!("   {}", hit.url);
            }
        }

        Ok(())
    }
}
