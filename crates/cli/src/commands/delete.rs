//! Delete command handler.

use clap::Args;
use mes_droits_core::{AppConfig, AppResult};

/// Delete a publication by id
#[derive(Args, Debug)]
pub struct DeleteCommand {
    /// Publication id
    pub id: String,
}

impl DeleteCommand {
    /// Execute the delete command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing delete command for id '{}'", self.id);

        let store = super::open_store(config).await?;

        if store.delete(&self.id).await? {
            println!("Deleted publication '{}'", self.id);
        } else {
            println!("No publication with id '{}'", self.id);
        }

        Ok(())
    }
}
