//! Blocks command handler.
//!
//! Lists, adds and removes user text blocks.

use clap::{Args, Subcommand};
use naix_core::{config::AppConfig, AppError, AppResult};
use naix_prompt::{load_settings, save_settings};
use uuid::Uuid;

/// Manage text blocks
#[derive(Args, Debug)]
pub struct BlocksCommand {
    #[command(subcommand)]
    pub action: BlocksAction,
}

#[derive(Subcommand, Debug)]
pub enum BlocksAction {
    /// List text blocks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a text block
    Add {
        /// Fragment name the block is exposed under
        label: String,
        /// Block content
        content: String,
    },
    /// Remove a text block by id
    Remove {
        /// Block id
        id: Uuid,
    },
}

impl BlocksCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing blocks command");

        let path = config.settings_path();
        let mut settings = load_settings(&path)?;

        match &self.action {
            BlocksAction::List { json } => {
                if *json {
                    println!("{}", serde_json::to_string_pretty(&settings.text_blocks)?);
                } else if settings.text_blocks.is_empty() {
                    println!("No text blocks");
                } else {
                    for block in &settings.text_blocks {
                        println!("{}  {{{{{}}}}}  {}", block.id, block.label, block.content);
                    }
                }
            }
            BlocksAction::Add { label, content } => {
                let id = settings
                    .add_text_block(label.as_str(), content.as_str())
                    .ok_or_else(|| {
                        AppError::Settings("Text block label and content cannot be empty".to_string())
                    })?;
                save_settings(&path, &settings)?;
                println!("Added text block {}", id);
            }
            BlocksAction::Remove { id } => {
                if !settings.remove_text_block(*id) {
                    return Err(AppError::Settings(format!("No text block with id {}", id)));
                }
                save_settings(&path, &settings)?;
                println!("Removed text block {}", id);
            }
        }

        Ok(())
    }
}
