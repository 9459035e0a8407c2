//! Template command handler.
//!
//! Shows, replaces, resets and validates the stored story string.

use clap::{Args, Subcommand};
use naix_core::{config::AppConfig, AppError, AppResult};
use naix_prompt::{load_settings, save_settings, StoryTemplate};
use std::path::PathBuf;

/// Show, edit or validate the story string
#[derive(Args, Debug)]
pub struct TemplateCommand {
    #[command(subcommand)]
    pub action: TemplateAction,
}

#[derive(Subcommand, Debug)]
pub enum TemplateAction {
    /// Print the stored story string
    Show,
    /// Restore the default story string
    Reset,
    /// Replace the story string
    Set(TemplateSetCommand),
    /// Parse the stored story string and list its directives
    Validate,
}

/// Replace the story string
#[derive(Args, Debug)]
pub struct TemplateSetCommand {
    /// New story string
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub text: Option<String>,

    /// Read the story string from a file
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl TemplateCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing template command");

        let path = config.settings_path();
        let mut settings = load_settings(&path)?;

        match &self.action {
            TemplateAction::Show => {
                println!("{}", settings.story_string);
            }
            TemplateAction::Reset => {
                settings.reset_story_string();
                save_settings(&path, &settings)?;
                println!("Story string reset to default");
            }
            TemplateAction::Set(cmd) => {
                let story_string = cmd.story_string()?;
                // broken story strings never reach the store
                StoryTemplate::parse(&story_string)?;
                settings.story_string = story_string;
                save_settings(&path, &settings)?;
                println!("Story string updated");
            }
            TemplateAction::Validate => {
                let template = StoryTemplate::parse(&settings.story_string)?;
                let mut names: Vec<&str> = template.directives().iter().map(|d| d.name()).collect();
                names.sort_unstable();
                names.dedup();
                if names.is_empty() {
                    println!("Story string is valid (no directives)");
                } else {
                    println!("Story string is valid (directives: {})", names.join(", "));
                }
            }
        }

        Ok(())
    }
}

impl TemplateSetCommand {
    fn story_string(&self) -> AppResult<String> {
        match (&self.text, &self.file) {
            (_, Some(file)) => std::fs::read_to_string(file).map_err(|e| {
                AppError::Other(format!("Failed to read story string {:?}: {}", file, e))
            }),
            (Some(text), None) => Ok(text.clone()),
            (None, None) => Err(AppError::Other(
                "Provide the story string or --file".to_string(),
            )),
        }
    }
}
