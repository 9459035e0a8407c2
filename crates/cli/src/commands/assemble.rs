//! Assemble command handler.
//!
//! Feeds a before-combine-prompts request through the story-string pipeline.

use clap::Args;
use naix_core::{config::AppConfig, AppError, AppResult};
use naix_prompt::{handle_event, load_settings, CombineRequest, HostEvent};
use std::io::Read;
use std::path::PathBuf;

/// Assemble the prompt for a request
#[derive(Args, Debug)]
pub struct AssembleCommand {
    /// Request JSON file, or `-` for stdin
    pub request: PathBuf,

    /// Print the updated request as JSON instead of the prompt
    #[arg(long)]
    pub json: bool,

    /// Print assembly metadata to stderr
    #[arg(long)]
    pub stats: bool,
}

impl AssembleCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing assemble command");

        let mut request = self.read_request()?;
        let settings = load_settings(&config.settings_path())?;

        let outcome = handle_event(
            HostEvent::BeforeCombinePrompts(&mut request),
            &settings,
            &config.formatting,
            config,
        )?;

        if let Some(warning) = outcome.warning {
            eprintln!("Warning: {}", warning);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&request)?);
            return Ok(());
        }

        match (outcome.combined, request.combined_prompt) {
            (Some(metadata), Some(prompt)) => {
                println!("{}", prompt);
                if self.stats {
                    eprintln!("{}", serde_json::to_string_pretty(&metadata)?);
                }
            }
            _ => eprintln!(
                "API '{}' is not the story-string target; request left untouched",
                config.main_api
            ),
        }

        Ok(())
    }

    fn read_request(&self) -> AppResult<CombineRequest> {
        let contents = if self.request.as_os_str() == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            std::fs::read_to_string(&self.request).map_err(|e| {
                AppError::Other(format!("Failed to read request {:?}: {}", self.request, e))
            })?
        };

        let request: CombineRequest = serde_json::from_str(&contents)?;
        tracing::debug!("Request has {} chat turns", request.final_mes_send.len());
        Ok(request)
    }
}
