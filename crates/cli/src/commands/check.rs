//! Check command handler.
//!
//! Runs the advanced-formatting check the host triggers on a message swipe.

use clap::Args;
use naix_core::{config::AppConfig, AppResult};
use naix_prompt::{handle_event, load_settings, HostEvent};

/// Check the host's advanced-formatting state
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CheckCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing check command");

        let settings = load_settings(&config.settings_path())?;
        let outcome = handle_event(HostEvent::MessageSwiped, &settings, &config.formatting, config)?;

        if self.json {
            let output = serde_json::json!({
                "api": config.main_api,
                "contextPreset": config.formatting.context_preset,
                "instructEnabled": config.formatting.instruct_enabled,
                "warning": outcome.warning.map(|w| w.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            match outcome.warning {
                Some(warning) => println!("{}", warning),
                None if !config.is_target_api() => println!(
                    "API '{}' is not the story-string target; check skipped",
                    config.main_api
                ),
                None => println!("Advanced formatting OK"),
            }
        }

        Ok(())
    }
}
