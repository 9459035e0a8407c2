//! Policy command handler.
//!
//! Shows and edits the chat formatting flags.

use clap::{Args, Subcommand};
use naix_core::{config::AppConfig, AppResult};
use naix_prompt::{load_settings, save_settings, ExtensionSettings};

/// Show or edit the chat formatting flags
#[derive(Args, Debug)]
pub struct PolicyCommand {
    #[command(subcommand)]
    pub action: PolicyAction,
}

#[derive(Subcommand, Debug)]
pub enum PolicyAction {
    /// Print the formatting flags
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more formatting flags
    Set(PolicySetCommand),
}

/// Change formatting flags; omitted flags keep their value
#[derive(Args, Debug)]
pub struct PolicySetCommand {
    /// Strip a trailing "<char>:" from the chat
    #[arg(long)]
    pub remove_last_mention_of_char: Option<bool>,

    /// Remove "***" separators from example dialogue
    #[arg(long)]
    pub remove_example_chat_separators: Option<bool>,

    /// Strip "<user>:" and "<char>:" line prefixes from the chat
    #[arg(long)]
    pub remove_char_and_user: Option<bool>,

    /// Drop this many of the oldest chat turns
    #[arg(long)]
    pub prune_chat_by: Option<usize>,
}

impl PolicyCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing policy command");

        let path = config.settings_path();
        let mut settings = load_settings(&path)?;

        match &self.action {
            PolicyAction::Show { json } => print_policy(&settings, *json)?,
            PolicyAction::Set(cmd) => {
                cmd.apply(&mut settings);
                save_settings(&path, &settings)?;
                print_policy(&settings, false)?;
            }
        }

        Ok(())
    }
}

impl PolicySetCommand {
    fn apply(&self, settings: &mut ExtensionSettings) {
        if let Some(value) = self.remove_last_mention_of_char {
            settings.remove_last_mention_of_char = value;
        }
        if let Some(value) = self.remove_example_chat_separators {
            settings.remove_example_chat_separators = value;
        }
        if let Some(value) = self.remove_char_and_user {
            settings.remove_char_and_user = value;
        }
        if let Some(value) = self.prune_chat_by {
            settings.prune_chat_by = value;
        }
        tracing::debug!("Updated policy: {:?}", settings.policy());
    }
}

fn print_policy(settings: &ExtensionSettings, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::json!({
            "removeLastMentionOfChar": settings.remove_last_mention_of_char,
            "removeExampleChatSeparators": settings.remove_example_chat_separators,
            "removeCharAndUser": settings.remove_char_and_user,
            "pruneChatBy": settings.prune_chat_by,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("removeLastMentionOfChar:     {}", settings.remove_last_mention_of_char);
        println!("removeExampleChatSeparators: {}", settings.remove_example_chat_separators);
        println!("removeCharAndUser:           {}", settings.remove_char_and_user);
        println!("pruneChatBy:                 {}", settings.prune_chat_by);
    }
    Ok(())
}
