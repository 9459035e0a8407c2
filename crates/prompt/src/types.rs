//! Prompt types for naix.
//!
//! This module defines the request the host hands over before it combines
//! prompts, and the values produced while assembling the story string.

use serde::{Deserialize, Serialize};

/// One chat message as the host is about to send it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Message body, usually prefixed with the speaker's name
    #[serde(default)]
    pub message: String,

    /// Extension text injected in front of this message
    #[serde(rename = "extensionPrompts", default)]
    pub extension_prompts: Vec<String>,
}

impl ChatTurn {
    /// Create a turn with no injected extension text.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            extension_prompts: Vec::new(),
        }
    }

    /// Prepend injected extension text.
    pub fn with_extension_prompts(mut self, prompts: Vec<String>) -> Self {
        self.extension_prompts = prompts;
        self
    }
}

/// Payload of the host's before-combine-prompts notification.
///
/// Every field defaults to empty so partial payloads deserialize.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CombineRequest {
    /// Chat turns in send order
    pub final_mes_send: Vec<ChatTurn>,

    /// Example dialogue
    pub mes_exm_string: String,

    pub description: String,
    pub personality: String,
    pub persona: String,
    pub scenario: String,

    /// World info placed before the character description
    pub world_info_before: String,

    /// World info placed after the character description
    pub world_info_after: String,

    /// Extension text anchored before the scenario
    pub before_scenario_anchor: String,

    /// Extension text anchored after the scenario
    pub after_scenario_anchor: String,

    /// Backend-specific preamble
    pub nai_preamble: String,

    /// Main system prompt
    pub main: String,

    pub jailbreak: String,

    /// User display name
    pub user: String,

    /// Character display name
    #[serde(rename = "char")]
    pub character: String,

    /// Model-specific cache string, always appended after the story string
    pub generated_prompt_cache: String,

    /// Output: the assembled prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_prompt: Option<String>,
}

/// Chat history and example dialogue after the formatting policy ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedChat {
    pub chat: String,
    pub examples: String,
}

/// A fully expanded story string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltStory {
    /// The trimmed prompt text
    pub prompt: String,

    /// Metadata about the expansion
    pub metadata: BuiltStoryMetadata,
}

/// Metadata about a built story string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltStoryMetadata {
    /// Turns that went into the chat fragment
    #[serde(rename = "turnsUsed")]
    pub turns_used: usize,

    /// Turns dropped from the front of the history
    #[serde(rename = "turnsPruned")]
    pub turns_pruned: usize,

    /// Text blocks applied to the fragment mapping
    #[serde(rename = "textBlocksApplied")]
    pub text_blocks_applied: usize,

    /// Fixed fields overridden by a text block of the same label
    #[serde(rename = "shadowedFields", default, skip_serializing_if = "Vec::is_empty")]
    pub shadowed_fields: Vec<String>,
}
