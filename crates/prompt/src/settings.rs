//! User formatting settings.
//!
//! [`ExtensionSettings`] is the configuration value the assembler reads on
//! every invocation. It is owned by the caller (and persisted by
//! [`crate::loader`]); nothing here holds on to it between calls.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fragments::FixedField;

/// Story string installed on first run and by [`ExtensionSettings::reset_story_string`].
pub const DEFAULT_STORY_STRING: &str = "{{wiBefore}}
{{description}}
{{personality}}
{{persona}}
{{wiAfter}}
{{examples}}
{{scenarioBefore}}
{{scenario}}
{{scenarioAfter}}
⁂
{{preamble}}
{{instruct main}}
{{chat}}";

/// A user-authored fragment exposed to the story string under its label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Stable identifier, used only for removal
    #[serde(alias = "uuid")]
    pub id: Uuid,

    /// Fragment name the block is exposed under
    pub label: String,

    /// Literal content
    pub content: String,
}

/// Chat formatting flags consumed by the normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormattingPolicy {
    pub remove_last_mention_of_char: bool,
    pub remove_example_chat_separators: bool,
    pub remove_char_and_user: bool,
    pub prune_chat_by: usize,
}

/// Persisted formatting settings.
///
/// Keys missing from a stored document are backfilled from [`Default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionSettings {
    pub remove_last_mention_of_char: bool,
    pub remove_example_chat_separators: bool,
    pub remove_char_and_user: bool,
    pub prune_chat_by: usize,
    pub text_blocks: Vec<TextBlock>,
    pub story_string: String,
}

impl Default for ExtensionSettings {
    fn default() -> Self {
        Self {
            remove_last_mention_of_char: false,
            remove_example_chat_separators: false,
            remove_char_and_user: false,
            prune_chat_by: 0,
            text_blocks: Vec::new(),
            story_string: DEFAULT_STORY_STRING.to_string(),
        }
    }
}

impl ExtensionSettings {
    /// The chat formatting flags.
    pub fn policy(&self) -> FormattingPolicy {
        FormattingPolicy {
            remove_last_mention_of_char: self.remove_last_mention_of_char,
            remove_example_chat_separators: self.remove_example_chat_separators,
            remove_char_and_user: self.remove_char_and_user,
            prune_chat_by: self.prune_chat_by,
        }
    }

    /// Restore the default story string.
    pub fn reset_story_string(&mut self) {
        self.story_string = DEFAULT_STORY_STRING.to_string();
    }

    /// Append a text block and return its identifier.
    ///
    /// Returns `None` without touching the list when either the label or
    /// the content is empty. A label that names a fixed field is accepted
    /// (the block will shadow that field) but logged.
    pub fn add_text_block(
        &mut self,
        label: impl Into<String>,
        content: impl Into<String>,
    ) -> Option<Uuid> {
        let label = label.into();
        let content = content.into();

        if label.is_empty() || content.is_empty() {
            tracing::warn!("Ignoring text block with empty label or content");
            return None;
        }

        if FixedField::from_key(&label).is_some() {
            tracing::warn!(
                "Text block '{}' shadows the built-in field of the same name",
                label
            );
        }

        let id = Uuid::new_v4();
        self.text_blocks.push(TextBlock { id, label, content });
        tracing::debug!("Added text block {}", id);
        Some(id)
    }

    /// Remove the text block with the given identifier.
    ///
    /// Returns whether a block was removed.
    pub fn remove_text_block(&mut self, id: Uuid) -> bool {
        let before = self.text_blocks.len();
        self.text_blocks.retain(|block| block.id != id);
        let removed = self.text_blocks.len() != before;
        if removed {
            tracing::debug!("Removed text block {}", id);
        }
        removed
    }
}
