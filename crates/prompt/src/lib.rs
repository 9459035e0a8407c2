//! Story-string prompt assembly for naix.
//!
//! This crate turns a before-combine-prompts request into one NovelAI
//! prompt:
//! - Directive helpers for story-string markup
//! - Chat normalization (pruning, name stripping, separator removal)
//! - Fragment collection, including user text blocks
//! - Handlebars-based story-string expansion
//! - YAML settings store and host event dispatch

pub mod builder;
pub mod events;
pub mod fragments;
pub mod helpers;
pub mod loader;
pub mod normalizer;
pub mod settings;
pub mod template;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use builder::{build_story, combine_prompt, BackendGate};
pub use events::{
    check_advanced_formatting, handle_event, EventOutcome, FormattingWarning, HostEvent,
};
pub use fragments::{collect_fragments, Collected, FixedField, Fragments};
pub use helpers::{Directive, Invocation, Value};
pub use loader::{load_settings, save_settings};
pub use normalizer::normalize_chat;
pub use settings::{ExtensionSettings, FormattingPolicy, TextBlock, DEFAULT_STORY_STRING};
pub use template::{expand_story, StoryTemplate, CACHE_SUFFIX};
pub use types::{BuiltStory, BuiltStoryMetadata, ChatTurn, CombineRequest, NormalizedChat};
