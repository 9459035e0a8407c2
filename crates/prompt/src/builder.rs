//! Story-string assembly.
//!
//! Runs the whole pipeline for one before-combine-prompts request:
//! normalize the chat, collect fragments, expand the story string.

use naix_core::AppResult;

use crate::fragments::collect_fragments;
use crate::normalizer::normalize_chat;
use crate::settings::ExtensionSettings;
use crate::template::StoryTemplate;
use crate::types::{BuiltStory, BuiltStoryMetadata, CombineRequest};

/// Answers whether the backend the story string targets is selected.
pub trait BackendGate {
    fn is_target_backend(&self) -> bool;
}

impl BackendGate for bool {
    fn is_target_backend(&self) -> bool {
        *self
    }
}

impl BackendGate for naix_core::AppConfig {
    fn is_target_backend(&self) -> bool {
        self.is_target_api()
    }
}

/// Build the story string for a request without touching the request.
///
/// # Example
/// ```
/// use naix_prompt::{build_story, ChatTurn, CombineRequest, ExtensionSettings};
///
/// let request = CombineRequest {
///     final_mes_send: vec![ChatTurn::new("Bob: hello")],
///     main: "Stay in character.".to_string(),
///     ..Default::default()
/// };
/// let built = build_story(&request, &ExtensionSettings::default()).unwrap();
/// assert_eq!(built.prompt, "⁂\n\n{ Stay in character. }\nBob: hello");
/// ```
pub fn build_story(request: &CombineRequest, settings: &ExtensionSettings) -> AppResult<BuiltStory> {
    let policy = settings.policy();
    let total_turns = request.final_mes_send.len();

    let template = StoryTemplate::parse(&settings.story_string)?;

    let normalized = normalize_chat(
        &request.final_mes_send,
        &request.mes_exm_string,
        &request.user,
        &request.character,
        &policy,
    )?;

    let collected = collect_fragments(request, &normalized, &settings.text_blocks);
    let prompt = template.render(&collected.fragments)?;

    let turns_pruned = policy.prune_chat_by.min(total_turns);
    let metadata = BuiltStoryMetadata {
        turns_used: total_turns - turns_pruned,
        turns_pruned,
        text_blocks_applied: settings.text_blocks.len(),
        shadowed_fields: collected.shadowed,
    };

    tracing::debug!(
        "Built story string: {} bytes, {} turns used, {} pruned",
        prompt.len(),
        metadata.turns_used,
        metadata.turns_pruned
    );

    Ok(BuiltStory { prompt, metadata })
}

/// Populate `request.combined_prompt` with the expanded story string.
///
/// Returns `Ok(None)` and leaves the request untouched when the target
/// backend is not selected. On error the request is left untouched too.
pub fn combine_prompt(
    request: &mut CombineRequest,
    settings: &ExtensionSettings,
    gate: &dyn BackendGate,
) -> AppResult<Option<BuiltStoryMetadata>> {
    if !gate.is_target_backend() {
        tracing::debug!("Target backend not selected, skipping story string");
        return Ok(None);
    }

    let built = build_story(request, settings)?;
    request.combined_prompt = Some(built.prompt);

    Ok(Some(built.metadata))
}
