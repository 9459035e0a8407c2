//! Host event dispatch.
//!
//! The host notifies the extension before it combines prompts and after a
//! message is swiped. Both run the advanced-formatting check; only the first
//! assembles a story string.

use naix_core::config::DEFAULT_CONTEXT_PRESET;
use naix_core::{AppResult, HostFormatting};
use std::fmt;

use crate::builder::{combine_prompt, BackendGate};
use crate::settings::ExtensionSettings;
use crate::types::{BuiltStoryMetadata, CombineRequest};

/// Notification received from the host.
#[derive(Debug)]
pub enum HostEvent<'a> {
    /// Prompts are about to be combined; the request's `combined_prompt`
    /// may be replaced.
    BeforeCombinePrompts(&'a mut CombineRequest),

    /// The user swiped to another reply.
    MessageSwiped,
}

impl HostEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeCombinePrompts(_) => "before_combine_prompts",
            Self::MessageSwiped => "message_swiped",
        }
    }
}

/// Host advanced-formatting state is incompatible with the story string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormattingWarning;

impl FormattingWarning {
    pub const MESSAGE: &'static str = "NovelAI template not set. To prevent unwanted formatting go to Advanced Formatting, then select the NovelAI template and disable instruct mode.";
}

impl fmt::Display for FormattingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Self::MESSAGE)
    }
}

/// What handling one event produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventOutcome {
    /// Set when a story string was written into the request
    pub combined: Option<BuiltStoryMetadata>,

    pub warning: Option<FormattingWarning>,
}

/// Check the host's advanced-formatting state.
///
/// Never evaluated for other backends.
pub fn check_advanced_formatting(
    formatting: &HostFormatting,
    gate: &dyn BackendGate,
) -> Option<FormattingWarning> {
    if !gate.is_target_backend() {
        return None;
    }

    if formatting.context_preset != DEFAULT_CONTEXT_PRESET || formatting.instruct_enabled {
        tracing::warn!(
            "Context preset '{}' (instruct {}): {}",
            formatting.context_preset,
            formatting.instruct_enabled,
            FormattingWarning::MESSAGE
        );
        return Some(FormattingWarning);
    }

    None
}

/// Handle one host notification.
///
/// The formatting check runs first so its warning is reported even when
/// assembly fails.
pub fn handle_event(
    event: HostEvent<'_>,
    settings: &ExtensionSettings,
    formatting: &HostFormatting,
    gate: &dyn BackendGate,
) -> AppResult<EventOutcome> {
    tracing::debug!("Handling host event: {}", event.name());

    let warning = check_advanced_formatting(formatting, gate);

    let combined = match event {
        HostEvent::BeforeCombinePrompts(request) => combine_prompt(request, settings, gate)?,
        HostEvent::MessageSwiped => None,
    };

    Ok(EventOutcome { combined, warning })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatting(preset: &str, instruct: bool) -> HostFormatting {
        HostFormatting {
            context_preset: preset.to_string(),
            instruct_enabled: instruct,
        }
    }

    #[test]
    fn test_matching_formatting_has_no_warning() {
        assert_eq!(check_advanced_formatting(&formatting("NovelAI", false), &true), None);
    }

    #[test]
    fn test_wrong_preset_or_instruct_warns() {
        assert_eq!(
            check_advanced_formatting(&formatting("Default", false), &true),
            Some(FormattingWarning)
        );
        assert_eq!(
            check_advanced_formatting(&formatting("NovelAI", true), &true),
            Some(FormattingWarning)
        );
    }

    #[test]
    fn test_other_backend_never_warns() {
        assert_eq!(check_advanced_formatting(&formatting("Default", true), &false), None);
    }

    #[test]
    fn test_warning_text() {
        assert!(FormattingWarning.to_string().starts_with("NovelAI template not set."));
    }

    #[test]
    fn test_message_swiped_only_checks() {
        let outcome = handle_event(
            HostEvent::MessageSwiped,
            &ExtensionSettings::default(),
            &formatting("Default", false),
            &true,
        )
        .unwrap();
        assert_eq!(outcome.combined, None);
        assert_eq!(outcome.warning, Some(FormattingWarning));
    }

    #[test]
    fn test_before_combine_assembles() {
        let mut request = CombineRequest {
            main: "Be terse.".to_string(),
            ..Default::default()
        };
        let settings = ExtensionSettings {
            story_string: "{{in main}}".to_string(),
            ..Default::default()
        };

        let outcome = handle_event(
            HostEvent::BeforeCombinePrompts(&mut request),
            &settings,
            &HostFormatting::default(),
            &true,
        )
        .unwrap();

        assert!(outcome.combined.is_some());
        assert_eq!(outcome.warning, None);
        assert_eq!(request.combined_prompt.as_deref(), Some("{ Be terse. }"));
    }
}
