//! End-to-end tests for story-string assembly.

use crate::events::{handle_event, FormattingWarning, HostEvent};
use crate::loader::{load_settings, save_settings};
use crate::settings::ExtensionSettings;
use crate::types::CombineRequest;
use naix_core::{AppError, HostFormatting};
use tempfile::TempDir;

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper to build a request the way the host serializes it.
    fn host_request() -> CombineRequest {
        let json = r#"{
            "finalMesSend": [
                { "message": "User: where are we?\n", "extensionPrompts": ["[ Mood: tense ]\n"] },
                { "message": "Bob: the old mine.\n" },
                { "message": "User: lead the way\n" },
                { "message": "Bob:" }
            ],
            "mesExmString": "***\nBob: Stay close.",
            "description": "Bob is a miner.",
            "persona": "User is a surveyor.",
            "scenario": "A collapsed tunnel.",
            "naiPreamble": "[ Style: chat ]",
            "main": "Write Bob's next reply.",
            "user": "User",
            "char": "Bob",
            "generatedPromptCache": ""
        }"#;
        serde_json::from_str(json).unwrap()
    }

    fn assemble(request: &mut CombineRequest, settings: &ExtensionSettings) {
        handle_event(
            HostEvent::BeforeCombinePrompts(request),
            settings,
            &HostFormatting::default(),
            &true,
        )
        .unwrap();
    }

    #[test]
    fn test_default_story_string_end_to_end() {
        let mut request = host_request();
        assemble(&mut request, &ExtensionSettings::default());

        let prompt = request.combined_prompt.unwrap();
        assert_eq!(
            prompt,
            "Bob is a miner.\n\nUser is a surveyor.\n\n***\nBob: Stay close.\n\nA collapsed tunnel.\n\n⁂\n[ Style: chat ]\n{ Write Bob's next reply. }\n[ Mood: tense ]\nUser: where are we?\nBob: the old mine.\nUser: lead the way\nBob:"
        );
    }

    #[test]
    fn test_policy_and_text_blocks_end_to_end() {
        let mut settings = ExtensionSettings {
            remove_char_and_user: true,
            remove_example_chat_separators: true,
            prune_chat_by: 1,
            story_string: "{{#trim}}{{lore}}\n\n\n\n{{examples}}   {{ns}}{{/trim}}\n{{chat}}".to_string(),
            ..Default::default()
        };
        settings.add_text_block("lore", "The mine flooded in 1902.").unwrap();

        let mut request = host_request();
        assemble(&mut request, &settings);

        let prompt = request.combined_prompt.unwrap();
        assert_eq!(
            prompt,
            "The mine flooded in 1902.\nBob: Stay close. ***\n the old mine.\n lead the way"
        );
        assert!(!prompt.lines().any(|l| l.starts_with("User:")));
    }

    #[test]
    fn test_reset_then_expand_empty_request() {
        let mut settings = ExtensionSettings {
            story_string: "{{chat}}".to_string(),
            ..Default::default()
        };
        settings.reset_story_string();

        let mut request = CombineRequest::default();
        assemble(&mut request, &settings);
        assert_eq!(request.combined_prompt.as_deref(), Some("⁂"));
    }

    #[test]
    fn test_over_pruning_is_not_an_error() {
        let settings = ExtensionSettings {
            prune_chat_by: 10,
            story_string: "[{{chat}}]".to_string(),
            ..Default::default()
        };
        let mut request = host_request();
        assemble(&mut request, &settings);
        assert_eq!(request.combined_prompt.as_deref(), Some("[]"));
    }

    #[test]
    fn test_template_errors_leave_request_untouched() {
        for story_string in ["{{shout chat}}", "{{instruct main", "{{#trim}}{{chat}}"] {
            let settings = ExtensionSettings {
                story_string: story_string.to_string(),
                ..Default::default()
            };
            let mut request = host_request();
            request.combined_prompt = Some("host prompt".to_string());

            let result = handle_event(
                HostEvent::BeforeCombinePrompts(&mut request),
                &settings,
                &HostFormatting::default(),
                &true,
            );

            assert!(matches!(result, Err(AppError::Template(_))), "{}", story_string);
            assert_eq!(request.combined_prompt.as_deref(), Some("host prompt"));
        }
    }

    #[test]
    fn test_other_backend_leaves_request_untouched() {
        let mut request = host_request();
        let before = request.clone();
        let formatting = HostFormatting {
            context_preset: "Default".to_string(),
            instruct_enabled: true,
        };

        let outcome = handle_event(
            HostEvent::BeforeCombinePrompts(&mut request),
            &ExtensionSettings::default(),
            &formatting,
            &false,
        )
        .unwrap();

        assert_eq!(outcome.combined, None);
        assert_eq!(outcome.warning, None);
        assert_eq!(request, before);
    }

    #[test]
    fn test_warning_reported_alongside_prompt() {
        let mut request = host_request();
        let formatting = HostFormatting {
            context_preset: "NovelAI".to_string(),
            instruct_enabled: true,
        };

        let outcome = handle_event(
            HostEvent::BeforeCombinePrompts(&mut request),
            &ExtensionSettings::default(),
            &formatting,
            &true,
        )
        .unwrap();

        assert_eq!(outcome.warning, Some(FormattingWarning));
        assert!(request.combined_prompt.is_some());
    }

    #[test]
    fn test_settings_file_drives_assembly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".naix/settings.yaml");

        let mut settings = load_settings(&path).unwrap();
        settings.story_string = "{{b \"x\" char \"miner\"}}\n{{chat}}".to_string();
        settings.remove_last_mention_of_char = true;
        save_settings(&path, &settings).unwrap();

        let reloaded = load_settings(&path).unwrap();
        let mut request = host_request();
        assemble(&mut request, &reloaded);

        assert_eq!(
            request.combined_prompt.as_deref(),
            Some("[ Bob: miner ]\n[ Mood: tense ]\nUser: where are we?\nBob: the old mine.\nUser: lead the way")
        );
    }
}
