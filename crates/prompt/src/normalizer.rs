//! Chat normalization.
//!
//! Turns the host's chat turns and example dialogue into the `chat` and
//! `examples` fragments according to the user's [`FormattingPolicy`].

use naix_core::{AppError, AppResult};
use regex::Regex;

use crate::helpers::SCENE_BREAK;
use crate::settings::FormattingPolicy;
use crate::types::{ChatTurn, NormalizedChat};

/// Normalize chat history and example dialogue.
///
/// The turns are borrowed and never modified. Pruning drops turns from the
/// front of the history and clamps to its length. Name stripping takes
/// precedence over last-mention removal; the two never both apply.
pub fn normalize_chat(
    turns: &[ChatTurn],
    examples: &str,
    user: &str,
    character: &str,
    policy: &FormattingPolicy,
) -> AppResult<NormalizedChat> {
    let pruned = policy.prune_chat_by.min(turns.len());
    if policy.prune_chat_by > turns.len() {
        tracing::debug!(
            "Prune count {} exceeds {} turns, chat will be empty",
            policy.prune_chat_by,
            turns.len()
        );
    }

    let mut chat = concat_turns(&turns[pruned..]);

    if policy.remove_char_and_user {
        chat = remove_names(&chat, user, character)?;
    } else if policy.remove_last_mention_of_char {
        chat = remove_trailing_mention(&chat, character);
    }

    let examples = if policy.remove_example_chat_separators {
        examples.replace(SCENE_BREAK, "")
    } else {
        examples.to_string()
    };

    Ok(NormalizedChat { chat, examples })
}

/// Join turns, each preceded by its extension prompts, and trim the result.
pub fn concat_turns(turns: &[ChatTurn]) -> String {
    let mut chat = String::new();
    for turn in turns {
        for prompt in &turn.extension_prompts {
            chat.push_str(prompt);
        }
        chat.push_str(&turn.message);
    }
    chat.trim().to_string()
}

/// Strip `<user>:` and `<character>:` speaker prefixes at the start of any line.
///
/// Names match literally and case-sensitively. Empty names are skipped.
pub fn remove_names(chat: &str, user: &str, character: &str) -> AppResult<String> {
    let names: Vec<String> = [user, character]
        .into_iter()
        .filter(|name| !name.is_empty())
        .map(regex::escape)
        .collect();

    if names.is_empty() {
        return Ok(chat.to_string());
    }

    let pattern = format!("(?m)^(?:{}):", names.join("|"));
    let prefix = Regex::new(&pattern)
        .map_err(|e| AppError::Prompt(format!("Failed to build name pattern: {}", e)))?;

    Ok(prefix.replace_all(chat, "").into_owned())
}

/// Remove `<character>:` when, and only when, the chat ends with it.
pub fn remove_trailing_mention(chat: &str, character: &str) -> String {
    let mention = format!("{}:", character);
    chat.strip_suffix(mention.as_str()).unwrap_or(chat).to_string()
}
