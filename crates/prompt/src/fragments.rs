//! Fragment collection.
//!
//! Builds the name → value mapping the story string is expanded against.
//! Every fixed field is always present; text blocks are applied afterwards
//! and win over a fixed field with the same label.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::settings::TextBlock;
use crate::types::{CombineRequest, NormalizedChat};

/// Built-in fragment names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixedField {
    Description,
    Personality,
    Persona,
    Scenario,
    Chat,
    Examples,
    Preamble,
    Jailbreak,
    User,
    Char,
    GeneratedPromptCache,
    WiBefore,
    WiAfter,
    ScenarioBefore,
    ScenarioAfter,
    Main,
}

impl FixedField {
    pub const ALL: [FixedField; 16] = [
        FixedField::Description,
        FixedField::Personality,
        FixedField::Persona,
        FixedField::Scenario,
        FixedField::Chat,
        FixedField::Examples,
        FixedField::Preamble,
        FixedField::Jailbreak,
        FixedField::User,
        FixedField::Char,
        FixedField::GeneratedPromptCache,
        FixedField::WiBefore,
        FixedField::WiAfter,
        FixedField::ScenarioBefore,
        FixedField::ScenarioAfter,
        FixedField::Main,
    ];

    /// Key used in the story string.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Description => "description",
            Self::Personality => "personality",
            Self::Persona => "persona",
            Self::Scenario => "scenario",
            Self::Chat => "chat",
            Self::Examples => "examples",
            Self::Preamble => "preamble",
            Self::Jailbreak => "jailbreak",
            Self::User => "user",
            Self::Char => "char",
            Self::GeneratedPromptCache => "generatedPromptCache",
            Self::WiBefore => "wiBefore",
            Self::WiAfter => "wiAfter",
            Self::ScenarioBefore => "scenarioBefore",
            Self::ScenarioAfter => "scenarioAfter",
            Self::Main => "main",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// The request field (or normalized value) that feeds this fragment.
    fn value<'a>(&self, request: &'a CombineRequest, normalized: &'a NormalizedChat) -> &'a str {
        match self {
            Self::Description => &request.description,
            Self::Personality => &request.personality,
            Self::Persona => &request.persona,
            Self::Scenario => &request.scenario,
            Self::Chat => &normalized.chat,
            Self::Examples => &normalized.examples,
            Self::Preamble => &request.nai_preamble,
            Self::Jailbreak => &request.jailbreak,
            Self::User => &request.user,
            Self::Char => &request.character,
            Self::GeneratedPromptCache => &request.generated_prompt_cache,
            Self::WiBefore => &request.world_info_before,
            Self::WiAfter => &request.world_info_after,
            Self::ScenarioBefore => &request.before_scenario_anchor,
            Self::ScenarioAfter => &request.after_scenario_anchor,
            Self::Main => &request.main,
        }
    }
}

/// The fragment mapping handed to the template engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Fragments {
    values: BTreeMap<String, String>,
}

impl Fragments {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of collecting fragments for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Collected {
    pub fragments: Fragments,

    /// Fixed fields a text block overrode, in block order
    pub shadowed: Vec<String>,
}

/// Assemble the fragment mapping.
///
/// No transformation happens here; the normalizer already produced the chat
/// and examples values.
pub fn collect_fragments(
    request: &CombineRequest,
    normalized: &NormalizedChat,
    blocks: &[TextBlock],
) -> Collected {
    let mut fragments = Fragments::default();

    for field in FixedField::ALL {
        fragments.insert(field.key(), field.value(request, normalized));
    }

    let mut shadowed = Vec::new();
    for block in blocks {
        if FixedField::from_key(&block.label).is_some() && !shadowed.contains(&block.label) {
            tracing::warn!(
                "Text block '{}' overrides the built-in fragment of the same name",
                block.label
            );
            shadowed.push(block.label.clone());
        }
        fragments.insert(block.label.clone(), block.content.clone());
    }

    tracing::debug!(
        "Collected {} fragments ({} from text blocks)",
        fragments.len(),
        blocks.len()
    );

    Collected {
        fragments,
        shadowed,
    }
}
