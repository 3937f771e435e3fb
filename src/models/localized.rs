use std::collections::BTreeMap;

use serde::Deserialize;

/// Language code -> text, e.g. `{"en": "Old Town", "fr": "Vieille ville"}`.
pub type Localized = BTreeMap<String, String>;

/// Request input for a localized field: either a plain string (stored under
/// the tour's primary language) or a full map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocalizedInput {
    Text(String),
    Map(Localized),
}

impl LocalizedInput {
    pub fn into_localized(self, language: &str) -> Localized {
        match self {
            LocalizedInput::Text(text) => {
                let mut map = Localized::new();
                map.insert(language.to_string(), text);
                map
            }
            LocalizedInput::Map(map) => map,
        }
    }
}

/// Append `suffix` to every non-empty translation.
pub fn with_suffix(value: &Localized, suffix: &str) -> Localized {
    value
        .iter()
        .map(|(lang, text)| {
            let text = if text.is_empty() { text.clone() } else { format!("{text}{suffix}") };
            (lang.clone(), text)
        })
        .collect()
}
