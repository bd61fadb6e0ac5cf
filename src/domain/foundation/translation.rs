//! Translated texts keyed by language tag.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Text in several languages, e.g. `{"en": "High risk", "de": "Hohes Risiko"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatedText(BTreeMap<String, String>);

impl TranslatedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-language text.
    pub fn of(lang: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(lang.into(), text.into());
        Self(map)
    }

    pub fn with(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(lang.into(), text.into());
        self
    }

    /// Text in `lang`, or any available translation.
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0
            .get(lang)
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_falls_back_to_any_language() {
        let text = TranslatedText::of("de", "Hallo");
        assert_eq!(text.get("en"), Some("Hallo"));
        assert_eq!(TranslatedText::new().get("en"), None);
    }

    #[test]
    fn get_prefers_requested_language() {
        let text = TranslatedText::of("de", "Hallo").with("en", "Hello");
        assert_eq!(text.get("en"), Some("Hello"));
    }
}
