//! Localization of column labels and report chrome for a language tag.
//!
//! Column labels come from the profile: exact tag, then primary subtag, then
//! the column's default label. Chrome text (result counts, the fallback
//! select-all label, placeholders) comes from a compile-time phrasebook in English and
//! French; any other language falls back to the profile's default language,
//! then to English.

use phf::phf_map;

use crate::profile::ColumnDefinition;
use crate::types::LanguageTag;

/// One chrome phrase in every built-in language.
#[derive(Debug, Clone, Copy)]
pub struct Phrase {
    pub en: &'static str,
    pub fr: &'static str,
}

impl Phrase {
    fn get(&self, primary: &str) -> Option<&'static str> {
        match primary {
            "en" => Some(self.en),
            "fr" => Some(self.fr),
            _ => None,
        }
    }
}

static PHRASES: phf::Map<&'static str, Phrase> = phf_map! {
    "result.one" => Phrase { en: "result", fr: "résultat" },
    "result.other" => Phrase { en: "results", fr: "résultats" },
    "select_all" => Phrase { en: "Select all", fr: "Tout sélectionner" },
    "unresolved_reference" => Phrase { en: "(unresolved reference)", fr: "(référence introuvable)" },
    "yes" => Phrase { en: "Yes", fr: "Oui" },
    "no" => Phrase { en: "No", fr: "Non" },
    "truncated" => Phrase { en: "only the first {count} are shown", fr: "seuls les {count} premiers sont affichés" },
};

/// Chrome phrase keys.
pub mod keys {
    pub const RESULT_ONE: &str = "result.one";
    pub const RESULT_OTHER: &str = "result.other";
    pub const SELECT_ALL: &str = "select_all";
    pub const UNRESOLVED_REFERENCE: &str = "unresolved_reference";
    pub const YES: &str = "yes";
    pub const NO: &str = "no";
    pub const TRUNCATED: &str = "truncated";
}

/// Resolves display text for one requested language.
#[derive(Debug, Clone)]
pub struct LocalizationResolver {
    lang: LanguageTag,
    fallback: LanguageTag,
}

impl LocalizationResolver {
    pub fn new(lang: &LanguageTag, default_language: &LanguageTag) -> Self {
        Self {
            lang: lang.clone(),
            fallback: default_language.clone(),
        }
    }

    pub fn lang(&self) -> &LanguageTag {
        &self.lang
    }

    /// Header label for `column` in the requested language.
    pub fn column_label<'c>(&self, column: &'c ColumnDefinition) -> &'c str {
        column
            .localized_label(&self.lang)
            .or_else(|| column.localized_label(&LanguageTag::new(self.lang.primary())))
            .unwrap_or_else(|| column.default_label())
    }

    /// Chrome phrase for `key`. Unknown keys resolve to an empty string.
    pub fn phrase(&self, key: &str) -> &'static str {
        let Some(phrase) = PHRASES.get(key) else {
            tracing::debug!(key, "no phrase registered");
            return "";
        };
        phrase
            .get(self.lang.primary())
            .or_else(|| phrase.get(self.fallback.primary()))
            .unwrap_or(phrase.en)
    }

    /// Language actually used for chrome text: the requested one when the
    /// phrasebook covers it, else the fallback chain.
    pub fn chrome_language(&self) -> &str {
        match self.lang.primary() {
            "en" | "fr" => self.lang.primary(),
            _ => match self.fallback.primary() {
                "en" | "fr" => self.fallback.primary(),
                _ => "en",
            },
        }
    }

    /// "2 results", "1 résultat", "0 résultat".
    pub fn result_count(&self, count: usize) -> String {
        let singular = match self.chrome_language() {
            "fr" => count <= 1,
            _ => count == 1,
        };
        let noun = if singular {
            self.phrase(keys::RESULT_ONE)
        } else {
            self.phrase(keys::RESULT_OTHER)
        };
        format!("{count} {noun}")
    }

    pub fn truncation_notice(&self, shown: usize) -> String {
        self.phrase(keys::TRUNCATED).replace("{count}", &shown.to_string())
    }

    pub fn boolean(&self, value: bool) -> &'static str {
        if value {
            self.phrase(keys::YES)
        } else {
            self.phrase(keys::NO)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn resolver(lang: &str) -> LocalizationResolver {
        LocalizationResolver::new(&LanguageTag::new(lang), &LanguageTag::new("en"))
    }

    #[test]
    fn column_label_fallback_chain() {
        let column = ColumnDefinition::plain("name", "Name")
            .localized("fr", "Nom")
            .localized("fr-ca", "Nom (CA)");
        assert_eq!(resolver("fr-CA").column_label(&column), "Nom (CA)");
        assert_eq!(resolver("fr-BE").column_label(&column), "Nom");
        assert_eq!(resolver("de").column_label(&column), "Name");
        assert_eq!(resolver("en").column_label(&column), "Name");
    }

    #[test]
    fn result_count_pluralisation() {
        assert_eq!(resolver("en").result_count(0), "0 results");
        assert_eq!(resolver("en").result_count(1), "1 result");
        assert_eq!(resolver("en").result_count(2), "2 results");
        assert_eq!(resolver("fr").result_count(0), "0 résultat");
        assert_eq!(resolver("fr").result_count(1), "1 résultat");
        assert_eq!(resolver("fr").result_count(3), "3 résultats");
    }

    #[test]
    fn unknown_language_falls_back() {
        let r = LocalizationResolver::new(&LanguageTag::new("de"), &LanguageTag::new("fr"));
        assert_eq!(r.phrase(keys::SELECT_ALL), "Tout sélectionner");
        assert_eq!(r.chrome_language(), "fr");
        assert_eq!(resolver("de").phrase(keys::SELECT_ALL), "Select all");
    }

    #[test]
    fn unknown_key_is_empty() {
        assert_eq!(resolver("en").phrase("nope"), "");
    }

    #[test]
    fn truncation_notice_interpolates() {
        assert_eq!(
            resolver("en").truncation_notice(50),
            "only the first 50 are shown"
        );
    }
}
