use crate::value::Value;
use serde::{Deserialize, Serialize};

///
/// CasePolicy
///
/// Per-fragment case-comparison strategy for text leaves.
///
/// Database-side folding is the non-deprecated default for ignore-case
/// comparison: application-side casing depends on locale rules that may
/// not match the database collation (German "ß" expands to "SS" under
/// uppercasing; Turkish dotted/dotless I folds correctly only under a
/// Turkish locale), so an `Application` fold is kept only for
/// compatibility and is discouraged for new definitions.
///

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum CasePolicy {
    /// Case-sensitive comparison.
    #[default]
    Exact,

    /// Fold both sides with the engine's UPPER function.
    FoldUpper,

    /// Fold both sides with the engine's LOWER function.
    FoldLower,

    /// Discouraged: uppercase the supplied value application-side with a
    /// configurable locale before it reaches the query; the attribute
    /// side is still folded by the engine.
    Application(Locale),
}

impl CasePolicy {
    /// The engine-side fold this policy attaches to predicate nodes.
    #[must_use]
    pub const fn text_fold(&self) -> TextFold {
        match self {
            Self::Exact => TextFold::None,
            Self::FoldUpper | Self::Application(_) => TextFold::Upper,
            Self::FoldLower => TextFold::Lower,
        }
    }

    /// Apply any application-side conversion to an argument value.
    #[must_use]
    pub fn fold_value(&self, value: Value) -> Value {
        match (self, value) {
            (Self::Application(locale), Value::Text(text)) => {
                Value::Text(locale.to_upper(&text))
            }
            (_, value) => value,
        }
    }
}

///
/// TextFold
///
/// Engine-side case function recorded on predicate nodes. Applies to
/// both the attribute and the compared value.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum TextFold {
    #[default]
    None,
    Upper,
    Lower,
}

impl TextFold {
    /// Fold a string the way the engine function would.
    #[must_use]
    pub fn apply(self, input: &str) -> String {
        match self {
            Self::None => input.to_string(),
            Self::Upper => input.to_uppercase(),
            Self::Lower => input.to_lowercase(),
        }
    }
}

///
/// Locale
///
/// Minimal locale surface for application-side folding. Only the
/// casing rules that differ from the Unicode default are special-cased;
/// everything else uses `str::to_uppercase`.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Locale {
    tag: String,
}

impl Locale {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether this locale uses the Turkic dotted/dotless I rules.
    fn is_turkic(&self) -> bool {
        let lang = self.tag.split(['-', '_']).next().unwrap_or_default();

        matches!(lang, "tr" | "az")
    }

    /// Uppercase `input` under this locale's rules.
    #[must_use]
    pub fn to_upper(&self, input: &str) -> String {
        if !self.is_turkic() {
            return input.to_uppercase();
        }

        let mut out = String::with_capacity(input.len());
        for ch in input.chars() {
            match ch {
                'i' => out.push('\u{130}'), // İ
                'ı' => out.push('I'),
                _ => out.extend(ch.to_uppercase()),
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_exact() {
        assert_eq!(CasePolicy::default(), CasePolicy::Exact);
        assert_eq!(CasePolicy::Exact.text_fold(), TextFold::None);
    }

    #[test]
    fn fold_upper_targets_the_engine() {
        assert_eq!(CasePolicy::FoldUpper.text_fold(), TextFold::Upper);
        // The value itself is untouched; the engine folds both sides.
        assert_eq!(
            CasePolicy::FoldUpper.fold_value(Value::Text("abc".into())),
            Value::Text("abc".into())
        );
    }

    #[test]
    fn application_fold_uppercases_the_value() {
        let policy = CasePolicy::Application(Locale::new("en"));

        assert_eq!(
            policy.fold_value(Value::Text("straße".into())),
            Value::Text("STRASSE".into())
        );
        assert_eq!(policy.text_fold(), TextFold::Upper);
    }

    #[test]
    fn turkish_locale_maps_dotted_and_dotless_i() {
        let tr = Locale::new("tr-TR");

        assert_eq!(tr.to_upper("istanbul"), "\u{130}STANBUL");
        assert_eq!(tr.to_upper("ırmak"), "IRMAK");
        assert_eq!(Locale::new("en").to_upper("istanbul"), "ISTANBUL");
    }
}
