use std::collections::HashSet;
use crate::config::{FilterConfig, UntaggedPolicy};

/// Decides whether an audio track's language tag means English.
///
/// Tags are normalized (trimmed, lowercased, `_` read as `-`) and looked up in
/// a fixed set. Absent, empty and `und` tags follow the [`UntaggedPolicy`].
#[derive(Debug, Clone)]
pub struct LanguageClassifier {
    english_codes: HashSet<String>,
    untagged: UntaggedPolicy,
}

impl LanguageClassifier {
    /// Create a classifier from a list of English codes
    pub fn new<I, S>(english_codes: I, untagged: UntaggedPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let english_codes = english_codes
            .into_iter()
            .map(|code| normalize(code.as_ref()))
            .filter(|code| !code.is_empty())
            .collect();
        LanguageClassifier {
            english_codes,
            untagged,
        }
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        Self::new(&cfg.english_codes, cfg.untagged_audio)
    }

    /// Classify a raw language tag
    pub fn is_english(&self, tag: Option<&str>) -> bool {
        let normalized = tag.map(normalize).unwrap_or_default();
        if is_untagged(&normalized) {
            return self.untagged == UntaggedPolicy::Keep;
        }
        self.english_codes.contains(&normalized)
    }

    pub fn untagged_policy(&self) -> UntaggedPolicy {
        self.untagged
    }
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::from_config(&FilterConfig::default())
    }
}

/// True for tags that carry no language information
pub fn is_untagged(tag: &str) -> bool {
    let t = tag.trim();
    t.is_empty() || t.eq_ignore_ascii_case("und")
}

fn normalize(tag: &str) -> String {
    tag.trim().to_ascii_lowercase().replace('_', "-")
}
