//! One-sentence place descriptions pulled from the surrounding prose.
//!
//! This is a heuristic, not a parser: for each place the first sentence
//! mentioning it wins, and a few cosmetic cleanups are applied.

use super::syntax::{DAY_HEADER_LINE, sanitize_leading};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static SENTENCE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

static LEADING_AUXILIARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(is|are|was|were|has|have|had|will|would|can|could|should|may|might)\s+",
    )
    .unwrap()
});

/// Place name → synthesized description.
///
/// A missing entry means no usable sentence was found; callers fall back to
/// their own default text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptionTable {
    entries: HashMap<String, String>,
}

impl DescriptionTable {
    #[must_use]
    pub fn get(&self, place: &str) -> Option<&str> {
        self.entries.get(place).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// First insertion for a name wins
    fn insert_first(&mut self, place: &str, description: String) {
        self.entries
            .entry(place.to_string())
            .or_insert(description);
    }
}

impl FromIterator<(String, String)> for DescriptionTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut table = Self::default();
        for (place, description) in iter {
            table.insert_first(&place, description);
        }
        table
    }
}

pub struct DescriptionSynthesizer;

impl DescriptionSynthesizer {
    /// Build the description table for `places` from `text`
    #[must_use]
    pub fn synthesize(text: &str, places: &[String]) -> DescriptionTable {
        let without_headers = DAY_HEADER_LINE.replace_all(text, "\n");
        let sentences: Vec<&str> = SENTENCE_BREAK
            .split(&without_headers)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        let mut table = DescriptionTable::default();
        for place in places {
            if place.is_empty() || table.get(place).is_some() {
                continue;
            }
            let needle = place.to_lowercase();
            let Some(sentence) = sentences
                .iter()
                .find(|sentence| sentence.to_lowercase().contains(&needle))
            else {
                continue;
            };

            if let Some(description) = Self::clean_sentence(sentence, place) {
                table.insert_first(place, description);
            }
        }

        debug!(
            "Synthesized {} descriptions for {} places",
            table.len(),
            places.len()
        );
        table
    }

    fn clean_sentence(sentence: &str, place: &str) -> Option<String> {
        let marked = RegexBuilder::new(&format!(r"\*\*{}\*\*", regex::escape(place)))
            .case_insensitive(true)
            .build()
            .ok()?;

        let description = marked.replace_all(sentence, "");
        let description = description.trim().replace(':', "");
        let description = description.trim();
        let description = LEADING_AUXILIARY.replace(description, "");
        let description = sanitize_leading(&capitalize_first(&description));

        (!description.is_empty()).then_some(description)
    }
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
