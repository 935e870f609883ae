//! HTML rendering of AI replies with clickable place references

use super::syntax::{
    PLACE_MENTION, escape_attribute, parse_day_header, strip_bullet, strip_heading,
    strip_marker_delimiters, strip_numbering,
};
use crate::models::DaySection;
use regex::{NoExpand, RegexBuilder};
use std::collections::HashMap;

/// How many leading characters of a dash-less line are searched for a place
const PREFIX_SCAN_CHARS: usize = 60;

const ITINERARY_SPAN_CLASS: &str = "place-name clickable-place blue-place";
const MESSAGE_SPAN_CLASS: &str = "place-name clickable-place";

/// Lookup structure over the places that geocoding resolved
#[derive(Debug, Clone, Default)]
pub struct FoundPlaces {
    by_lowercase: HashMap<String, String>,
    /// Longest name first; equal lengths keep their original order
    longest_first: Vec<(String, String)>,
}

impl FoundPlaces {
    pub fn new<S: AsRef<str>>(places: &[S]) -> Self {
        let mut by_lowercase = HashMap::new();
        let mut longest_first = Vec::new();
        for place in places {
            let place = place.as_ref();
            let lower = place.to_lowercase();
            if by_lowercase.contains_key(&lower) {
                continue;
            }
            by_lowercase.insert(lower.clone(), place.to_string());
            longest_first.push((lower, place.to_string()));
        }
        longest_first.sort_by(|a, b| b.1.chars().count().cmp(&a.1.chars().count()));
        Self {
            by_lowercase,
            longest_first,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_lowercase.is_empty()
    }

    /// Case-insensitive exact match, returning the found place's casing
    #[must_use]
    pub fn exact(&self, label: &str) -> Option<&str> {
        self.by_lowercase
            .get(&label.to_lowercase())
            .map(String::as_str)
    }

    /// The longest found place contained (case-insensitively) in `text`
    #[must_use]
    pub fn longest_contained_in(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.longest_first
            .iter()
            .find(|(lower, _)| haystack.contains(lower.as_str()))
            .map(|(_, original)| original.as_str())
    }
}

fn place_span(class: &str, place: &str, inner: &str) -> String {
    format!(
        "<span class=\"{class}\" data-place=\"{}\">{inner}</span>",
        escape_attribute(place)
    )
}

/// Groups itinerary text into day sections and links resolved places
pub struct ItineraryFormatter {
    found: FoundPlaces,
}

impl ItineraryFormatter {
    pub fn new<S: AsRef<str>>(found_places: &[S]) -> Self {
        Self {
            found: FoundPlaces::new(found_places),
        }
    }

    /// Day sections in textual order. Lines before the first header are
    /// ignored; text without any header yields no sections.
    #[must_use]
    pub fn sections(&self, raw_text: &str) -> Vec<DaySection> {
        let normalized = raw_text.replace("\r\n", "\n");
        let mut sections = Vec::new();
        let mut current: Option<DaySection> = None;

        for raw_line in normalized.split('\n') {
            let line = strip_heading(raw_line).trim();
            if line.is_empty() {
                continue;
            }
            let line = strip_bullet(line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = parse_day_header(line) {
                if let Some(section) = current.take() {
                    sections.push(section.seal());
                }
                current = Some(DaySection::new(header.title()));
                continue;
            }

            if let Some(section) = current.as_mut() {
                section.items.push(self.format_item(line));
            }
        }

        if let Some(section) = current.take() {
            sections.push(section.seal());
        }
        sections
    }

    /// Render `raw_text` as one paragraph per day, or as plain `<br/>`-joined
    /// lines when it has no day headers at all.
    #[must_use]
    pub fn to_html(&self, raw_text: &str) -> String {
        if raw_text.is_empty() {
            return String::new();
        }

        let sections = self.sections(raw_text);
        if sections.is_empty() {
            return raw_text
                .replace("\r\n", "\n")
                .split('\n')
                .map(|line| strip_heading(line).trim())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("<br/>");
        }

        sections
            .iter()
            .map(DaySection::to_html)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_item(&self, line: &str) -> String {
        let cleaned = strip_bullet(line);

        match cleaned.find(" - ") {
            Some(dash) if dash > 0 => {
                let left = cleaned[..dash].trim();
                let rest = &cleaned[dash + 3..];
                let label = strip_bullet(strip_numbering(left));
                let unmarked = strip_marker_delimiters(label);
                let unmarked = unmarked.trim();

                let matched = self
                    .found
                    .exact(unmarked)
                    .or_else(|| self.found.longest_contained_in(unmarked));

                match matched {
                    Some(place) => format!(
                        "{} - {rest}",
                        place_span(ITINERARY_SPAN_CLASS, place, place)
                    ),
                    None => format!("{unmarked} - {}", strip_marker_delimiters(rest)),
                }
            }
            _ => self.link_in_prefix(cleaned),
        }
    }

    fn link_in_prefix(&self, line: &str) -> String {
        let prefix: String = line.chars().take(PREFIX_SCAN_CHARS).collect();
        let Some(place) = self.found.longest_contained_in(&prefix) else {
            return line.to_string();
        };

        let pattern = format!(r"(?:\*\*\s*)?{}(?:\s*\*\*)?", regex::escape(place));
        match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(occurrence) => occurrence
                .replacen(line, 1, NoExpand(&place_span(ITINERARY_SPAN_CLASS, place, place)))
                .into_owned(),
            Err(_) => line.to_string(),
        }
    }
}

/// Itinerary HTML for `raw_text`, linking only `found_places`
#[must_use]
pub fn format_itinerary_html<S: AsRef<str>>(raw_text: &str, found_places: &[S]) -> String {
    ItineraryFormatter::new(found_places).to_html(raw_text)
}

/// Chat-reply rendering: each `**mention**` becomes a clickable span when it
/// was resolved and bare text otherwise.
#[must_use]
pub fn format_message_text<S: AsRef<str>>(text: &str, found_places: &[S]) -> String {
    let found = FoundPlaces::new(found_places);
    if found.is_empty() {
        return strip_marker_delimiters(text);
    }

    PLACE_MENTION
        .replace_all(text, |captures: &regex::Captures<'_>| {
            let mention = &captures[1];
            let trimmed = mention.trim();
            if found.exact(trimmed).is_some() {
                place_span(MESSAGE_SPAN_CLASS, trimmed, mention)
            } else {
                mention.to_string()
            }
        })
        .into_owned()
}
