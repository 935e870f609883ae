//! Itinerary display structures

use serde::{Deserialize, Serialize};

/// A contiguous run of itinerary items grouped under one day header
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct DaySection {
    /// e.g. "Day 2: Old Town"
    pub title: String,
    /// HTML fragments, one per itinerary line
    pub items: Vec<String>,
}

impl DaySection {
    #[must_use]
    pub fn new(title: String) -> Self {
        Self {
            title,
            items: Vec::new(),
        }
    }

    /// Drop blank items; called once the section is complete
    pub fn seal(mut self) -> Self {
        self.items.retain(|item| !item.trim().is_empty());
        self
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            "<p style=\"margin: 0 0 14px 0;\"><strong>{}</strong><br/>{}</p>",
            self.title,
            self.items.join("<br/>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_discards_blank_items() {
        let mut section = DaySection::new("Day 1".to_string());
        section.items = vec!["a".into(), "  ".into(), String::new(), "b".into()];
        assert_eq!(section.seal().items, vec!["a", "b"]);
    }

    #[test]
    fn test_to_html() {
        let section = DaySection {
            title: "Day 1: Old Town".to_string(),
            items: vec!["one".into(), "two".into()],
        };
        assert_eq!(
            section.to_html(),
            "<p style=\"margin: 0 0 14px 0;\"><strong>Day 1: Old Town</strong><br/>one<br/>two</p>"
        );
    }
}
