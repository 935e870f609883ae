//! Place-mention extraction

use super::syntax::PLACE_MENTION;
use tracing::debug;

/// Scans raw text for `**Name**` mentions
pub struct PlaceExtractor;

impl PlaceExtractor {
    /// Every mention in order of appearance, trimmed, duplicates kept.
    ///
    /// Mentions that are blank after trimming are skipped. Text without
    /// mentions yields an empty list.
    #[must_use]
    pub fn extract(text: &str) -> Vec<String> {
        let places: Vec<String> = PLACE_MENTION
            .captures_iter(text)
            .map(|captures| captures[1].trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();

        debug!("Extracted {} place mentions: {:?}", places.len(), places);
        places
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_in_order_with_duplicates() {
        let text = "Start at **Old Town**, then **Gediminas Tower**. Back to ** Old Town ** for dinner.";
        assert_eq!(
            PlaceExtractor::extract(text),
            vec!["Old Town", "Gediminas Tower", "Old Town"]
        );
    }

    #[test]
    fn test_extract_without_markers() {
        assert!(PlaceExtractor::extract("A quiet day by the lake.").is_empty());
        assert!(PlaceExtractor::extract("").is_empty());
    }

    #[test]
    fn test_extract_multiline_itinerary() {
        let text = "### Day 1: Center\n- **Cathedral Square** - Heart of the city\n- **Vilnius University** - Oldest campus\n";
        assert_eq!(
            PlaceExtractor::extract(text),
            vec!["Cathedral Square", "Vilnius University"]
        );
    }

    #[test]
    fn test_extract_does_not_span_lines() {
        let text = "Visit **Hill\nPark** today";
        assert!(PlaceExtractor::extract(text).is_empty());
    }

    #[test]
    fn test_extract_skips_blank_mentions() {
        assert_eq!(PlaceExtractor::extract("**** then **Park**"), vec!["Park"]);
    }
}
