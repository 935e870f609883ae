//! Map markers and the deduplicating merge that guards the marker collection

use super::location::{Coordinates, GeocodeCandidate, GeocodeHit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// The trip destination itself (the distance anchor)
    Destination,
    /// A place mentioned in AI text
    Place,
}

/// A resolved, mappable place record handed to the presentation layer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Serialized as a `[lat, lon]` array
    #[serde(with = "lat_lon_pair")]
    pub position: Coordinates,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub place_name: String,
    pub full_address: String,
    pub ai_description: Option<String>,
}

impl Marker {
    /// Marker for a place resolved from a geocode candidate
    #[must_use]
    pub fn place(
        place_name: &str,
        candidate: GeocodeCandidate,
        ai_description: Option<String>,
    ) -> Self {
        Self {
            position: candidate.coordinates(),
            kind: MarkerKind::Place,
            place_name: place_name.to_string(),
            full_address: candidate.display_name,
            ai_description,
        }
    }

    /// Marker for the trip destination
    #[must_use]
    pub fn destination(destination: &str, hit: GeocodeHit) -> Self {
        Self {
            position: hit.coordinates(),
            kind: MarkerKind::Destination,
            place_name: destination.to_string(),
            full_address: hit.display_name,
            ai_description: None,
        }
    }
}

mod lat_lon_pair {
    use super::Coordinates;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(position: &Coordinates, serializer: S) -> Result<S::Ok, S::Error> {
        (position.latitude, position.longitude).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coordinates, D::Error> {
        let (latitude, longitude) = <(f64, f64)>::deserialize(deserializer)?;
        Ok(Coordinates::new(latitude, longitude))
    }
}

/// Merge `incoming` markers into `existing`, keeping at most one marker per
/// place name. The first occurrence wins, existing markers before new ones.
#[must_use]
pub fn merge_markers(
    existing: Vec<Marker>,
    incoming: impl IntoIterator<Item = Marker>,
) -> Vec<Marker> {
    let mut seen = HashSet::new();
    existing
        .into_iter()
        .chain(incoming)
        .filter(|marker| seen.insert(marker.place_name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(name: &str, address: &str) -> Marker {
        Marker {
            position: Coordinates::new(54.0, 25.0),
            kind: MarkerKind::Place,
            place_name: name.to_string(),
            full_address: address.to_string(),
            ai_description: None,
        }
    }

    #[test]
    fn test_merge_keeps_existing_marker() {
        let merged = merge_markers(
            vec![marker("A", "original")],
            vec![marker("A", "newer"), marker("B", "b")],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].place_name, "A");
        assert_eq!(merged[0].full_address, "original");
        assert_eq!(merged[1].place_name, "B");
    }

    #[test]
    fn test_merge_dedups_within_incoming() {
        let merged = merge_markers(Vec::new(), vec![marker("A", "1"), marker("A", "2")]);
        assert_eq!(merged, vec![marker("A", "1")]);
    }

    #[test]
    fn test_merge_is_case_sensitive() {
        let merged = merge_markers(vec![marker("Old Town", "x")], vec![marker("old town", "y")]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_marker_serializes_for_presentation_layer() {
        let mut m = marker("Old Town", "Old Town, Vilnius");
        m.ai_description = Some("Cobbled streets".to_string());
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["type"], "place");
        assert_eq!(json["placeName"], "Old Town");
        assert_eq!(json["fullAddress"], "Old Town, Vilnius");
        assert_eq!(json["aiDescription"], "Cobbled streets");
        assert_eq!(json["position"], serde_json::json!([54.0, 25.0]));
    }

    #[test]
    fn test_marker_reads_back_from_pair_position() {
        let json = r#"{"position":[54.6872,25.2797],"type":"destination","placeName":"Vilnius","fullAddress":"Vilnius, Lithuania","aiDescription":null}"#;
        let parsed: Marker = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.position, Coordinates::new(54.6872, 25.2797));
        assert_eq!(parsed.kind, MarkerKind::Destination);
    }
}
