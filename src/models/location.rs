//! Geographic coordinates and distance helpers

use haversine::{Location as HaversineLocation, Units, distance};
use serde::{Deserialize, Serialize};

/// A point on the map in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in kilometers (haversine, Earth radius 6371 km)
    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        distance(
            HaversineLocation {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            HaversineLocation {
                latitude: other.latitude,
                longitude: other.longitude,
            },
            Units::Kilometers,
        )
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One raw result of a geocoder search, before any distance filtering
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
    /// Full resolved address
    pub display_name: String,
}

impl GeocodeHit {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A geocoder hit with its distance from the destination anchor
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub distance_km: f64,
}

impl GeocodeCandidate {
    #[must_use]
    pub fn from_hit(hit: GeocodeHit, anchor: &Coordinates) -> Self {
        let distance_km = anchor.distance_km(&hit.coordinates());
        Self {
            latitude: hit.latitude,
            longitude: hit.longitude,
            display_name: hit.display_name,
            distance_km,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// Pick the hit closest to `anchor` among those within `max_distance_km`.
///
/// Hits outside the bound are never considered. Equal distances keep the
/// geocoder's own ranking (first wins).
#[must_use]
pub fn closest_within(
    hits: Vec<GeocodeHit>,
    anchor: &Coordinates,
    max_distance_km: f64,
) -> Option<GeocodeCandidate> {
    hits.into_iter()
        .map(|hit| GeocodeCandidate::from_hit(hit, anchor))
        .filter(|candidate| candidate.distance_km <= max_distance_km)
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
}
