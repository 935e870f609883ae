//! Data models for the LaWander engine
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates, raw geocoder hits and distance-ranked candidates
//! - Marker: resolved places and the deduplicating merge
//! - Itinerary: day sections produced by the formatter

pub mod itinerary;
pub mod location;
pub mod marker;

// Re-export all public types for convenient access
pub use itinerary::DaySection;
pub use location::{Coordinates, GeocodeCandidate, GeocodeHit, closest_within};
pub use marker::{Marker, MarkerKind, merge_markers};
