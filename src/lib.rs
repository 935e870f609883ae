//! `LaWander` - itinerary text-linking and geocoding engine
//!
//! Turns AI-generated travel prose into geocoded map markers and day-grouped
//! HTML in which every resolved place is clickable.

pub mod api;
pub mod cache;
pub mod completion;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod logging;
pub mod models;
pub mod planner;
pub mod prompts;
pub mod text;
pub mod throttle;
pub mod web;

// Re-export core types for public API
pub use completion::{ChatCompletionClient, CompletionProvider};
pub use config::LaWanderConfig;
pub use error::LaWanderError;
pub use geocoding::{Geocoder, GeocodingResolver, NominatimClient, Resolution};
pub use models::{Coordinates, DaySection, Marker, MarkerKind, merge_markers};
pub use planner::{ItineraryPlanner, PlanOutcome, RunKey, TripRequest, TripSession};
pub use text::{format_itinerary_html, format_message_text};
pub use throttle::BatchThrottle;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, LaWanderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
