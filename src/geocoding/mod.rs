//! Geocoding collaborator and the place resolver built on top of it
//!
//! - `Geocoder`: text query to raw hits, the seam tests fake
//! - `NominatimClient`: OpenStreetMap Nominatim over HTTP
//! - `CachedGeocoder`: persistent fjall-backed wrapper around any geocoder
//! - `GeocodingResolver`: query cascade, distance filter and batch throttling

pub mod cache;
pub mod nominatim;
pub mod queries;
pub mod resolver;

use crate::models::GeocodeHit;
use anyhow::Result;
use async_trait::async_trait;

pub use cache::CachedGeocoder;
pub use nominatim::NominatimClient;
pub use queries::{QueryCascade, QueryRule, default_query_rules};
pub use resolver::{GeocodingResolver, Resolution};

/// A text search returning candidate coordinates
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Up to `limit` hits for `query`, in the geocoder's relevance order.
    /// No match is an empty list, not an error.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodeHit>>;
}
