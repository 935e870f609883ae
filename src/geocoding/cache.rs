//! Geocoder wrapper that remembers results on disk

use super::Geocoder;
use crate::cache::PersistentCache;
use crate::models::GeocodeHit;
use anyhow::Result;
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, warn};

pub struct CachedGeocoder<G> {
    inner: G,
    cache: PersistentCache,
    ttl: Duration,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G, cache: PersistentCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    fn cache_key(query: &str, limit: u32) -> String {
        format!("geocode:{limit}:{}", query.trim().to_lowercase())
    }

    /// Entries written together should not all expire together
    fn jittered_ttl(&self) -> Duration {
        self.ttl.mul_f64(rand::rng().random_range(0.9..1.1))
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodeHit>> {
        let key = Self::cache_key(query, limit);

        match self.cache.get::<Vec<GeocodeHit>>(&key).await {
            Ok(Some(hits)) => {
                debug!("Geocode cache hit for '{}'", query);
                return Ok(hits);
            }
            Ok(None) => {}
            Err(e) => warn!("Geocode cache read failed for '{}': {}", query, e),
        }

        let hits = self.inner.search(query, limit).await?;

        if let Err(e) = self.cache.put(&key, hits.clone(), self.jittered_ttl()).await {
            warn!("Geocode cache write failed for '{}': {}", query, e);
        }
        Ok(hits)
    }
}
