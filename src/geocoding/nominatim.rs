//! OpenStreetMap Nominatim search client

use super::Geocoder;
use crate::LaWanderError;
use crate::config::GeocodingConfig;
use crate::models::GeocodeHit;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// One entry of a Nominatim `format=json` response.
/// Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimPlace {
    fn into_hit(self) -> Option<GeocodeHit> {
        let latitude = self.lat.trim().parse::<f64>().ok()?;
        let longitude = self.lon.trim().parse::<f64>().ok()?;
        Some(GeocodeHit {
            latitude,
            longitude,
            display_name: self.display_name,
        })
    }
}

pub struct NominatimClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl NominatimClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.into()))
            .user_agent(config.user_agent.as_str())
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, limit: u32) -> String {
        format!(
            "{}/search?format=json&q={}&limit={}&addressdetails=1",
            self.base_url,
            urlencoding::encode(query),
            limit
        )
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self), level = "debug")]
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodeHit>> {
        let url = self.search_url(query, limit);
        debug!("Nominatim request URL: {}", url);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LaWanderError::api(format!("Geocoding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Nominatim returned {} for '{}'", status, query);
            return Err(LaWanderError::api(format!("Geocoding returned HTTP {status}")).into());
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .with_context(|| "Failed to parse Nominatim response")?;

        let hits: Vec<GeocodeHit> = places.into_iter().filter_map(NominatimPlace::into_hit).collect();
        debug!(
            "Nominatim returned {} hits for '{}' in {:?}",
            hits.len(),
            query,
            start_time.elapsed()
        );
        Ok(hits)
    }
}
