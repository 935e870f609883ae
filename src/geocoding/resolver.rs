//! Reconciles place mentions against the geocoder.
//!
//! Each place gets a cascade of queries, most specific first. The first query
//! that produces a hit within the distance bound of the destination anchor
//! wins; the closest such hit becomes the place's marker. Places are resolved
//! in throttled batches so a public geocoder is not flooded.

use super::{Geocoder, QueryCascade, QueryRule};
use crate::config::GeocodingConfig;
use crate::models::{Coordinates, Marker, closest_within};
use crate::text::DescriptionTable;
use crate::throttle::BatchThrottle;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Outcome of resolving a list of place names
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub markers: Vec<Marker>,
    /// Names that resolved, in input order
    pub found_places: Vec<String>,
}

pub struct GeocodingResolver {
    geocoder: Arc<dyn Geocoder>,
    result_limit: u32,
    max_distance_km: f64,
    secondary_locale: Option<String>,
    query_rules: Vec<QueryRule>,
    throttle: BatchThrottle,
}

impl GeocodingResolver {
    pub fn new(geocoder: Arc<dyn Geocoder>, config: &GeocodingConfig) -> Self {
        Self {
            geocoder,
            result_limit: config.result_limit,
            max_distance_km: config.max_distance_km,
            secondary_locale: config.secondary_locale.clone(),
            query_rules: config.query_rules.clone(),
            throttle: BatchThrottle::new(config.batch_size as usize, config.batch_delay()),
        }
    }

    /// Geocode the trip destination with a single search.
    ///
    /// `Ok(None)` means the geocoder knows no such place; transport failures
    /// are returned as errors since nothing can be resolved without an anchor.
    #[instrument(skip(self))]
    pub async fn locate_destination(&self, destination: &str) -> Result<Option<Marker>> {
        let hits = self.geocoder.search(destination, 1).await?;
        let marker = hits
            .into_iter()
            .next()
            .map(|hit| Marker::destination(destination, hit));

        match &marker {
            Some(marker) => info!(
                "Destination '{}' located at {}",
                destination,
                marker.position.format_coordinates()
            ),
            None => warn!("Destination '{}' not found", destination),
        }
        Ok(marker)
    }

    /// Resolve one place; `None` when every query came up empty or out of range
    pub async fn resolve_one(
        &self,
        place: &str,
        descriptions: &DescriptionTable,
        anchor: &Coordinates,
        city: &str,
    ) -> Option<Marker> {
        let queries = QueryCascade::build(
            place,
            city,
            self.secondary_locale.as_deref(),
            &self.query_rules,
        );

        for query in &queries {
            let hits = match self.geocoder.search(query, self.result_limit).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Geocoding query '{}' failed: {}", query, e);
                    continue;
                }
            };
            if hits.is_empty() {
                debug!("No results for query '{}'", query);
                continue;
            }

            let hit_count = hits.len();
            let Some(candidate) = closest_within(hits, anchor, self.max_distance_km) else {
                debug!(
                    "All {} results for '{}' are farther than {} km",
                    hit_count, query, self.max_distance_km
                );
                continue;
            };

            info!(
                "Resolved '{}' via '{}' ({:.1} km from destination)",
                place, query, candidate.distance_km
            );
            let description = descriptions.get(place).map(str::to_string);
            return Some(Marker::place(place, candidate, description));
        }

        info!(
            "Could not resolve '{}' after {} queries",
            place,
            queries.len()
        );
        None
    }

    /// Resolve many places under the batch throttle.
    ///
    /// Without an anchor nothing is searched and the result is empty.
    /// Repeated names are resolved once.
    #[instrument(skip_all, fields(places = places.len(), city = city))]
    pub async fn resolve_places(
        &self,
        places: &[String],
        descriptions: &DescriptionTable,
        anchor: Option<&Coordinates>,
        city: &str,
    ) -> Resolution {
        let Some(anchor) = anchor else {
            error!("No destination anchor; skipping geocoding of {} places", places.len());
            return Resolution::default();
        };

        let mut seen = HashSet::new();
        let unique: Vec<&str> = places
            .iter()
            .map(String::as_str)
            .filter(|place| seen.insert(*place))
            .collect();

        let outcomes = self
            .throttle
            .run(unique, move |place| async move {
                self.resolve_one(place, descriptions, anchor, city)
                    .await
                    .map(|marker| (place.to_string(), marker))
            })
            .await;

        let (found_places, markers): (Vec<String>, Vec<Marker>) =
            outcomes.into_iter().flatten().unzip();

        info!(
            "Resolved {} of {} places near {}",
            found_places.len(),
            places.len(),
            city
        );
        Resolution {
            markers,
            found_places,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeocodeHit, MarkerKind};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const ANCHOR: Coordinates = Coordinates {
        latitude: 54.0,
        longitude: 25.0,
    };

    /// ~0.09 degrees of latitude per 10 km
    fn hit_km_north(km: f64, name: &str) -> GeocodeHit {
        GeocodeHit {
            latitude: ANCHOR.latitude + km / 111.195,
            longitude: ANCHOR.longitude,
            display_name: name.to_string(),
        }
    }

    #[derive(Default)]
    struct FakeGeocoder {
        answers: HashMap<String, Vec<GeocodeHit>>,
        failing: HashSet<String>,
        calls: Mutex<Vec<(String, u32)>>,
    }

    impl FakeGeocoder {
        fn answer(mut self, query: &str, hits: Vec<GeocodeHit>) -> Self {
            self.answers.insert(query.to_string(), hits);
            self
        }

        fn fail(mut self, query: &str) -> Self {
            self.failing.insert(query.to_string());
            self
        }

        fn queries(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(q, _)| q.clone()).collect()
        }
    }

    #[async_trait]
    impl Geocoder for FakeGeocoder {
        async fn search(&self, query: &str, limit: u32) -> Result<Vec<GeocodeHit>> {
            self.calls.lock().unwrap().push((query.to_string(), limit));
            if self.failing.contains(query) {
                anyhow::bail!("connection reset");
            }
            Ok(self.answers.get(query).cloned().unwrap_or_default())
        }
    }

    fn resolver(geocoder: Arc<FakeGeocoder>) -> GeocodingResolver {
        GeocodingResolver::new(geocoder, &GeocodingConfig::default())
    }

    fn names(places: &[&str]) -> Vec<String> {
        places.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_nearest_candidate_within_bound_wins() {
        let geocoder = Arc::new(FakeGeocoder::default().answer(
            "Town Hall Vilnius",
            vec![hit_km_north(60.0, "far"), hit_km_north(10.0, "near")],
        ));
        let marker = resolver(geocoder.clone())
            .resolve_one("Town Hall", &DescriptionTable::default(), &ANCHOR, "Vilnius")
            .await
            .unwrap();

        assert_eq!(marker.full_address, "near");
        assert_eq!(marker.kind, MarkerKind::Place);
        assert_eq!(geocoder.queries(), vec!["Town Hall Vilnius"]);
        assert_eq!(geocoder.calls.lock().unwrap()[0].1, 15);
    }

    #[tokio::test]
    async fn test_out_of_range_hits_fall_through_to_next_query() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("Town Hall Vilnius", vec![hit_km_north(60.0, "far")])
                .answer("Town Hall", vec![hit_km_north(12.0, "bare")]),
        );
        let marker = resolver(geocoder.clone())
            .resolve_one("Town Hall", &DescriptionTable::default(), &ANCHOR, "Vilnius")
            .await
            .unwrap();

        assert_eq!(marker.full_address, "bare");
        assert_eq!(geocoder.queries(), vec!["Town Hall Vilnius", "Town Hall"]);
    }

    #[tokio::test]
    async fn test_only_far_candidates_means_not_found() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("Town Hall Vilnius", vec![hit_km_north(60.0, "far")])
                .answer("Town Hall", vec![hit_km_north(60.0, "far")]),
        );
        let marker = resolver(geocoder)
            .resolve_one("Town Hall", &DescriptionTable::default(), &ANCHOR, "Vilnius")
            .await;
        assert!(marker.is_none());
    }

    #[tokio::test]
    async fn test_failed_query_is_treated_as_empty() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .fail("Town Hall Vilnius")
                .answer("Town Hall", vec![hit_km_north(3.0, "bare")]),
        );
        let marker = resolver(geocoder)
            .resolve_one("Town Hall", &DescriptionTable::default(), &ANCHOR, "Vilnius")
            .await;
        assert_eq!(marker.unwrap().full_address, "bare");
    }

    #[tokio::test]
    async fn test_no_anchor_resolves_nothing() {
        let geocoder = Arc::new(
            FakeGeocoder::default().answer("Town Hall Vilnius", vec![hit_km_north(1.0, "x")]),
        );
        let resolution = resolver(geocoder.clone())
            .resolve_places(&names(&["Town Hall"]), &DescriptionTable::default(), None, "Vilnius")
            .await;

        assert_eq!(resolution, Resolution::default());
        assert!(geocoder.queries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_found_places_keep_input_order_and_descriptions() {
        let geocoder = Arc::new(
            FakeGeocoder::default()
                .answer("Cathedral Vilnius", vec![hit_km_north(1.0, "Cathedral, Vilnius")])
                .answer("Tower Vilnius", vec![hit_km_north(2.0, "Tower, Vilnius")])
                .answer("Lake Vilnius", vec![hit_km_north(70.0, "Lake, far away")])
                .answer("Castle Vilnius", vec![hit_km_north(30.0, "Castle, Trakai")]),
        );
        let descriptions: DescriptionTable =
            [("Tower".to_string(), "Great views".to_string())].into_iter().collect();

        let resolution = resolver(geocoder.clone())
            .resolve_places(
                &names(&["Cathedral", "Lake", "Tower", "Cathedral", "Castle"]),
                &descriptions,
                Some(&ANCHOR),
                "Vilnius",
            )
            .await;

        assert_eq!(resolution.found_places, vec!["Cathedral", "Tower", "Castle"]);
        assert_eq!(resolution.markers.len(), 3);
        assert_eq!(resolution.markers[1].ai_description.as_deref(), Some("Great views"));
        assert_eq!(resolution.markers[0].ai_description, None);
        // the duplicate "Cathedral" is searched once
        let cathedral_calls = geocoder
            .queries()
            .iter()
            .filter(|q| q.starts_with("Cathedral"))
            .count();
        assert_eq!(cathedral_calls, 1);
    }

    #[tokio::test]
    async fn test_locate_destination_uses_first_hit() {
        let geocoder = Arc::new(FakeGeocoder::default().answer(
            "Anykščiai",
            vec![hit_km_north(0.0, "Anykščiai, Lithuania"), hit_km_north(5.0, "other")],
        ));
        let marker = resolver(geocoder.clone())
            .locate_destination("Anykščiai")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(marker.kind, MarkerKind::Destination);
        assert_eq!(marker.place_name, "Anykščiai");
        assert_eq!(marker.full_address, "Anykščiai, Lithuania");
        assert_eq!(geocoder.calls.lock().unwrap()[0], ("Anykščiai".to_string(), 1));
    }

    #[tokio::test]
    async fn test_locate_destination_unknown_and_failing() {
        let geocoder = Arc::new(FakeGeocoder::default().fail("Atlantis"));
        let resolver = resolver(geocoder);
        assert!(resolver.locate_destination("Nowhere").await.unwrap().is_none());
        assert!(resolver.locate_destination("Atlantis").await.is_err());
    }
}
