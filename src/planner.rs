//! Entry points the hosts call: itinerary generation and trip questions.
//!
//! The planner sequences destination lookup, completion, extraction,
//! description synthesis, resolution, marker merge and formatting. Session
//! state belongs to the host and is passed in by `&mut`.

use crate::cache::PersistentCache;
use crate::completion::{ChatCompletionClient, CompletionProvider};
use crate::config::LaWanderConfig;
use crate::geocoding::{CachedGeocoder, Geocoder, GeocodingResolver, NominatimClient};
use crate::models::{Coordinates, Marker, merge_markers};
use crate::prompts;
use crate::text::{DescriptionSynthesizer, PlaceExtractor, format_itinerary_html, format_message_text};
use crate::{LaWanderError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Longest trip an itinerary is generated for
pub const MAX_TRIP_DAYS: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub days: u32,
}

impl TripRequest {
    pub fn new(destination: impl Into<String>, days: u32) -> Result<Self> {
        let request = Self {
            destination: destination.into().trim().to_string(),
            days,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(LaWanderError::validation("Destination cannot be empty"));
        }
        if self.days == 0 || self.days > MAX_TRIP_DAYS {
            return Err(LaWanderError::validation(format!(
                "Trip length must be between 1 and {MAX_TRIP_DAYS} days, got {}",
                self.days
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn run_key(&self) -> RunKey {
        RunKey::new(&self.destination, self.days)
    }
}

/// Idempotency key of one itinerary run: `destination|days`, with the
/// destination trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunKey(String);

impl RunKey {
    #[must_use]
    pub fn new(destination: &str, days: u32) -> Self {
        Self(format!("{}|{days}", destination.trim().to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Host-owned state of one trip
#[derive(Debug, Clone)]
pub struct TripSession {
    request: TripRequest,
    destination: Option<Marker>,
    markers: Vec<Marker>,
    last_run: Option<RunKey>,
}

impl TripSession {
    #[must_use]
    pub fn new(request: TripRequest) -> Self {
        Self {
            request,
            destination: None,
            markers: Vec::new(),
            last_run: None,
        }
    }

    #[must_use]
    pub fn request(&self) -> &TripRequest {
        &self.request
    }

    #[must_use]
    pub fn destination(&self) -> Option<&Marker> {
        self.destination.as_ref()
    }

    #[must_use]
    pub fn anchor(&self) -> Option<Coordinates> {
        self.destination.as_ref().map(|marker| marker.position)
    }

    /// Place markers merged so far, without the destination
    #[must_use]
    pub fn place_markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Destination marker first, then every place marker
    #[must_use]
    pub fn all_markers(&self) -> Vec<Marker> {
        self.destination
            .iter()
            .chain(self.markers.iter())
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn last_run(&self) -> Option<&RunKey> {
        self.last_run.as_ref()
    }

    fn merge(&mut self, incoming: Vec<Marker>) {
        let existing = std::mem::take(&mut self.markers);
        self.markers = merge_markers(existing, incoming);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryReply {
    pub html: String,
    /// Every `**marked**` mention in the completion, duplicates kept
    pub mentioned_places: Vec<String>,
    pub found_places: Vec<String>,
    /// Session markers after the merge, destination first
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReply {
    pub html: String,
    pub mentioned_places: Vec<String>,
    pub found_places: Vec<String>,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Generated(ItineraryReply),
    /// The session already completed a run with this key; nothing was done
    AlreadyGenerated,
}

pub struct ItineraryPlanner {
    completion: Arc<dyn CompletionProvider>,
    resolver: GeocodingResolver,
}

impl ItineraryPlanner {
    pub fn new(completion: Arc<dyn CompletionProvider>, resolver: GeocodingResolver) -> Self {
        Self {
            completion,
            resolver,
        }
    }

    /// Wire the HTTP collaborators described by `config`.
    ///
    /// An unusable cache directory downgrades to uncached geocoding.
    pub fn from_config(config: &LaWanderConfig) -> anyhow::Result<Self> {
        let nominatim = NominatimClient::new(&config.geocoding)?;

        let geocoder: Arc<dyn Geocoder> = if config.cache.enabled {
            match PersistentCache::open(&config.cache.location) {
                Ok(cache) => {
                    let ttl = Duration::from_secs(u64::from(config.cache.ttl_hours) * 3600);
                    Arc::new(CachedGeocoder::new(nominatim, cache, ttl))
                }
                Err(e) => {
                    warn!(
                        "Geocode cache at {} unavailable, continuing without it: {}",
                        config.cache.location, e
                    );
                    Arc::new(nominatim)
                }
            }
        } else {
            Arc::new(nominatim)
        };

        let completion = Arc::new(ChatCompletionClient::new(&config.completion)?);
        let resolver = GeocodingResolver::new(geocoder, &config.geocoding);
        Ok(Self::new(completion, resolver))
    }

    #[must_use]
    pub fn completion(&self) -> &Arc<dyn CompletionProvider> {
        &self.completion
    }

    /// Generate the itinerary for `session` unless `run_key` already ran.
    ///
    /// Fails when the destination cannot be located or the completion fails.
    /// The key is recorded only after a successful run, so a failed run can
    /// be retried with the same key.
    #[instrument(skip(self, session), fields(destination = %session.request.destination))]
    pub async fn plan_itinerary(
        &self,
        session: &mut TripSession,
        run_key: &RunKey,
    ) -> Result<PlanOutcome> {
        if session.last_run.as_ref() == Some(run_key) {
            info!("Itinerary for {} already generated", run_key);
            return Ok(PlanOutcome::AlreadyGenerated);
        }

        let anchor = self.ensure_destination(session).await?;
        let TripRequest { destination, days } = session.request.clone();

        let text = self
            .completion
            .complete(&prompts::itinerary_prompt(&destination, days))
            .await
            .map_err(|e| LaWanderError::completion(format!("{e:#}")))?;

        let mentioned_places = PlaceExtractor::extract(&text);
        let descriptions = DescriptionSynthesizer::synthesize(&text, &mentioned_places);
        let resolution = self
            .resolver
            .resolve_places(&mentioned_places, &descriptions, Some(&anchor), &destination)
            .await;

        session.merge(resolution.markers);
        session.last_run = Some(run_key.clone());

        let html = format!(
            "{}{}",
            prompts::itinerary_intro(&destination, days),
            format_itinerary_html(&text, &resolution.found_places)
        );

        info!(
            "Itinerary generated: {} mentions, {} located",
            mentioned_places.len(),
            resolution.found_places.len()
        );
        Ok(PlanOutcome::Generated(ItineraryReply {
            html,
            mentioned_places,
            found_places: resolution.found_places,
            markers: session.all_markers(),
        }))
    }

    /// Answer a free-form question about the trip and map the places it names.
    ///
    /// A reply without mentions still comes back formatted, with an empty
    /// `mentioned_places`.
    #[instrument(skip(self, session), fields(destination = %session.request.destination))]
    pub async fn answer_question(
        &self,
        session: &mut TripSession,
        question: &str,
    ) -> Result<AnswerReply> {
        let question = question.trim();
        if question.is_empty() {
            return Err(LaWanderError::validation("Question cannot be empty"));
        }

        // Answers are still useful without a map, so a missing anchor is not fatal
        let anchor = match self.ensure_destination(session).await {
            Ok(anchor) => Some(anchor),
            Err(e) => {
                warn!("Answering without destination anchor: {}", e);
                None
            }
        };
        let TripRequest { destination, days } = session.request.clone();

        let text = self
            .completion
            .complete(&prompts::question_prompt(&destination, days, question))
            .await
            .map_err(|e| LaWanderError::completion(format!("{e:#}")))?;

        let mentioned_places = PlaceExtractor::extract(&text);
        if mentioned_places.is_empty() {
            info!("Reply mentions no places");
        }
        let descriptions = DescriptionSynthesizer::synthesize(&text, &mentioned_places);
        let resolution = self
            .resolver
            .resolve_places(&mentioned_places, &descriptions, anchor.as_ref(), &destination)
            .await;

        session.merge(resolution.markers);

        Ok(AnswerReply {
            html: format_message_text(&text, &resolution.found_places),
            mentioned_places,
            found_places: resolution.found_places,
            markers: session.all_markers(),
        })
    }

    async fn ensure_destination(&self, session: &mut TripSession) -> Result<Coordinates> {
        if let Some(anchor) = session.anchor() {
            return Ok(anchor);
        }

        let destination = session.request.destination.clone();
        let located = match self.resolver.locate_destination(&destination).await {
            Ok(located) => located,
            Err(e) => {
                warn!("Destination lookup for '{}' failed: {:#}", destination, e);
                None
            }
        };
        let marker = located.ok_or_else(|| LaWanderError::destination_not_found(&destination))?;

        let anchor = marker.position;
        session.destination = Some(marker);
        Ok(anchor)
    }
}
