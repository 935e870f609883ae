use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::{
    LaWanderError,
    models::Marker,
    planner::{AnswerReply, ItineraryPlanner, ItineraryReply, PlanOutcome, TripRequest, TripSession},
    prompts,
};

/// Shared state behind every route
pub struct AppState {
    planner: ItineraryPlanner,
    sessions: RwLock<HashMap<u64, Arc<Mutex<TripSession>>>>,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(planner: ItineraryPlanner) -> Self {
        Self {
            planner,
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    async fn session(&self, id: u64) -> Result<Arc<Mutex<TripSession>>, ApiError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("Unknown trip {id}")))
    }
}

pub type SharedState = Arc<AppState>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<LaWanderError> for ApiError {
    fn from(error: LaWanderError) -> Self {
        let status = match &error {
            LaWanderError::Validation { .. } => StatusCode::BAD_REQUEST,
            LaWanderError::DestinationNotFound { .. } => StatusCode::NOT_FOUND,
            LaWanderError::Api { .. } | LaWanderError::Completion { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, error.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripCreated {
    pub trip_id: u64,
    pub run_key: String,
}

#[derive(Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItineraryResponse {
    Generated {
        #[serde(flatten)]
        reply: ItineraryReply,
    },
    AlreadyGenerated,
    /// Generation failed; `message` is what the user should see instead
    Fallback { message: String },
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/trips", post(create_trip))
        .route("/trips/{id}/itinerary", post(plan_itinerary))
        .route("/trips/{id}/questions", post(ask_question))
        .route("/trips/{id}/markers", get(get_markers))
        .with_state(state)
}

/// Plain completion passthrough for the chat box
async fn chat(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if payload.message.trim().is_empty() {
        return Err(LaWanderError::validation("Message cannot be empty").into());
    }
    let reply = state
        .planner
        .completion()
        .complete(&payload.message)
        .await
        .map_err(|e| {
            tracing::error!("Chat completion failed: {:#}", e);
            ApiError::new(StatusCode::BAD_GATEWAY, prompts::CONNECTION_TROUBLE_MESSAGE)
        })?;
    Ok(Json(ChatResponse { reply }))
}

async fn create_trip(
    State(state): State<SharedState>,
    Json(payload): Json<TripRequest>,
) -> Result<(StatusCode, Json<TripCreated>), ApiError> {
    let request = TripRequest::new(payload.destination, payload.days)?;
    let run_key = request.run_key().to_string();
    let id = state.next_id.fetch_add(1, Ordering::Relaxed);

    state
        .sessions
        .write()
        .await
        .insert(id, Arc::new(Mutex::new(TripSession::new(request))));

    tracing::info!("Created trip {} ({})", id, run_key);
    Ok((
        StatusCode::CREATED,
        Json(TripCreated {
            trip_id: id,
            run_key,
        }),
    ))
}

async fn plan_itinerary(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<ItineraryResponse>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let run_key = session.request().run_key();

    let response = match state.planner.plan_itinerary(&mut session, &run_key).await {
        Ok(PlanOutcome::Generated(reply)) => ItineraryResponse::Generated { reply },
        Ok(PlanOutcome::AlreadyGenerated) => ItineraryResponse::AlreadyGenerated,
        Err(LaWanderError::DestinationNotFound { .. }) => {
            let request = session.request();
            ItineraryResponse::Fallback {
                message: prompts::welcome_message(&request.destination, request.days),
            }
        }
        Err(LaWanderError::Completion { message }) => {
            tracing::warn!("Itinerary generation failed: {}", message);
            ItineraryResponse::Fallback {
                message: prompts::FALLBACK_ITINERARY_MESSAGE.to_string(),
            }
        }
        Err(e) => return Err(e.into()),
    };
    Ok(Json(response))
}

async fn ask_question(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
    Json(payload): Json<QuestionRequest>,
) -> Result<Json<AnswerReply>, ApiError> {
    let session = state.session(id).await?;
    let mut session = session.lock().await;
    let reply = state
        .planner
        .answer_question(&mut session, &payload.question)
        .await?;
    Ok(Json(reply))
}

async fn get_markers(
    State(state): State<SharedState>,
    Path(id): Path<u64>,
) -> Result<Json<Vec<Marker>>, ApiError> {
    let session = state.session(id).await?;
    let markers = session.lock().await.all_markers();
    Ok(Json(markers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionProvider;
    use crate::config::GeocodingConfig;
    use crate::geocoding::{Geocoder, GeocodingResolver};
    use crate::models::GeocodeHit;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct EchoCompletion;

    #[async_trait]
    impl CompletionProvider for EchoCompletion {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            if prompt.contains("Atlantis") && prompt.starts_with("Create") {
                anyhow::bail!("model overloaded");
            }
            Ok("Day 1: Center\n- **Town Hall** - concerts.".to_string())
        }
    }

    struct CityGeocoder;

    #[async_trait]
    impl Geocoder for CityGeocoder {
        async fn search(&self, query: &str, _limit: u32) -> anyhow::Result<Vec<GeocodeHit>> {
            if query.contains("Nowhere") {
                return Ok(Vec::new());
            }
            Ok(vec![GeocodeHit {
                latitude: 54.6872,
                longitude: 25.2797,
                display_name: format!("{query}, Lithuania"),
            }])
        }
    }

    struct OfflineGeocoder;

    #[async_trait]
    impl Geocoder for OfflineGeocoder {
        async fn search(&self, _query: &str, _limit: u32) -> anyhow::Result<Vec<GeocodeHit>> {
            anyhow::bail!("connection refused")
        }
    }

    fn app() -> Router {
        app_with(Arc::new(CityGeocoder))
    }

    fn app_with(geocoder: Arc<dyn Geocoder>) -> Router {
        let resolver = GeocodingResolver::new(geocoder, &GeocodingConfig::default());
        let planner = ItineraryPlanner::new(Arc::new(EchoCompletion), resolver);
        router(Arc::new(AppState::new(planner)))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_trip_lifecycle() {
        let app = app();

        let (status, created) =
            send(&app, "POST", "/trips", json!({"destination": " Vilnius ", "days": 2})).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["runKey"], "vilnius|2");
        let id = created["tripId"].as_u64().unwrap();

        let (status, first) = send(&app, "POST", &format!("/trips/{id}/itinerary"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["status"], "generated");
        assert_eq!(first["foundPlaces"], json!(["Town Hall"]));

        let (_, second) = send(&app, "POST", &format!("/trips/{id}/itinerary"), Value::Null).await;
        assert_eq!(second["status"], "alreadyGenerated");

        let (status, markers) = send(&app, "GET", &format!("/trips/{id}/markers"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(markers[0]["type"], "destination");
        assert_eq!(markers[1]["placeName"], "Town Hall");
    }

    #[tokio::test]
    async fn test_completion_failure_yields_fallback_text() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/trips", json!({"destination": "Atlantis", "days": 1})).await;
        let id = created["tripId"].as_u64().unwrap();

        let (status, body) = send(&app, "POST", &format!("/trips/{id}/itinerary"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fallback");
        assert_eq!(body["message"], prompts::FALLBACK_ITINERARY_MESSAGE);
    }

    #[tokio::test]
    async fn test_unknown_destination_yields_welcome() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/trips", json!({"destination": "Nowhere", "days": 3})).await;
        let id = created["tripId"].as_u64().unwrap();

        let (_, body) = send(&app, "POST", &format!("/trips/{id}/itinerary"), Value::Null).await;
        assert_eq!(body["status"], "fallback");
        assert_eq!(body["message"], prompts::welcome_message("Nowhere", 3));
    }

    #[tokio::test]
    async fn test_unreachable_geocoder_yields_welcome() {
        let app = app_with(Arc::new(OfflineGeocoder));
        let (_, created) =
            send(&app, "POST", "/trips", json!({"destination": "Vilnius", "days": 2})).await;
        let id = created["tripId"].as_u64().unwrap();

        let (status, body) = send(&app, "POST", &format!("/trips/{id}/itinerary"), Value::Null).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "fallback");
        assert_eq!(body["message"], prompts::welcome_message("Vilnius", 2));
    }

    #[tokio::test]
    async fn test_invalid_trip_and_unknown_id() {
        let app = app();
        let (status, body) = send(&app, "POST", "/trips", json!({"destination": "", "days": 2})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Destination"));

        let (status, _) = send(&app, "GET", "/trips/99/markers", Value::Null).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_question_and_chat() {
        let app = app();
        let (_, created) =
            send(&app, "POST", "/trips", json!({"destination": "Vilnius", "days": 2})).await;
        let id = created["tripId"].as_u64().unwrap();

        let (status, reply) = send(
            &app,
            "POST",
            &format!("/trips/{id}/questions"),
            json!({"question": "What to see?"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["mentionedPlaces"], json!(["Town Hall"]));

        let (status, chat) = send(&app, "POST", "/chat", json!({"message": "hello"})).await;
        assert_eq!(status, StatusCode::OK);
        assert!(chat["reply"].as_str().unwrap().contains("Town Hall"));
    }
}
