//! HTTP boundary: request validation, dispatch into the pipeline, and
//! response shaping.

use crate::assets::AssetStore;
use crate::error::PredictionError;
use crate::metrics::ServiceMetrics;
use crate::pipeline;
use crate::schema;
use crate::types::{PredictionResponse, RawRecord};
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Shared per-process state: the loaded assets (None when loading failed at
/// startup, so readiness can be reported) and the metrics collector.
#[derive(Clone)]
pub struct AppState {
    assets: Option<Arc<AssetStore>>,
    metrics: Arc<ServiceMetrics>,
}

impl AppState {
    pub fn new(assets: Option<Arc<AssetStore>>, metrics: Arc<ServiceMetrics>) -> Self {
        Self { assets, metrics }
    }

    pub fn is_ready(&self) -> bool {
        self.assets.is_some()
    }

    /// The loaded store, or NotInitialized before any transform runs.
    pub fn assets(&self) -> Result<&AssetStore, PredictionError> {
        self.assets
            .as_deref()
            .ok_or(PredictionError::NotInitialized)
    }
}

/// Names from the required input set absent from the request object.
pub fn missing_fields(body: &serde_json::Map<String, Value>) -> Vec<String> {
    schema::USER_INPUT_COLUMNS
        .iter()
        .filter(|col| !body.contains_key(**col))
        .map(|col| col.to_string())
        .collect()
}

/// Build the router with CORS restricted to the configured origin.
pub fn router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
        Err(_) => {
            warn!(origin = %cors_origin, "Invalid CORS origin, denying cross-origin requests");
            CorsLayer::new()
        }
    };

    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

impl IntoResponse for PredictionError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = match &self {
            PredictionError::MissingFields { missing } => json!({
                "error": "Missing required features in input data",
                "missing": missing,
            }),
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

async fn predict(State(state): State<AppState>, body: Option<Json<Value>>) -> Response {
    let started = Instant::now();
    let request_id = Uuid::new_v4();

    let result = run_prediction(&state, body);
    match result {
        Ok(response) => {
            let elapsed = started.elapsed();
            state.metrics.record_prediction(
                elapsed,
                &response.prediction_label,
                response.probability_of_disease,
            );
            info!(
                request_id = %request_id,
                prediction = %response.prediction_label,
                probability = response.probability_of_disease,
                elapsed_us = elapsed.as_micros(),
                "Prediction served"
            );
            Json(response).into_response()
        }
        Err(e) => {
            state.metrics.record_failure();
            if e.is_client_error() {
                info!(request_id = %request_id, error = %e, "Request rejected");
            } else {
                error!(request_id = %request_id, error = %e, "Prediction failed");
            }
            e.into_response()
        }
    }
}

/// Validate the request body and run the pipeline. Validation happens
/// before any transform: missing fields reject the request with zero
/// pipeline invocation.
fn run_prediction(
    state: &AppState,
    body: Option<Json<Value>>,
) -> Result<PredictionResponse, PredictionError> {
    let Json(body) = body.ok_or_else(|| {
        PredictionError::Validation("request body must be a JSON object".to_string())
    })?;
    let object = body
        .as_object()
        .ok_or_else(|| PredictionError::Validation("request body must be a JSON object".to_string()))?;

    let missing = missing_fields(object);
    if !missing.is_empty() {
        return Err(PredictionError::MissingFields { missing });
    }

    let record: RawRecord = serde_json::from_value(body.clone())
        .map_err(|e| PredictionError::Validation(e.to_string()))?;

    let assets = state.assets()?;
    let prediction = pipeline::run(assets, &record)?;
    Ok(PredictionResponse::from(prediction))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "ready": state.is_ready(),
        "timestamp": Utc::now(),
    }))
}
