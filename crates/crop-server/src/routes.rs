//! HTTP handlers. The only place typed pipeline errors become responses.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use crop_core::{PipelineError, Prediction, Predictor, Submission, ValidationError};
use crop_store::SubmissionStore;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::render;

const DEFAULT_HISTORY: usize = 20;
const MAX_HISTORY: usize = 500;

/// Form keys of the integer-typed measurements.
const INTEGER_KEYS: [&str; 3] = ["N", "P", "K"];

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<Predictor>,
    pub store: Arc<SubmissionStore>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict_form))
        .route("/api/predict", post(predict_json))
        .route("/api/submissions", get(submissions))
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("{0}")]
    Prediction(String),
    #[error("{0}")]
    History(String),
}

impl From<PipelineError> for RequestError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => RequestError::Invalid(e),
            other => RequestError::Prediction(other.to_string()),
        }
    }
}

impl RequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RequestError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::Prediction(_) | RequestError::History(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        match self {
            RequestError::Invalid(ValidationError::OutOfRange("nitrogen")) => {
                "Invalid value for Nitrogen content.".to_string()
            }
            RequestError::Invalid(ValidationError::OutOfRange("ph")) => "Invalid value for PH level.".to_string(),
            RequestError::Invalid(ValidationError::OutOfRange(field)) => format!("Invalid value for {field}."),
            RequestError::Invalid(ValidationError::MalformedInput(field)) => {
                format!("Missing or malformed value for {field}.")
            }
            RequestError::Prediction(cause) => format!("An error occurred during prediction: {cause}"),
            RequestError::History(cause) => format!("Submission history unavailable: {cause}"),
        }
    }

    fn log(&self) {
        match self {
            RequestError::Invalid(e) => warn!(field = e.field(), error = %e, "rejected input"),
            other => error!(error = %other, "request failed"),
        }
    }
}

/// Error rendered as an HTML page.
#[derive(Debug)]
pub struct PageError(pub RequestError);

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        (self.0.status(), Html(render::error_page(&self.0.message()))).into_response()
    }
}

/// Error rendered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError(pub RequestError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.log();
        (self.0.status(), Json(json!({ "error": self.0.message() }))).into_response()
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub async fn home() -> Html<&'static str> {
    Html(render::HOME_PAGE)
}

pub async fn predict_form(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, PageError> {
    let prediction = run_prediction(&state, fields).await.map_err(PageError)?;
    Ok(Html(render::output_page(&prediction.crops)))
}

pub async fn predict_json(
    State(state): State<AppState>,
    Json(body): Json<HashMap<String, Value>>,
) -> Result<Json<Prediction>, ApiError> {
    let fields = body
        .into_iter()
        .filter_map(|(k, v)| json_field(&k, v).map(|s| (k, s)))
        .collect();
    let prediction = run_prediction(&state, fields).await.map_err(ApiError)?;
    Ok(Json(prediction))
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn submissions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).min(MAX_HISTORY);
    let store = Arc::clone(&state.store);
    let rows = tokio::task::spawn_blocking(move || store.recent(limit))
        .await
        .map_err(|e| ApiError(RequestError::History(e.to_string())))?
        .map_err(|e| ApiError(RequestError::History(e.to_string())))?;
    Ok(Json(rows))
}

/// Render one JSON value as the form string `validate` expects. Whole-valued
/// floats such as `90.0` are accepted for the integer fields.
fn json_field(key: &str, value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) if INTEGER_KEYS.contains(&key) && !n.is_i64() && !n.is_u64() => {
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => Some(format!("{f:.0}")),
                _ => Some(n.to_string()),
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// Validation, SQLite and the centroid scan are synchronous.
async fn run_prediction(state: &AppState, fields: HashMap<String, String>) -> Result<Prediction, RequestError> {
    let predictor = Arc::clone(&state.predictor);
    tokio::task::spawn_blocking(move || predictor.predict(&fields))
        .await
        .map_err(|e| RequestError::Prediction(e.to_string()))?
        .map_err(RequestError::from)
}
