//! API request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SpamError};
use crate::spam::{combine_title_and_message, ModelBundle, SpamDetector};

/// Shared application state
///
/// The model bundle is installed once and read without locking afterwards.
#[derive(Default)]
pub struct AppState {
    detector: OnceLock<SpamDetector>,
}

impl AppState {
    /// State with no model installed yet
    pub fn new() -> Self {
        Self::default()
    }

    /// State with a loaded bundle
    pub fn with_bundle(bundle: Arc<ModelBundle>) -> Self {
        let state = Self::new();
        let _ = state.detector.set(SpamDetector::new(bundle));
        state
    }

    /// Install the bundle; a bundle can only be installed once
    pub fn install(&self, bundle: Arc<ModelBundle>) -> Result<()> {
        self.detector
            .set(SpamDetector::new(bundle))
            .map_err(|_| SpamError::Internal("Model bundle already installed".to_string()))
    }

    pub fn detector(&self) -> Option<&SpamDetector> {
        self.detector.get()
    }

    pub fn model_loaded(&self) -> bool {
        self.detector.get().is_some()
    }

    /// Vectorizer and classifier are installed as one bundle
    pub fn vectorizer_loaded(&self) -> bool {
        self.model_loaded()
    }
}

/// Mail check request body
#[derive(Debug, Deserialize)]
pub struct CheckMailRequest {
    /// Email title/subject
    #[serde(default)]
    pub title: Option<String>,
    /// Email message/body
    pub message: String,
}

/// Mail check response
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckMailResponse {
    pub prediction: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub vectorizer_loaded: bool,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

impl IntoResponse for SpamError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            debug!("Request rejected: {}", self);
        }

        match &self {
            SpamError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(ApiError::new(msg))).into_response()
            }
            SpamError::RateLimitExceeded {
                retry_after_secs, ..
            } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ApiError::new(&self.to_string())),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(*retry_after_secs));
                response
            }
            SpamError::ModelNotLoaded => {
                warn!("Request rejected: model bundle not loaded");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiError::new("Model not loaded")),
                )
                    .into_response()
            }
            _ => {
                error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new("Internal server error")),
                )
                    .into_response()
            }
        }
    }
}

/// GET / - Liveness message
pub async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Spam Detection API is running".to_string(),
    })
}

/// GET /health - Report artifact load state without touching the classifier
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.model_loaded(),
        vectorizer_loaded: state.vectorizer_loaded(),
    })
}

/// POST /check-mail - Classify a title + message pair
pub async fn check_mail(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<CheckMailRequest>, JsonRejection>,
) -> Result<Json<CheckMailResponse>> {
    let Json(req) = payload.map_err(|rejection| SpamError::InvalidInput(rejection.body_text()))?;

    if req.message.is_empty() {
        return Err(SpamError::InvalidInput(
            "message must contain at least 1 character".to_string(),
        ));
    }

    let detector = state.detector().ok_or(SpamError::ModelNotLoaded)?;

    let text = combine_title_and_message(req.title.as_deref().unwrap_or(""), &req.message);
    let result = detector.predict(&text)?;

    info!(
        "check-mail: {} ({} chars{})",
        result.label,
        text.len(),
        result
            .confidence
            .map(|c| format!(", confidence {:.3}", c))
            .unwrap_or_default()
    );

    Ok(Json(CheckMailResponse {
        prediction: result.score,
        message: result.label.to_string(),
        confidence: result.confidence,
    }))
}
