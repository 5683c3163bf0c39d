// HTTP surface - one audio route plus the small operational endpoints.
//
// Request flow for /audio/:id: cache lookup, then the strategy runner on
// a miss, then the streaming relay; failures come back as structured JSON
// so an operator can diagnose without log access.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::cache::ResolutionCache;
use crate::errors::ResolveError;
use crate::extractor::{HelperStatus, StrategyRunner};
use crate::relay::{Relay, RelayError};

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ResolutionCache>,
    pub runner: Arc<StrategyRunner>,
    pub relay: Relay,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/audio/:id", get(get_audio))
        .route("/health", get(health))
        .route("/cache-stats", get(cache_stats))
        .route("/clear-cache", post(clear_cache))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    strategies_tried: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pot_helper: Option<HelperStatus>,
}

struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn from_resolve(err: ResolveError, video_id: &str) -> Self {
        let (status, code, strategies_tried, pot_helper) = match &err {
            ResolveError::AllStrategiesExhausted {
                attempts, helper, ..
            } => (
                StatusCode::FORBIDDEN,
                "all_strategies_exhausted",
                Some(*attempts),
                Some(*helper),
            ),
            ResolveError::InvalidInput(_) => {
                (StatusCode::BAD_REQUEST, "invalid_input", None, None)
            }
            ResolveError::ToolNotFound(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "extractor_missing",
                None,
                None,
            ),
            ResolveError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                None,
                None,
            ),
        };
        Self {
            status,
            body: ErrorBody {
                error: err.to_string(),
                code,
                video_id: video_id.to_string(),
                strategies_tried,
                pot_helper,
            },
        }
    }

    fn from_relay(err: RelayError, video_id: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ErrorBody {
                error: err.to_string(),
                code: "upstream_stream_failure",
                video_id: video_id.to_string(),
                strategies_tried: None,
                pot_helper: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct AudioQuery {
    /// When true, answer with a 307 to the resolved URL instead of
    /// relaying the bytes.
    #[serde(default)]
    redirect: bool,
}

async fn get_audio(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<AudioQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let started = Instant::now();

    let audio_url = match state.cache.lookup(&video_id) {
        Some(entry) => {
            tracing::info!(
                %video_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "cache hit"
            );
            entry.resolved_url
        }
        None => {
            let resolved = state
                .runner
                .resolve(&video_id)
                .await
                .map_err(|e| ApiError::from_resolve(e, &video_id))?;
            state.cache.store(&video_id, resolved.audio_url.clone());
            tracing::info!(
                %video_id,
                strategy = resolved.strategy,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "resolved and cached"
            );
            resolved.audio_url
        }
    };

    if query.redirect {
        return Ok(Redirect::temporary(&audio_url).into_response());
    }

    let caller_range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    state
        .relay
        .stream(&audio_url, caller_range)
        .await
        .map_err(|e| {
            tracing::error!(%video_id, error = %e, "relay failed");
            ApiError::from_relay(e, &video_id)
        })
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
    cache_entries: usize,
    pot_helper: HelperStatus,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        cache_entries: state.cache.len(),
        pot_helper: state.runner.probe_helper().await,
    })
}

async fn cache_stats(State(state): State<AppState>) -> Json<crate::cache::CacheStats> {
    Json(state.cache.stats())
}

#[derive(Debug, Serialize)]
struct ClearBody {
    cleared: usize,
}

async fn clear_cache(State(state): State<AppState>) -> Json<ClearBody> {
    let cleared = state.cache.clear();
    tracing::info!(cleared, "cache cleared");
    Json(ClearBody { cleared })
}
