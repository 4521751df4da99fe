//! Endpoint handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::Response;
use serde::Serialize;

use super::{ApiState, json_response, json_response_with_status};
use crate::decode::GameStateAttributes;
use crate::inference::BossPhaseState;
use crate::observability::metrics;
use crate::poller::Cache;

/// Message returned by `/api/stats` before the first accepted tick.
pub const NO_GAME_DATA: &str = "No game data available";

#[derive(Serialize)]
struct Snapshot<'a> {
    error: Option<&'static str>,
    #[serde(flatten)]
    cache: &'a Cache,
}

#[derive(Serialize)]
struct Stats<'a> {
    error: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a GameStateAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bosses: Option<&'a BossPhaseState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_update: Option<String>,
}

#[derive(Serialize)]
struct Ack {
    error: Option<&'static str>,
    status: &'static str,
    message: &'static str,
}

#[derive(Serialize)]
struct Miss {
    error: &'static str,
    method: String,
    path: String,
}

fn full_snapshot(state: &ApiState) -> Response {
    let cache = state.handle.snapshot();
    json_response(&Snapshot {
        error: None,
        cache: &cache,
    })
}

/// `GET /api/status`
pub(super) async fn status(State(state): State<Arc<ApiState>>) -> Response {
    metrics::record_api_request("status");
    full_snapshot(&state)
}

/// `GET /game_state`: same payload as `/api/status`.
pub(super) async fn game_state(State(state): State<Arc<ApiState>>) -> Response {
    metrics::record_api_request("game_state");
    full_snapshot(&state)
}

/// `GET /api/stats`
pub(super) async fn stats(State(state): State<Arc<ApiState>>) -> Response {
    metrics::record_api_request("stats");
    let cache = state.handle.snapshot();
    let body = match cache.stats.as_ref() {
        Some(stats) => Stats {
            error: None,
            stats: Some(stats),
            bosses: cache.bosses.as_ref(),
            last_update: cache.last_update.map(|t| t.to_rfc3339()),
        },
        None => Stats {
            error: Some(NO_GAME_DATA),
            stats: None,
            bosses: None,
            last_update: None,
        },
    };
    json_response(&body)
}

/// `GET /api/reset-cache`
pub(super) async fn reset_cache(State(state): State<Arc<ApiState>>) -> Response {
    metrics::record_api_request("reset_cache");
    state.handle.reset_cache();
    json_response(&Ack {
        error: None,
        status: "ok",
        message: "cache cleared; inference will bootstrap on the next tick",
    })
}

/// `GET /api/reset-mb-cache`
pub(super) async fn reset_mb_cache(State(state): State<Arc<ApiState>>) -> Response {
    metrics::record_api_request("reset_mb_cache");
    state.handle.reset_boss_state();
    json_response(&Ack {
        error: None,
        status: "ok",
        message: "final boss phase flags cleared",
    })
}

/// Fallback for paths with no route.
pub(super) async fn not_found(method: Method, uri: Uri) -> Response {
    json_response_with_status(
        StatusCode::NOT_FOUND,
        &Miss {
            error: "not found",
            method: method.to_string(),
            path: uri.path().to_string(),
        },
    )
}

/// Fallback for known paths requested with an unsupported method.
pub(super) async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    json_response_with_status(
        StatusCode::METHOD_NOT_ALLOWED,
        &Miss {
            error: "method not allowed",
            method: method.to_string(),
            path: uri.path().to_string(),
        },
    )
}
