//! HTTP front end serving the cache.
//!
//! Handlers only read the cache or take its lock for the administrative
//! resets; none of them touches the memory transport. Every response is a
//! JSON object with an explicit `error` field.

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{ConfigError, TrackerError};
use crate::poller::TrackerHandle;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8282";

/// Default CORS origin.
pub const DEFAULT_CORS_ORIGIN: &str = "*";

/// HTTP front end settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address to bind to, e.g. `"0.0.0.0:8282"`.
    pub bind_addr: String,
    /// Value of `Access-Control-Allow-Origin`.
    pub cors_origin: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

struct ApiState {
    handle: TrackerHandle,
    cors_origin: HeaderValue,
}

/// Builds the router.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] when the CORS origin is not a
/// valid header value.
pub fn build_router(handle: TrackerHandle, cors_origin: &str) -> Result<Router, ConfigError> {
    let cors_origin = HeaderValue::from_str(cors_origin).map_err(|_| ConfigError::InvalidValue {
        field: "http.cors_origin".to_string(),
        value: cors_origin.to_string(),
        expected: "a valid header value".to_string(),
    })?;
    let state = Arc::new(ApiState {
        handle,
        cors_origin,
    });

    Ok(Router::new()
        .route("/api/status", get(handlers::status))
        .route("/game_state", get(handlers::game_state))
        .route("/api/stats", get(handlers::stats))
        .route("/api/reset-cache", get(handlers::reset_cache))
        .route("/api/reset-mb-cache", get(handlers::reset_mb_cache))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(middleware::from_fn_with_state(Arc::clone(&state), cors))
        .with_state(state))
}

/// Binds the listener and serves until `cancel` fires.
///
/// Returns the bound address (useful when binding to port 0) and the
/// server task.
///
/// # Errors
///
/// Returns an error when the address or CORS origin is invalid or the
/// listener cannot bind.
pub async fn serve(
    config: &ApiConfig,
    handle: TrackerHandle,
    cancel: CancellationToken,
) -> Result<(SocketAddr, JoinHandle<()>), TrackerError> {
    let bind_addr = parse_bind_addr(&config.bind_addr)?;
    let router = build_router(handle, &config.cors_origin)?;

    let listener = TcpListener::bind(&bind_addr).await?;
    let bound_addr = listener.local_addr()?;

    let server = tokio::spawn(async move {
        info!(%bound_addr, "HTTP front end started");
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
        {
            error!(error = %e, "HTTP server failed");
        }
        debug!("HTTP front end shut down");
    });

    Ok((bound_addr, server))
}

/// Adds CORS headers and answers preflight requests.
async fn cors(State(state): State<Arc<ApiState>>, request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        state.cors_origin.clone(),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

/// Serializes `value` into a `200 OK` JSON response.
fn json_response<T: Serialize>(value: &T) -> Response {
    json_response_with_status(StatusCode::OK, value)
}

/// Serializes `value` into a JSON response with `status`.
///
/// Encoding failure turns into a `500` with a fixed JSON body.
fn json_response_with_status<T: Serialize>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                r#"{"error":"internal encoding error"}"#,
            )
                .into_response()
        }
    }
}

/// Parses a bind address string into a full `host:port` form.
///
/// Accepts:
/// - `:8282` → `0.0.0.0:8282`
/// - `8282` → `0.0.0.0:8282`
/// - `1.2.3.4:8282` → as-is
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if the result is not a socket address.
pub fn parse_bind_addr(input: &str) -> Result<String, ConfigError> {
    let addr = if input.starts_with(':') {
        format!("0.0.0.0{input}")
    } else if input.parse::<u16>().is_ok() {
        format!("0.0.0.0:{input}")
    } else {
        input.to_string()
    };
    addr.parse::<SocketAddr>()
        .map_err(|e| ConfigError::InvalidValue {
            field: "http.bind".to_string(),
            value: input.to_string(),
            expected: format!("host:port, :port or port ({e})"),
        })?;
    Ok(addr)
}
