//! Inbound proxy endpoint.
//!
//! `POST /__openhub/proxy` authenticates the caller, decodes the
//! [`ProxyRequest`](openhub_proxy::ProxyRequest) and hands it to the
//! runtime's registered proxy handler.
//!
//! | condition                                   | status |
//! |---------------------------------------------|--------|
//! | no expected secret, or header absent/wrong  | 401    |
//! | no proxy handler registered                 | 501    |
//! | handler panicked (body carries the message) | 500    |
//! | otherwise (including `success: false`)      | 200    |

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use openhub_proxy::{panic_message, ProxyRequest, ProxyResponse, PROXY_PATH, SECRET_HEADER};

use crate::config::expected_secret;
use crate::runtime::Runtime;

/// Router serving the proxy endpoint for `runtime`.
///
/// Request bodies are unbounded: blob payloads of any size must pass.
pub fn proxy_router(runtime: Arc<Runtime>) -> Router {
    Router::new()
        .route(PROXY_PATH, post(handle_proxy))
        .layer(DefaultBodyLimit::disable())
        .with_state(runtime)
}

async fn handle_proxy(
    State(runtime): State<Arc<Runtime>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|value| value.to_str().ok());
    let authorized = match (expected_secret(runtime.config()), presented) {
        (Some(expected), Some(presented)) => expected.matches(presented),
        _ => false,
    };
    if !authorized {
        warn!("Rejected proxy request with missing or invalid secret");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    }

    let Some(handler) = runtime.get_proxy_handler() else {
        warn!("Proxy request received with no handler registered");
        return (StatusCode::NOT_IMPLEMENTED, "Proxy handler not configured").into_response();
    };

    let request: ProxyRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            debug!(error = %e, "Malformed proxy request body");
            return Json(ProxyResponse::failure(format!("Invalid proxy request: {}", e)))
                .into_response();
        }
    };

    match AssertUnwindSafe(handler.handle(request)).catch_unwind().await {
        Ok(response) => Json(response).into_response(),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Proxy handler panicked: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProxyResponse::failure(message)),
            )
                .into_response()
        }
    }
}
