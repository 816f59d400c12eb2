// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the comment gate service.
//!
//! The gate can be consulted two ways: the comment board posts the visitor's
//! identity to `/check`, or submissions pass through `/submit` and the
//! service resolves the identity from the request itself.

use crate::config::Config;
use crate::error::GateError;
use crate::gate::{CommentGate, GateOutcome, GateRequest};
use crate::identity::{client_ip, cookie_value, format_set_cookie};
use crate::limiter::{RateLimitReason, RateLimitResult};
use crate::metrics::Metrics;
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

const GENERIC_ERROR_MESSAGE: &str = "Could not process request";

/// Gate verdicts and tokens belong to one visitor and must not be cached.
const GATE_CACHE_CONTROL: &str = "private, no-store";

/// Shared application state.
pub struct AppState {
    pub gate: CommentGate,
    pub metrics: Metrics,
    pub config: Config,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Gate check request from the comment board.
#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub authenticated: bool,
}

/// Gate check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    /// Token the caller must set back as the `user_key` cookie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Accepted submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub message: &'static str,
    pub remaining: u32,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let gate_routes = Router::new()
        .route("/check", post(check))
        .route("/submit", post(submit))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(GATE_CACHE_CONTROL),
        ));

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .merge(gate_routes);

    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "comment-gate",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus metrics endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Check whether a comment submission may proceed.
///
/// The comment board calls this before persisting a comment. Denials are
/// reported with status 200 so the caller can read the body.
pub async fn check(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CheckRequest>,
) -> Response {
    debug!(
        ip = ?req.ip,
        has_token = req.token.is_some(),
        authenticated = req.authenticated,
        "Processing gate check"
    );

    let request = GateRequest {
        client_ip: req.ip.as_deref(),
        user_key: req.token.as_deref(),
        authenticated: req.authenticated,
    };

    let outcome = match evaluate(&state, request).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    let body = match outcome.result {
        RateLimitResult::Allowed { remaining } => CheckResponse {
            allowed: true,
            reason: None,
            retry_after_secs: None,
            remaining: Some(remaining),
            token: outcome.user_key,
        },
        RateLimitResult::Limited {
            reason,
            retry_after,
        } => CheckResponse {
            allowed: false,
            reason: Some(reason.to_string()),
            retry_after_secs: (reason != RateLimitReason::StoreUnavailable)
                .then(|| retry_after.as_secs()),
            remaining: None,
            token: outcome.user_key,
        },
    };

    (StatusCode::OK, Json(body)).into_response()
}

/// Gate a comment submission sent directly through the service.
///
/// Resolves the identity from `X-Forwarded-For`, the peer address and the
/// `user_key` cookie. With the token strategy the rewritten token is always
/// set back on the client.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Response {
    let session = &state.config.session;
    let ip = client_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let authenticated = headers
        .get(session.auth_header.as_str())
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().is_empty());

    let request = GateRequest {
        client_ip: ip.as_deref(),
        user_key: cookie_value(&headers, &session.cookie_name),
        authenticated,
    };

    let outcome = match evaluate(&state, request).await {
        Ok(outcome) => outcome,
        Err(response) => return response,
    };

    let mut response = match outcome.result {
        RateLimitResult::Allowed { remaining } => (
            StatusCode::OK,
            Json(SubmitResponse {
                message: "Comment accepted",
                remaining,
            }),
        )
            .into_response(),
        RateLimitResult::Limited {
            reason: RateLimitReason::StoreUnavailable,
            ..
        } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: GENERIC_ERROR_MESSAGE.to_string(),
                code: "STORE_UNAVAILABLE",
                retry_after_secs: None,
            }),
        )
            .into_response(),
        RateLimitResult::Limited { retry_after, .. } => {
            let retry_secs = retry_after.as_secs();
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(ErrorResponse {
                    error: rate_limited_message(retry_secs),
                    code: "RATE_LIMITED",
                    retry_after_secs: Some(retry_secs),
                }),
            )
                .into_response()
        }
    };

    if let Some(token) = outcome.user_key {
        let cookie = format_set_cookie(
            &session.cookie_name,
            &token,
            state.config.rate_limit.ban_secs,
            session.secure_cookie,
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => warn!(error = %err, "Token cookie is not a valid header value"),
        }
    }

    response
}

/// Denial text shown to the visitor, with the wait rounded up.
fn rate_limited_message(retry_secs: u64) -> String {
    let wait = if retry_secs < 60 {
        plural(retry_secs.max(1), "second")
    } else {
        plural(retry_secs.div_ceil(60), "minute")
    };
    format!("You can't add more comments. Try again in {wait}.")
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Run the gate and record the decision. Gate errors never expose their text.
async fn evaluate(
    state: &AppState,
    request: GateRequest<'_>,
) -> Result<GateOutcome, Response> {
    match state.gate.evaluate(request).await {
        Ok(outcome) => {
            state.metrics.observe(&outcome.result);
            if let RateLimitResult::Limited { reason, .. } = &outcome.result {
                info!(
                    ip = ?request.client_ip,
                    strategy = %state.gate.strategy(),
                    reason = %reason,
                    "Comment submission rate limited"
                );
            }
            Ok(outcome)
        }
        Err(err) => {
            let (status, code) = match &err {
                GateError::IdentityUnavailable => {
                    state.metrics.identity_failure();
                    (StatusCode::BAD_REQUEST, "IDENTITY_UNAVAILABLE")
                }
            };
            warn!(
                error = %err,
                strategy = %state.gate.strategy(),
                "Comment gate failed"
            );
            Err((
                status,
                Json(ErrorResponse {
                    error: GENERIC_ERROR_MESSAGE.to_string(),
                    code,
                    retry_after_secs: None,
                }),
            )
                .into_response())
        }
    }
}
