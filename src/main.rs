// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Comment Gate Service
//!
//! Rate limits comment submissions for the comment board:
//!
//! - 3 comments per visitor, then a 10 minute ban (default)
//! - Visitors keyed by client IP or by the `user_key` cookie
//! - Signed-in users exempt
//!
//! ## Usage
//!
//! 1. **External check**: the comment board calls `/check` with the
//!    visitor's IP or token before saving a comment.
//!
//! 2. **Direct mode**: submissions are sent through `/submit`, which resolves
//!    the visitor from the request and sets the token cookie.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `IDENTITY_STRATEGY`: `ip` or `token` (default: ip)
//! - `COMMENT_LIMIT`: Comments allowed before a ban (default: 3)
//! - `BAN_DURATION_SECS`: Ban length in seconds (default: 600)
//! - `SESSION_TTL_SECS`: Idle lifetime of rate state, at least the ban length
//!   (default: 1209600)
//! - `SESSION_COOKIE_SECURE`: Mark the token cookie Secure (default: false)
//! - `AUTH_HEADER`: Header marking signed-in users (default: x-authenticated-user)
//! - `METRICS_ENABLED`: Serve Prometheus metrics (default: true)

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use comment_gate::{
    clock::SystemClock,
    config::Config,
    handlers::{router, AppState},
    metrics::Metrics,
    CommentGate, CommentLimiter, MemoryStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        strategy = %config.rate_limit.strategy,
        threshold = config.rate_limit.threshold,
        ban_secs = config.rate_limit.ban_secs,
        "Starting comment gate"
    );

    // Create application state
    let store = Arc::new(MemoryStore::new(config.session.ttl()));
    let limiter = CommentLimiter::new(
        config.rate_limit.clone(),
        store.clone(),
        Arc::new(SystemClock),
    );

    let state = Arc::new(AppState {
        gate: CommentGate::new(limiter),
        metrics: Metrics::new()?,
        config: config.clone(),
    });

    // Spawn cleanup task
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            store.cleanup().await;
        }
    });

    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    let mut config = Config::default();

    if let Ok(addr) = std::env::var("BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(strategy) = std::env::var("IDENTITY_STRATEGY") {
        match strategy.parse() {
            Ok(strategy) => config.rate_limit.strategy = strategy,
            Err(err) => warn!(error = %err, "Ignoring IDENTITY_STRATEGY"),
        }
    }
    if let Some(threshold) = env_parse("COMMENT_LIMIT") {
        config.rate_limit.threshold = threshold;
    }
    if let Some(ban_secs) = env_parse("BAN_DURATION_SECS") {
        config.rate_limit.ban_secs = ban_secs;
    }
    if let Some(ttl_secs) = env_parse("SESSION_TTL_SECS") {
        config.session.ttl_secs = ttl_secs;
    }
    if let Some(secure) = env_parse("SESSION_COOKIE_SECURE") {
        config.session.secure_cookie = secure;
    }
    if let Ok(header) = std::env::var("AUTH_HEADER") {
        config.session.auth_header = header.to_ascii_lowercase();
    }
    if let Some(enabled) = env_parse("METRICS_ENABLED") {
        config.metrics.enabled = enabled;
    }

    config.validated()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
