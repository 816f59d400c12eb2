// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the comment gate.
//!
//! Defaults mirror the comment board's posting policy: three comments,
//! then a ten minute ban.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Name of the cookie carrying the visitor token.
pub const USER_KEY_COOKIE: &str = "user_key";

/// Configuration for the comment gate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Visitor session configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// How a visitor is keyed for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityStrategy {
    /// Key on the client IP resolved from proxy headers or the peer address.
    IpBased,
    /// Key on the `user_key` cookie, which also carries the attempt counter.
    TokenBased,
}

impl fmt::Display for IdentityStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IpBased => write!(f, "ip_based"),
            Self::TokenBased => write!(f, "token_based"),
        }
    }
}

impl FromStr for IdentityStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ip" | "ip_based" => Ok(Self::IpBased),
            "token" | "token_based" => Ok(Self::TokenBased),
            other => Err(format!("unknown identity strategy: {other}")),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Identity derivation strategy (default: ip_based)
    #[serde(default = "default_strategy")]
    pub strategy: IdentityStrategy,

    /// Attempts allowed before a ban is imposed (default: 3)
    #[serde(default = "default_threshold")]
    pub threshold: u32,

    /// Ban length in seconds (default: 600)
    #[serde(default = "default_ban_secs")]
    pub ban_secs: u64,
}

/// Visitor session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie holding the visitor token (default: user_key)
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Idle lifetime of stored rate state in seconds (default: two weeks)
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,

    /// How often idle state is purged, in seconds (default: 60)
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Mark the token cookie `Secure` (default: false)
    #[serde(default)]
    pub secure_cookie: bool,

    /// Header set by the trusted upstream for signed-in users
    /// (default: x-authenticated-user)
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable Prometheus metrics endpoint (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path (default: /metrics)
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_strategy() -> IdentityStrategy {
    IdentityStrategy::IpBased
}

fn default_threshold() -> u32 {
    3
}

fn default_ban_secs() -> u64 {
    600 // 10 minutes
}

fn default_cookie_name() -> String {
    USER_KEY_COOKIE.to_string()
}

fn default_session_ttl_secs() -> u64 {
    1_209_600 // two weeks
}

fn default_cleanup_interval_secs() -> u64 {
    60
}

fn default_auth_header() -> String {
    "x-authenticated-user".to_string()
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            rate_limit: RateLimitConfig::default(),
            session: SessionConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            threshold: default_threshold(),
            ban_secs: default_ban_secs(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            secure_cookie: false,
            auth_header: default_auth_header(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: default_metrics_path(),
        }
    }
}

impl Config {
    /// Fix up settings that contradict each other.
    ///
    /// Stored state must outlive a ban, otherwise an idle store forgets the
    /// ban early. A shorter session lifetime is raised to the ban length.
    pub fn validated(mut self) -> Self {
        if self.session.ttl_secs < self.rate_limit.ban_secs {
            warn!(
                ttl_secs = self.session.ttl_secs,
                ban_secs = self.rate_limit.ban_secs,
                "Session lifetime shorter than ban, raising it to the ban length"
            );
            self.session.ttl_secs = self.rate_limit.ban_secs;
        }
        self
    }
}

impl RateLimitConfig {
    /// Get the ban duration
    pub fn ban_duration(&self) -> Duration {
        Duration::from_secs(self.ban_secs)
    }
}

impl SessionConfig {
    /// Get the idle lifetime of stored state
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Get the cleanup interval
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}
