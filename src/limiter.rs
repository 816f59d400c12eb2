// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Comment submission rate limiter.
//!
//! Each identity moves through three states:
//! 1. fresh: attempts are counted and allowed
//! 2. limited: the attempt that exceeds the threshold imposes a ban and
//!    resets the counter
//! 3. banned: every attempt is denied, uncounted, until the ban elapses
//!
//! The limiter fails closed: when the store cannot be read or written the
//! attempt is denied.

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::error::StoreError;
use crate::identity::UserKey;
use crate::store::RateStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Submission may proceed
    Allowed {
        /// Attempts left before a ban is imposed
        remaining: u32,
    },
    /// Submission must be rejected
    Limited {
        /// Reason for rate limiting
        reason: RateLimitReason,
        /// Time until the identity may try again
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Reason for rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitReason {
    /// This attempt exceeded the threshold and a ban was imposed
    ThresholdExceeded,
    /// A ban imposed earlier is still in force
    Banned,
    /// Rate state could not be loaded or saved
    StoreUnavailable,
}

impl RateLimitReason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThresholdExceeded => "threshold_exceeded",
            Self::Banned => "banned",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

impl std::fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ThresholdExceeded => write!(f, "Comment limit exceeded"),
            Self::Banned => write!(f, "Commenting temporarily banned"),
            Self::StoreUnavailable => write!(f, "Rate state unavailable"),
        }
    }
}

/// Outcome of a token-keyed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCheck {
    pub result: RateLimitResult,
    /// Token to hand back to the client, if it changed
    pub user_key: Option<String>,
}

/// Per-identity comment limiter.
pub struct CommentLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateStore>,
    clock: Arc<dyn Clock>,
}

impl CommentLimiter {
    /// Create a limiter over the given store and clock.
    pub fn new(config: RateLimitConfig, store: Arc<dyn RateStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count one submission attempt and decide whether it may proceed.
    ///
    /// Store failures are returned to the caller; see [`Self::check`] for the
    /// fail-closed variant.
    pub async fn check_and_record(&self, identity: &str) -> Result<RateLimitResult, StoreError> {
        let now = self.clock.now();
        let mut state = self.store.get(identity).await?;

        if let Some(until) = state.ban_until {
            if now < until {
                let retry_after = (until - now).to_std().unwrap_or_default();
                debug!(%identity, ?retry_after, "Identity banned");
                return Ok(RateLimitResult::Limited {
                    reason: RateLimitReason::Banned,
                    retry_after,
                });
            }
            state.ban_until = None;
        }

        state.attempt_count = state.attempt_count.saturating_add(1);

        if state.attempt_count > self.config.threshold {
            let ban = self.config.ban_duration();
            let ban_until = chrono::Duration::from_std(ban)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC);
            state.ban_until = Some(ban_until);
            state.attempt_count = 0;
            self.store.put(identity, state).await?;

            info!(%identity, %ban_until, "Comment limit exceeded, ban imposed");
            return Ok(RateLimitResult::Limited {
                reason: RateLimitReason::ThresholdExceeded,
                retry_after: ban,
            });
        }

        let remaining = self.config.threshold - state.attempt_count;
        self.store.put(identity, state).await?;
        debug!(%identity, remaining, "Comment attempt allowed");
        Ok(RateLimitResult::Allowed { remaining })
    }

    /// Like [`Self::check_and_record`], but a store failure denies the attempt.
    pub async fn check(&self, identity: &str) -> RateLimitResult {
        match self.check_and_record(identity).await {
            Ok(result) => result,
            Err(err) => {
                error!(%identity, error = %err, "Rate store failure, denying attempt");
                RateLimitResult::Limited {
                    reason: RateLimitReason::StoreUnavailable,
                    retry_after: Duration::ZERO,
                }
            }
        }
    }

    /// Check a token-keyed visitor.
    ///
    /// The counter travels inside the token, so no store access happens here.
    /// Authenticated callers bypass the limiter and their token is left as is.
    pub fn check_token(&self, token: Option<&str>, authenticated: bool) -> TokenCheck {
        if authenticated {
            return TokenCheck {
                result: RateLimitResult::Allowed {
                    remaining: self.config.threshold,
                },
                user_key: None,
            };
        }

        let mut key = UserKey::from_cookie(token);
        let count = key.bump();
        let user_key = Some(key.to_string());

        if count > self.config.threshold {
            debug!(id = %key.id, count, "Token over comment limit");
            return TokenCheck {
                result: RateLimitResult::Limited {
                    reason: RateLimitReason::ThresholdExceeded,
                    retry_after: self.config.ban_duration(),
                },
                user_key,
            };
        }

        TokenCheck {
            result: RateLimitResult::Allowed {
                remaining: self.config.threshold - count,
            },
            user_key,
        }
    }
}
