// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Precondition gate for comment submissions.
//!
//! Resolves the visitor identity for the configured strategy and asks the
//! limiter whether the submission may be stored.

use crate::config::IdentityStrategy;
use crate::error::{GateError, Result};
use crate::limiter::{CommentLimiter, RateLimitResult};
use tracing::{debug, warn};

/// What the submission handler knows about the visitor.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateRequest<'a> {
    /// Client IP, already resolved from proxy headers
    pub client_ip: Option<&'a str>,
    /// Raw `user_key` cookie value
    pub user_key: Option<&'a str>,
    /// Signed-in users are never rate limited
    pub authenticated: bool,
}

/// Decision plus anything the caller must send back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    pub result: RateLimitResult,
    /// Rewritten token to set as the `user_key` cookie
    pub user_key: Option<String>,
}

/// Identity resolution and rate limiting for comment submissions.
pub struct CommentGate {
    strategy: IdentityStrategy,
    limiter: CommentLimiter,
}

impl CommentGate {
    pub fn new(limiter: CommentLimiter) -> Self {
        Self {
            strategy: limiter.config().strategy,
            limiter,
        }
    }

    pub fn strategy(&self) -> IdentityStrategy {
        self.strategy
    }

    pub fn limiter(&self) -> &CommentLimiter {
        &self.limiter
    }

    /// Decide whether a submission may proceed.
    ///
    /// Returns [`GateError::IdentityUnavailable`] when the IP strategy is in
    /// use and no client IP is known. Store failures are already folded into
    /// a denial by the limiter.
    pub async fn evaluate(&self, request: GateRequest<'_>) -> Result<GateOutcome> {
        match self.strategy {
            IdentityStrategy::IpBased => {
                if request.authenticated {
                    debug!("Authenticated submitter, skipping rate limit");
                    return Ok(GateOutcome {
                        result: RateLimitResult::Allowed {
                            remaining: self.limiter.config().threshold,
                        },
                        user_key: None,
                    });
                }

                let ip = request
                    .client_ip
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .ok_or_else(|| {
                        warn!("No client IP for IP-keyed rate limiting");
                        GateError::IdentityUnavailable
                    })?;

                Ok(GateOutcome {
                    result: self.limiter.check(ip).await,
                    user_key: None,
                })
            }
            IdentityStrategy::TokenBased => {
                let check = self
                    .limiter
                    .check_token(request.user_key, request.authenticated);
                Ok(GateOutcome {
                    result: check.result,
                    user_key: check.user_key,
                })
            }
        }
    }
}
