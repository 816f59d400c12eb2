// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Comment spam patterns for security testing.

#![allow(dead_code)]

use comment_gate::config::IdentityStrategy;

/// How a token-keyed client treats the `user_key` cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieBehavior {
    /// Sends back whatever the gate set
    Honor,
    /// Never sends a cookie
    Strip,
    /// Sends a token whose counter has been replaced by a letter
    Forge,
}

/// Spam pattern configuration.
#[derive(Debug, Clone)]
pub struct AttackConfig {
    /// Total number of submissions to send
    pub total_requests: usize,
    /// Simulated seconds between consecutive submissions
    pub interval_secs: i64,
    /// Number of distinct visitors taking turns
    pub unique_visitors: usize,
    /// Identity strategy the gate runs with
    pub strategy: IdentityStrategy,
    /// Cookie handling (token strategy only)
    pub cookies: CookieBehavior,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            total_requests: 100,
            interval_secs: 1,
            unique_visitors: 1,
            strategy: IdentityStrategy::IpBased,
            cookies: CookieBehavior::Honor,
        }
    }
}

/// Predefined spam patterns.
impl AttackConfig {
    /// One IP posting every second.
    pub fn single_ip_flood() -> Self {
        Self {
            total_requests: 200,
            interval_secs: 1,
            ..Default::default()
        }
    }

    /// Many IPs taking turns, each posting every 100 seconds.
    pub fn distributed_spam() -> Self {
        Self {
            total_requests: 500,
            interval_secs: 1,
            unique_visitors: 100,
            ..Default::default()
        }
    }

    /// One IP posting every 200 seconds, probing the ban window.
    pub fn patient_spammer() -> Self {
        Self {
            total_requests: 30,
            interval_secs: 200,
            ..Default::default()
        }
    }

    /// Token-keyed client that keeps its cookie.
    pub fn cookie_honoring_flood() -> Self {
        Self {
            total_requests: 50,
            strategy: IdentityStrategy::TokenBased,
            cookies: CookieBehavior::Honor,
            ..Default::default()
        }
    }

    /// Token-keyed client that drops its cookie every time.
    pub fn cookie_stripping() -> Self {
        Self {
            total_requests: 50,
            strategy: IdentityStrategy::TokenBased,
            cookies: CookieBehavior::Strip,
            ..Default::default()
        }
    }

    /// Token-keyed client that rewrites the counter suffix.
    pub fn token_forging() -> Self {
        Self {
            total_requests: 50,
            unique_visitors: 5,
            strategy: IdentityStrategy::TokenBased,
            cookies: CookieBehavior::Forge,
            ..Default::default()
        }
    }

    /// Simulated wall time covered by the pattern, in seconds.
    pub fn simulated_duration_secs(&self) -> i64 {
        self.total_requests as i64 * self.interval_secs
    }
}
