// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus metrics for gate decisions.

use crate::limiter::RateLimitResult;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

/// Counters owned by the service.
pub struct Metrics {
    registry: Registry,
    decisions: IntCounterVec,
    identity_failures: IntCounter,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let decisions = IntCounterVec::new(
            Opts::new(
                "comment_gate_decisions_total",
                "Comment submission decisions by outcome",
            ),
            &["outcome"],
        )?;
        let identity_failures = IntCounter::new(
            "comment_gate_identity_failures_total",
            "Submissions rejected because no identity could be resolved",
        )?;

        registry.register(Box::new(decisions.clone()))?;
        registry.register(Box::new(identity_failures.clone()))?;

        Ok(Self {
            registry,
            decisions,
            identity_failures,
        })
    }

    /// Count a limiter decision.
    pub fn observe(&self, result: &RateLimitResult) {
        let outcome = match result {
            RateLimitResult::Allowed { .. } => "allowed",
            RateLimitResult::Limited { reason, .. } => reason.as_str(),
        };
        self.decisions.with_label_values(&[outcome]).inc();
    }

    pub fn identity_failure(&self) {
        self.identity_failures.inc();
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
