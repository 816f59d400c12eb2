// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Metrics collection for spam simulation results.

#![allow(dead_code)]

use comment_gate::{RateLimitReason, RateLimitResult};
use std::collections::HashMap;
use std::time::Duration;

/// Collects metrics during a spam simulation.
#[derive(Debug, Default)]
pub struct AttackMetrics {
    /// Count of submissions by outcome
    outcomes: HashMap<Outcome, usize>,
    /// Count of submissions by visitor
    requests_per_visitor: HashMap<String, usize>,
    /// Latency samples (microseconds)
    latencies: Vec<u64>,
}

/// Possible outcomes for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    ThresholdExceeded,
    Banned,
    StoreUnavailable,
}

impl From<&RateLimitResult> for Outcome {
    fn from(result: &RateLimitResult) -> Self {
        match result {
            RateLimitResult::Allowed { .. } => Self::Allowed,
            RateLimitResult::Limited { reason, .. } => match reason {
                RateLimitReason::ThresholdExceeded => Self::ThresholdExceeded,
                RateLimitReason::Banned => Self::Banned,
                RateLimitReason::StoreUnavailable => Self::StoreUnavailable,
            },
        }
    }
}

impl AttackMetrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submission outcome.
    pub fn record(&mut self, outcome: Outcome, visitor: &str, latency: Duration) {
        *self.outcomes.entry(outcome).or_insert(0) += 1;
        *self
            .requests_per_visitor
            .entry(visitor.to_string())
            .or_insert(0) += 1;
        self.latencies.push(latency.as_micros() as u64);
    }

    /// Get total submission count.
    pub fn total_requests(&self) -> usize {
        self.outcomes.values().sum()
    }

    /// Get count for a specific outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.get(&outcome).copied().unwrap_or(0)
    }

    /// Get block rate (ratio of blocked to total).
    pub fn block_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            return 0.0;
        }
        let allowed = self.count(Outcome::Allowed);
        (total - allowed) as f64 / total as f64
    }

    /// Get median latency in microseconds.
    pub fn median_latency_us(&self) -> u64 {
        if self.latencies.is_empty() {
            return 0;
        }
        let mut sorted = self.latencies.clone();
        sorted.sort_unstable();
        sorted[sorted.len() / 2]
    }

    /// Get number of distinct visitors that submitted.
    pub fn unique_visitors(&self) -> usize {
        self.requests_per_visitor.len()
    }

    /// Generate a summary report.
    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            total_requests: self.total_requests(),
            allowed: self.count(Outcome::Allowed),
            threshold_exceeded: self.count(Outcome::ThresholdExceeded),
            banned: self.count(Outcome::Banned),
            store_unavailable: self.count(Outcome::StoreUnavailable),
            block_rate: self.block_rate(),
            median_latency_us: self.median_latency_us(),
            unique_visitors: self.unique_visitors(),
        }
    }
}

/// Summary report of spam metrics.
#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub total_requests: usize,
    pub allowed: usize,
    pub threshold_exceeded: usize,
    pub banned: usize,
    pub store_unavailable: usize,
    pub block_rate: f64,
    pub median_latency_us: u64,
    pub unique_visitors: usize,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Spam Metrics Report ===")?;
        writeln!(f, "Total Submissions: {}", self.total_requests)?;
        writeln!(f, "Unique Visitors:   {}", self.unique_visitors)?;
        writeln!(f)?;
        writeln!(f, "--- Outcomes ---")?;
        writeln!(f, "Allowed:           {}", self.allowed)?;
        writeln!(f, "Bans Imposed:      {}", self.threshold_exceeded)?;
        writeln!(f, "Denied (banned):   {}", self.banned)?;
        writeln!(f, "Store Unavailable: {}", self.store_unavailable)?;
        writeln!(f, "Block Rate:        {:.1}%", self.block_rate * 100.0)?;
        writeln!(f, "Median Latency:    {} us", self.median_latency_us)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collection() {
        let mut metrics = AttackMetrics::new();

        metrics.record(Outcome::Allowed, "10.0.0.1", Duration::from_micros(100));
        metrics.record(Outcome::Allowed, "10.0.0.2", Duration::from_micros(150));
        metrics.record(Outcome::Banned, "10.0.0.1", Duration::from_micros(50));

        assert_eq!(metrics.total_requests(), 3);
        assert_eq!(metrics.count(Outcome::Allowed), 2);
        assert_eq!(metrics.count(Outcome::Banned), 1);
        assert_eq!(metrics.unique_visitors(), 2);
    }

    #[test]
    fn test_block_rate() {
        let mut metrics = AttackMetrics::new();
        for _ in 0..3 {
            metrics.record(Outcome::Allowed, "10.0.0.1", Duration::ZERO);
        }
        for _ in 0..7 {
            metrics.record(Outcome::Banned, "10.0.0.1", Duration::ZERO);
        }

        assert!((metrics.block_rate() - 0.7).abs() < 0.01);
    }
}
