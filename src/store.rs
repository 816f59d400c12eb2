// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Short-lived per-identity rate state.
//!
//! The limiter reads and writes state through [`RateStore`] rather than an
//! ambient session object, so the backend can be swapped and tests can
//! inject a fake. [`MemoryStore`] keeps entries in process and expires
//! them after the configured session lifetime.

use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Rate state tracked for one identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateState {
    /// Submissions since the last reset
    pub attempt_count: u32,
    /// End of the active ban, if any
    pub ban_until: Option<DateTime<Utc>>,
}

impl RateState {
    /// Whether a ban is in force at `now`.
    pub fn is_banned(&self, now: DateTime<Utc>) -> bool {
        matches!(self.ban_until, Some(until) if now < until)
    }
}

/// Key-value access to rate state.
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Load state for an identity. Unknown identities yield the default state.
    async fn get(&self, identity: &str) -> Result<RateState, StoreError>;

    /// Persist state for an identity.
    async fn put(&self, identity: &str, state: RateState) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct Entry {
    state: RateState,
    touched: Instant,
}

/// In-process store with idle expiry.
pub struct MemoryStore {
    ttl: Duration,
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create a store whose entries expire after `ttl` without writes.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of tracked identities, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop entries idle for longer than the lifetime (should be called periodically).
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.touched) < self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Purged idle rate state");
        }
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn get(&self, identity: &str) -> Result<RateState, StoreError> {
        let entries = self.entries.read().await;
        let state = entries
            .get(identity)
            .filter(|entry| entry.touched.elapsed() < self.ttl)
            .map(|entry| entry.state.clone())
            .unwrap_or_default();
        Ok(state)
    }

    async fn put(&self, identity: &str, state: RateState) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            identity.to_string(),
            Entry {
                state,
                touched: Instant::now(),
            },
        );
        Ok(())
    }
}
