// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Comment Gate
//!
//! This crate provides the submission rate limiter for a threaded comment
//! board:
//!
//! - Per-visitor identity, keyed on client IP or a `user_key` cookie token
//! - Three comments allowed, the fourth imposes a ten minute ban
//! - Signed-in users are exempt
//! - Fail-closed when rate state cannot be read or written

pub mod clock;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod identity;
pub mod limiter;
pub mod metrics;
pub mod store;

pub use config::{Config, IdentityStrategy};
pub use error::{GateError, StoreError};
pub use gate::{CommentGate, GateOutcome, GateRequest};
pub use limiter::{CommentLimiter, RateLimitReason, RateLimitResult};
pub use store::{MemoryStore, RateState, RateStore};
