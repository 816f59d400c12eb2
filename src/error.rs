// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the comment gate.

use thiserror::Error;

/// Failures of the backing rate-state store.
#[derive(Debug, Error, Clone)]
pub enum StoreError {
    #[error("Rate store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the gate itself. These never mean "allow".
///
/// Store failures are not among them: the limiter folds those into a denial.
#[derive(Debug, Error, Clone)]
pub enum GateError {
    #[error("Client identity could not be resolved")]
    IdentityUnavailable,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, GateError>;
