// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for comment spam simulation.
//!
//! This module provides utilities for replaying comment spam patterns
//! against the gate on a simulated clock.

pub mod attacks;
pub mod generators;
pub mod metrics;
