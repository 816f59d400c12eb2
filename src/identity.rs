// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Visitor identity resolution.
//!
//! Two keys are supported:
//! - the client IP, taken from the first `X-Forwarded-For` entry or the peer
//!   address
//! - the `user_key` token, an id followed by the attempt counter

use axum::http::{header, HeaderMap};
use std::fmt;
use std::net::SocketAddr;
use tracing::debug;
use uuid::Uuid;

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Length of a minted token id (UUID in simple hex form).
pub const TOKEN_ID_LEN: usize = 32;

/// Resolve the client IP from proxy headers, falling back to the peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(ip) => Some(ip.to_string()),
        None => peer.map(|addr| addr.ip().to_string()),
    }
}

/// Read a cookie value from the request headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// Format a `Set-Cookie` value for the visitor token.
pub fn format_set_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly{secure_flag}; SameSite=Lax; Path=/; Max-Age={max_age}")
}

/// How a token's counter is laid out after its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenLayout {
    /// A 32-char hex id followed by a decimal counter of any length
    Minted,
    /// Any other token: the last character is a single-digit counter
    Legacy,
}

/// A visitor token: stable id plus the in-band attempt counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey {
    pub id: String,
    pub counter: u32,
    pub layout: TokenLayout,
}

impl UserKey {
    /// Mint a token for a first-time visitor.
    pub fn mint() -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            counter: 0,
            layout: TokenLayout::Minted,
        }
    }

    /// Parse a token read from the client.
    ///
    /// Returns `None` for an empty token. A token made of a 32-char hex id and
    /// a run of digits reads the whole run as the counter. Any other token
    /// reads its last character as the counter, a non-digit counting as zero.
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }
        if let Some(key) = Self::parse_minted(token) {
            return Some(key);
        }

        let last = token.chars().next_back()?;
        let id = &token[..token.len() - last.len_utf8()];
        let counter = last.to_digit(10).unwrap_or_else(|| {
            debug!(%last, "Malformed token counter, treating as zero");
            0
        });

        Some(Self {
            id: id.to_string(),
            counter,
            layout: TokenLayout::Legacy,
        })
    }

    fn parse_minted(token: &str) -> Option<Self> {
        let id = token.get(..TOKEN_ID_LEN)?;
        let suffix = token.get(TOKEN_ID_LEN..)?;
        if suffix.is_empty()
            || !id.bytes().all(|b| b.is_ascii_hexdigit())
            || !suffix.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        Some(Self {
            id: id.to_string(),
            counter: suffix.parse().unwrap_or(u32::MAX),
            layout: TokenLayout::Minted,
        })
    }

    /// Parse an existing token or mint a new one.
    pub fn from_cookie(token: Option<&str>) -> Self {
        token.and_then(Self::parse).unwrap_or_else(Self::mint)
    }

    /// Record one more attempt.
    ///
    /// A legacy token whose counter outgrows one digit is re-keyed onto a
    /// minted id so the counter still reads back whole.
    pub fn bump(&mut self) -> u32 {
        self.counter = self.counter.saturating_add(1);
        if self.layout == TokenLayout::Legacy && self.counter > 9 {
            self.id = Uuid::new_v4().simple().to_string();
            self.layout = TokenLayout::Minted;
        }
        self.counter
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.id, self.counter)
    }
}
