// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test data generators for spam simulation.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr};

/// Generate a pool of IP addresses for testing.
pub fn generate_ips(count: usize) -> Vec<IpAddr> {
    (0..count)
        .map(|i| {
            // Use 10.x.x.x private range
            let a = ((i >> 16) & 0xFF) as u8;
            let b = ((i >> 8) & 0xFF) as u8;
            let c = (i & 0xFF) as u8;
            IpAddr::V4(Ipv4Addr::new(10, a, b, c))
        })
        .collect()
}

/// Generate tokens whose counter suffix has been replaced by a letter.
pub fn generate_forged_tokens(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{:032x}{}", i, (b'a' + (i % 26) as u8) as char))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ips() {
        let ips = generate_ips(256);
        assert_eq!(ips.len(), 256);
        // All should be unique
        let unique: std::collections::HashSet<_> = ips.iter().collect();
        assert_eq!(unique.len(), 256);
    }

    #[test]
    fn test_forged_tokens_end_in_letters() {
        let tokens = generate_forged_tokens(30);
        assert!(tokens.iter().all(|t| t.len() == 33));
        assert!(tokens.iter().all(|t| t.ends_with(|c: char| c.is_ascii_lowercase())));
    }
}
