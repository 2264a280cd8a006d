// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Real-time channel URL derivation.
//!
//! The channel URL is derived from the configured base API URL with the
//! scheme mapped (http→ws, https→wss) and the logical path
//! `/ws/<role>/<token>` appended. The credential travels as a path segment,
//! not an ambient cookie.

use crate::error::{Error, Result};

/// Derives the channel URL for the given role and credential.
pub fn channel_url(base_url: &str, role: &str, token: &str) -> Result<String> {
    let (scheme, rest) = if let Some(rest) = base_url.strip_prefix("https://") {
        ("wss", rest)
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        ("ws", rest)
    } else {
        return Err(Error::InvalidUrl(base_url.to_string()));
    };

    if rest.is_empty() {
        return Err(Error::InvalidUrl(base_url.to_string()));
    }

    let host = rest.trim_end_matches('/');
    Ok(format!("{scheme}://{host}/ws/{role}/{token}"))
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod tests;
