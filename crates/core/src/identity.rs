// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Classlink Contributors

//! Identity capability for authentication guarding.
//!
//! Both resilience components read the caller's identity through this trait
//! rather than a process-wide auth store, so each can be exercised with a
//! fake identity in tests.

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable subject identifier (user id).
    pub subject: String,
    /// Role granted by the backend (student, parent, instructor, staff...).
    pub role: String,
    /// Bearer credential attached to replayed requests and the channel URL.
    pub token: String,
}

impl Identity {
    /// Creates an identity from its parts.
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Identity {
            subject: subject.into(),
            role: role.into(),
            token: token.into(),
        }
    }
}

/// Source of the caller's current identity.
///
/// `None` means unauthenticated; connection attempts are silently skipped
/// and replayed requests carry no credential.
pub trait IdentityProvider: Send + Sync {
    /// Returns the current identity, if any.
    fn identity(&self) -> Option<Identity>;
}

/// Identity provider backed by a fixed identity.
///
/// Suitable for clients whose credential is resolved once at startup, and
/// for tests.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    identity: Option<Identity>,
}

impl StaticIdentity {
    /// An authenticated identity with the given subject, role, and token.
    pub fn authenticated(
        subject: impl Into<String>,
        role: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        StaticIdentity {
            identity: Some(Identity::new(subject, role, token)),
        }
    }

    /// An unauthenticated identity source.
    pub fn anonymous() -> Self {
        StaticIdentity { identity: None }
    }
}

impl IdentityProvider for StaticIdentity {
    fn identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
