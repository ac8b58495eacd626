//! Identifiers used throughout OpenLease.
//!
//! `ClientId` uses UUIDv7 for time-ordered lexicographic sorting; `TermIndex`
//! is a monotone counter of whole calendar months since the lease anchor.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ClientId
// ---------------------------------------------------------------------------

/// Unique identifier for a client / escrow account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ClientId(pub Uuid);

impl ClientId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TermIndex
// ---------------------------------------------------------------------------

/// Monotonically increasing identifier for a lease term.
///
/// Term `n` is the `n`-th whole calendar month since the lease anchor
/// (see [`crate::constants::LEASE_ANCHOR_YEAR`]). The index is never stored
/// against a clock — it is always derived from a supplied timestamp via
/// [`TermIndex::containing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TermIndex(pub u32);

impl TermIndex {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for TermIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "term:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
