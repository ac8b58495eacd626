//! Receipts for the OpenLease audit trail.
//!
//! Every monetary effect (provision, withdrawal, lease charge, term dues,
//! fees, eviction) produces a [`Receipt`] whose SHA-256 digest commits to
//! the recorded fields and can be independently recomputed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::account::TokenAmount;
use crate::ids::{ClientId, TermIndex};

/// The kind of monetary effect this receipt records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptKind {
    /// Tokens moved from the client into escrow.
    Provision,
    /// Tokens moved from escrow back to the client.
    Withdrawal,
    /// Prorated dues charged when seats were granted mid-term.
    LeaseCharge,
    /// Full dues charged at a term boundary.
    TermDues,
    /// One-time power-user club fee.
    PowerUserFee,
    /// Per-request historical data fee.
    HistoricalDataFee,
    /// A client was removed after failing to cover a term's dues.
    Eviction,
}

impl std::fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provision => write!(f, "PROVISION"),
            Self::Withdrawal => write!(f, "WITHDRAWAL"),
            Self::LeaseCharge => write!(f, "LEASE_CHARGE"),
            Self::TermDues => write!(f, "TERM_DUES"),
            Self::PowerUserFee => write!(f, "POWER_USER_FEE"),
            Self::HistoricalDataFee => write!(f, "HISTORICAL_DATA_FEE"),
            Self::Eviction => write!(f, "EVICTION"),
        }
    }
}

/// A receipt proving that a monetary effect occurred.
///
/// Receipts form an append-only audit trail. The digest commits to every
/// recorded field; for an eviction the amount is the dues the client could
/// not cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// What kind of effect this receipt records.
    pub kind: ReceiptKind,
    /// The client the effect applied to.
    pub client: ClientId,
    /// The lease term in which the effect occurred.
    pub term: TermIndex,
    /// The amount moved (or, for evictions, the amount that could not be).
    pub amount: TokenAmount,
    /// The seat count involved, if applicable.
    pub seats: Option<u32>,
    /// When the triggering operation was submitted.
    pub issued_at: DateTime<Utc>,
    /// SHA-256 digest over all of the above.
    pub digest: [u8; 32],
}

impl Receipt {
    #[must_use]
    pub fn new(
        kind: ReceiptKind,
        client: ClientId,
        term: TermIndex,
        amount: TokenAmount,
        seats: Option<u32>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let digest = Self::compute_digest(kind, client, term, amount, seats, issued_at);
        Self {
            kind,
            client,
            term,
            amount,
            seats,
            issued_at,
            digest,
        }
    }

    fn compute_digest(
        kind: ReceiptKind,
        client: ClientId,
        term: TermIndex,
        amount: TokenAmount,
        seats: Option<u32>,
        issued_at: DateTime<Utc>,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"openlease:receipt:v1:");
        hasher.update(kind.to_string().as_bytes());
        hasher.update(client.as_bytes());
        hasher.update(term.0.to_le_bytes());
        hasher.update(amount.to_le_bytes());
        hasher.update(seats.unwrap_or(u32::MAX).to_le_bytes());
        hasher.update(issued_at.timestamp_millis().to_le_bytes());
        hasher.finalize().into()
    }

    /// Recompute the digest and compare against the stored one.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.digest
            == Self::compute_digest(
                self.kind,
                self.client,
                self.term,
                self.amount,
                self.seats,
                self.issued_at,
            )
    }

    /// Hex-encoded digest for logs and display.
    #[must_use]
    pub fn digest_hex(&self) -> String {
        hex::encode(self.digest)
    }
}
