//! Error types for the OpenLease engine.
//!
//! All errors use the `OL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Bid registry errors
//! - 2xx: Escrow balance errors
//! - 3xx: Token ledger errors
//! - 4xx: Authorization / storage errors
//! - 5xx: Catalog / read surface errors
//! - 6xx: Membership errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::account::TokenAmount;
use crate::ids::ClientId;

/// Central error enum for all OpenLease operations.
#[derive(Debug, Error)]
pub enum LeaseError {
    // =================================================================
    // Bid Registry Errors (1xx)
    // =================================================================
    /// No bid is registered for this client.
    #[error("OL_ERR_100: Bid not found for client: {0}")]
    BidNotFound(ClientId),

    /// The bid failed validation (zero price, etc.).
    #[error("OL_ERR_101: Invalid bid: {reason}")]
    InvalidBid { reason: String },

    /// The client is the lowest-ranked bidder; nothing ranks below it.
    #[error("OL_ERR_102: No bid ranks below client: {0}")]
    NoLowerBid(ClientId),

    // =================================================================
    // Escrow Balance Errors (2xx)
    // =================================================================
    /// Not enough escrow balance to perform the operation.
    #[error("OL_ERR_200: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds {
        needed: TokenAmount,
        available: TokenAmount,
    },

    /// A credit would overflow the balance.
    #[error("OL_ERR_201: Balance overflow")]
    BalanceOverflow,

    // =================================================================
    // Token Ledger Errors (3xx)
    // =================================================================
    /// The external token ledger rejected a transfer.
    #[error("OL_ERR_300: Token transfer failed: {reason}")]
    TokenTransferFailed { reason: String },

    // =================================================================
    // Authorization / Storage Errors (4xx)
    // =================================================================
    /// A non-operator attempted a privileged action.
    #[error("OL_ERR_400: Unauthorized caller: {0}")]
    Unauthorized(ClientId),

    /// The storage-indirection grant is revoked; state-touching calls fail
    /// closed.
    #[error("OL_ERR_401: Storage grant revoked")]
    StorageRevoked,

    /// The storage vault failed to load or persist state.
    #[error("OL_ERR_402: Storage failure: {0}")]
    StorageFailure(String),

    // =================================================================
    // Catalog / Read Surface Errors (5xx)
    // =================================================================
    /// Strategy index out of range.
    #[error("OL_ERR_500: No strategy at index {0}")]
    StrategyIndexOutOfRange(usize),

    /// A strategy with this name already exists.
    #[error("OL_ERR_501: Duplicate strategy: {0}")]
    DuplicateStrategy(String),

    /// Renter index out of range.
    #[error("OL_ERR_502: No renter at index {0}")]
    RenterIndexOutOfRange(usize),

    // =================================================================
    // Membership Errors (6xx)
    // =================================================================
    /// Applying for power-user status below the minimum balance.
    #[error("OL_ERR_600: Below power-user minimum: need {minimum}, have {available}")]
    BelowPowerUserMinimum {
        minimum: TokenAmount,
        available: TokenAmount,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("OL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("OL_ERR_901: Serialization error: {0}")]
    Serialization(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, LeaseError>;

// Conversion from std::io::Error (file-backed vaults)
impl From<std::io::Error> for LeaseError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageFailure(err.to_string())
    }
}

impl From<serde_json::Error> for LeaseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
