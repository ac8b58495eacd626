//! Escrow account model.
//!
//! Balances are unsigned integers in the smallest token unit and can never
//! go negative: every debit is checked and fails atomically.

use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, TermIndex};

/// A token amount in the smallest unit. Products use `u128` intermediates.
pub type TokenAmount = u64;

/// Per-client escrow account state.
///
/// The effective power-user status is *computed* — see
/// [`ClientAccount::is_power_user`] — so falling below the minimum revokes
/// it with no separate transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAccount {
    /// Escrow balance available for dues, fees, and withdrawal.
    pub escrow_balance: TokenAmount,
    /// Seats held for the current term (already paid for).
    pub current_term_seats: u32,
    /// Last term this account paid dues for. `None` = never charged.
    pub paid_through_term: Option<TermIndex>,
    /// Whether the client has applied (and paid) for power-user status.
    pub power_user_applied: bool,
    /// Whether the client has requested historical data access.
    pub historical_data_access: bool,
}

impl ClientAccount {
    /// Create an empty account.
    #[must_use]
    pub fn new() -> Self {
        Self {
            escrow_balance: 0,
            current_term_seats: 0,
            paid_through_term: None,
            power_user_applied: false,
            historical_data_access: false,
        }
    }

    /// Effective power-user status: applied *and* above the minimum balance.
    #[must_use]
    pub fn is_power_user(&self, minimum: TokenAmount) -> bool {
        self.power_user_applied && self.escrow_balance >= minimum
    }
}

impl Default for ClientAccount {
    fn default() -> Self {
        Self::new()
    }
}

/// The full per-client view exposed by the read surface, post-settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
    pub client: ClientId,
    /// Settled escrow balance.
    pub escrow_balance: TokenAmount,
    /// Balance on the external token ledger (outside escrow).
    pub token_balance: TokenAmount,
    /// Last term dues were paid for. `None` = never charged.
    pub lease_term_paid: Option<TermIndex>,
    pub power_user: bool,
    pub historical_data_access: bool,
    pub current_term_seats: u32,
    pub indicative_next_term_seats: u32,
}
