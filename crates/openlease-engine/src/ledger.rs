//! The token-ledger seam.
//!
//! The engine never implements token semantics itself: provisioning and
//! withdrawal move funds through this narrow collaborator contract, and a
//! rejected transfer propagates as operation failure with no state change.

use std::collections::HashMap;

use openlease_types::{ClientId, LeaseError, Result, TokenAmount};

/// External fungible-token ledger, consumed as a service.
pub trait TokenLedger {
    /// Move `amount` from one identity to another.
    ///
    /// # Errors
    /// `TokenTransferFailed` if the transfer is rejected; implementations
    /// must leave both balances unchanged on failure.
    fn transfer_from(&mut self, from: ClientId, to: ClientId, amount: TokenAmount) -> Result<()>;

    /// The ledger balance of an identity.
    fn balance_of(&self, id: ClientId) -> TokenAmount;
}

/// In-memory token ledger for deterministic testing.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<ClientId, TokenAmount>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint tokens to an identity (test fixture setup).
    pub fn mint(&mut self, id: ClientId, amount: TokenAmount) {
        let balance = self.balances.entry(id).or_default();
        *balance = balance.saturating_add(amount);
    }
}

impl TokenLedger for MemoryLedger {
    fn transfer_from(&mut self, from: ClientId, to: ClientId, amount: TokenAmount) -> Result<()> {
        if amount == 0 || from == to {
            return Ok(());
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(LeaseError::TokenTransferFailed {
                reason: format!("balance {available} cannot cover transfer of {amount}"),
            });
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| LeaseError::TokenTransferFailed {
                reason: "recipient balance overflow".into(),
            })?;
        self.balances.insert(from, available - amount);
        self.balances.insert(to, credited);
        Ok(())
    }

    fn balance_of(&self, id: ClientId) -> TokenAmount {
        self.balances.get(&id).copied().unwrap_or(0)
    }
}
