//! The escrow account store.
//!
//! Pure state holder: per-client balances and flags, no business rules.
//! All mutations are atomic — either the full operation succeeds or the
//! account is unchanged. A debit that would overdraw fails without touching
//! any other field.

use std::collections::HashMap;

use openlease_types::{ClientAccount, ClientId, LeaseError, Result, TokenAmount};
use serde::{Deserialize, Serialize};

/// Source of truth for all escrow balances and account flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBook {
    accounts: HashMap<ClientId, ClientAccount>,
}

impl AccountBook {
    /// Create a new empty account book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit a client's escrow balance, creating the account on first touch.
    ///
    /// # Errors
    /// Returns `BalanceOverflow` if the credit would overflow.
    pub fn credit(&mut self, client: ClientId, amount: TokenAmount) -> Result<()> {
        let account = self.accounts.entry(client).or_default();
        account.escrow_balance = account
            .escrow_balance
            .checked_add(amount)
            .ok_or(LeaseError::BalanceOverflow)?;
        Ok(())
    }

    /// Debit a client's escrow balance.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the balance cannot cover the amount;
    /// the account (and every other field) is left unchanged.
    pub fn debit(&mut self, client: ClientId, amount: TokenAmount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.balance(client);
        if available < amount {
            return Err(LeaseError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        // Checked above; the account exists because its balance was non-zero.
        if let Some(account) = self.accounts.get_mut(&client) {
            account.escrow_balance -= amount;
        }
        Ok(())
    }

    /// The escrow balance of a client (0 for unknown clients).
    #[must_use]
    pub fn balance(&self, client: ClientId) -> TokenAmount {
        self.accounts
            .get(&client)
            .map_or(0, |a| a.escrow_balance)
    }

    /// The account for a client, if it exists.
    #[must_use]
    pub fn get(&self, client: ClientId) -> Option<&ClientAccount> {
        self.accounts.get(&client)
    }

    /// Mutable access, creating the account on first touch.
    pub fn entry(&mut self, client: ClientId) -> &mut ClientAccount {
        self.accounts.entry(client).or_default()
    }

    /// Iterate all accounts.
    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &ClientAccount)> {
        self.accounts.iter()
    }

    /// Iterate all accounts mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ClientId, &mut ClientAccount)> {
        self.accounts.iter_mut()
    }

    /// Total seats currently held across all accounts.
    #[must_use]
    pub fn total_current_seats(&self) -> u32 {
        self.accounts.values().map(|a| a.current_term_seats).sum()
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns `true` if no accounts exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
