//! # openlease-engine
//!
//! The stateful plane of OpenLease: escrow accounts, the strategy catalog,
//! the token-ledger and storage-vault seams, and the lease-term state
//! machine itself.
//!
//! ## Architecture
//!
//! [`RentalEngine`] orchestrates every externally visible operation:
//! 1. Fail closed if the storage grant is revoked
//! 2. Clone the state and settle it to the supplied `now`
//! 3. Apply the operation's own effect
//! 4. Execute the implied token-ledger moves
//! 5. Persist through the vault and commit — all-or-nothing
//!
//! Reads settle a clone instead, so they report post-settlement figures
//! without persisting anything.

pub mod account_book;
pub mod catalog;
pub mod engine;
pub mod ledger;
pub mod state;
pub mod vault;

pub use account_book::AccountBook;
pub use catalog::StrategyCatalog;
pub use engine::RentalEngine;
pub use ledger::{MemoryLedger, TokenLedger};
pub use state::{LedgerMove, MarketState, TermLedger};
pub use vault::{JsonFileVault, MemoryVault, StateVault};
