//! # openlease-types
//!
//! Shared types, errors, and configuration for the **OpenLease** seat-leasing
//! engine.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ClientId`], [`TermIndex`]
//! - **Bid model**: [`SeatBid`]
//! - **Account model**: [`ClientAccount`], [`ClientSummary`], [`TokenAmount`]
//! - **Term model**: calendar-month arithmetic and the proration law
//! - **Strategy model**: [`Strategy`]
//! - **Receipt model**: [`Receipt`], [`ReceiptKind`]
//! - **Configuration**: [`MarketParams`]
//! - **Errors**: [`LeaseError`] with `OL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod account;
pub mod bid;
pub mod constants;
pub mod error;
pub mod ids;
pub mod params;
pub mod receipt;
pub mod strategy;
pub mod term;

// Re-export all primary types at crate root for ergonomic imports:
//   use openlease_types::{ClientId, SeatBid, TermIndex, ...};

pub use account::*;
pub use bid::*;
pub use error::*;
pub use ids::*;
pub use params::*;
pub use receipt::*;
pub use strategy::*;
pub use term::*;

// Constants are accessed via `openlease_types::constants::FOO`
// (not re-exported to avoid name collisions).
