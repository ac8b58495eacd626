//! System-wide constants for the OpenLease engine.

use crate::account::TokenAmount;

/// Year of the month that counts as lease term 0.
pub const LEASE_ANCHOR_YEAR: i32 = 2018;

/// Month (1-based) of the month that counts as lease term 0.
pub const LEASE_ANCHOR_MONTH: u32 = 1;

/// Smallest-unit multiplier: one whole token is 10^6 units.
pub const UNITS_PER_TOKEN: TokenAmount = 1_000_000;

/// Default number of seats shared across all clients.
pub const DEFAULT_SEAT_CAPACITY: u32 = 100;

/// Default one-time fee for joining the power-user club.
pub const DEFAULT_POWER_USER_CLUB_FEE: TokenAmount = 0;

/// Default per-request fee for historical data access.
pub const DEFAULT_HISTORICAL_DATA_FEE: TokenAmount = 0;

/// Default minimum escrow balance to retain power-user status.
pub const DEFAULT_POWER_USER_MINIMUM: TokenAmount = 100_000 * UNITS_PER_TOKEN;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenLease";
