//! Market configuration.

use serde::{Deserialize, Serialize};

use crate::account::TokenAmount;
use crate::constants;
use crate::ids::ClientId;

/// Configuration for a single seat-leasing market.
///
/// The fee and minimum-balance fields are operator-tunable at runtime; the
/// seat capacity and wallet identities are fixed at construction except
/// through the privileged setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketParams {
    /// Fixed number of seats shared across all clients.
    pub seat_capacity: u32,
    /// The privileged operator identity.
    pub operator: ClientId,
    /// Wallet holding provisioned escrow on the token ledger.
    pub escrow_wallet: ClientId,
    /// Wallet receiving settled dues and fees.
    pub revenue_wallet: ClientId,
    /// One-time fee charged when a client applies for power-user status.
    pub power_user_club_fee: TokenAmount,
    /// Fee charged on every historical data request.
    pub historical_data_fee: TokenAmount,
    /// Minimum escrow balance to retain power-user status.
    pub power_user_minimum: TokenAmount,
}

impl MarketParams {
    /// Create params with default capacity and fees.
    #[must_use]
    pub fn new(operator: ClientId, escrow_wallet: ClientId, revenue_wallet: ClientId) -> Self {
        Self {
            seat_capacity: constants::DEFAULT_SEAT_CAPACITY,
            operator,
            escrow_wallet,
            revenue_wallet,
            power_user_club_fee: constants::DEFAULT_POWER_USER_CLUB_FEE,
            historical_data_fee: constants::DEFAULT_HISTORICAL_DATA_FEE,
            power_user_minimum: constants::DEFAULT_POWER_USER_MINIMUM,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_applied() {
        let params = MarketParams::new(ClientId::new(), ClientId::new(), ClientId::new());
        assert_eq!(params.seat_capacity, constants::DEFAULT_SEAT_CAPACITY);
        assert_eq!(params.power_user_club_fee, 0);
        assert_eq!(params.historical_data_fee, 0);
    }

    #[test]
    fn params_serde_roundtrip() {
        let params = MarketParams::new(ClientId::new(), ClientId::new(), ClientId::new());
        let json = serde_json::to_string(&params).unwrap();
        let back: MarketParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }
}
