//! Seat bid model.
//!
//! A bid declares the price per seat a client is willing to pay and how many
//! seats it wants. The registry keeps exactly one bid per client, ordered by
//! price descending with insertion-order tie-break.

use serde::{Deserialize, Serialize};

use crate::account::TokenAmount;
use crate::ids::ClientId;

/// A single client's standing bid for seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatBid {
    pub client: ClientId,
    /// Price per seat per term, in the smallest token unit.
    pub price_per_seat: TokenAmount,
    /// Seats the client wants from the next allocation pass.
    pub requested_seats: u32,
}

impl SeatBid {
    #[must_use]
    pub fn new(client: ClientId, price_per_seat: TokenAmount, requested_seats: u32) -> Self {
        Self {
            client,
            price_per_seat,
            requested_seats,
        }
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl SeatBid {
    #[must_use]
    pub fn dummy(price_per_seat: TokenAmount, requested_seats: u32) -> Self {
        Self::new(ClientId::new(), price_per_seat, requested_seats)
    }
}
