//! Price derivation.
//!
//! The clearing price for a term is the marginal bid — the lowest price
//! among bidders granted at least one seat — scaled by the total
//! incremental usefulness of the strategy catalog:
//!
//! ```text
//! rent per seat = floor(marginal_price * total_usefulness)
//! ```
//!
//! The rationale: the marginal price is the minimum an entrant would need
//! to beat to displace the weakest current occupant, so it is the
//! economically meaningful price floor for the next term.

use openlease_types::TokenAmount;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::allocation::allocate;
use crate::bid_book::BidBook;

/// Rent per seat for a given marginal price and usefulness total.
///
/// Floor semantics; saturates at `u64::MAX` on overflow. Zero when no seats
/// are allocated (`marginal_price == 0`) or the catalog is empty.
#[must_use]
pub fn rent_per_seat(marginal_price: TokenAmount, total_usefulness: Decimal) -> TokenAmount {
    if marginal_price == 0 || total_usefulness <= Decimal::ZERO {
        return 0;
    }
    match Decimal::from(marginal_price).checked_mul(total_usefulness) {
        Some(product) => product.floor().to_u64().unwrap_or(TokenAmount::MAX),
        None => TokenAmount::MAX,
    }
}

/// The live indicative rent per seat for the next term.
///
/// Recomputed from the current book and usefulness total on every read — it
/// moves with bid and strategy changes until the term rolls over and the
/// value locks as that term's settled rent.
#[must_use]
pub fn indicative_rent_per_seat(
    book: &BidBook,
    capacity: u32,
    total_usefulness: Decimal,
) -> TokenAmount {
    rent_per_seat(allocate(book, capacity).marginal_price, total_usefulness)
}

#[cfg(test)]
mod tests {
    use openlease_types::ClientId;

    use super::*;

    fn client(n: u8) -> ClientId {
        ClientId::from_bytes([n; 16])
    }

    #[test]
    fn rent_scales_marginal_by_usefulness() {
        assert_eq!(rent_per_seat(10_000, Decimal::from(12)), 120_000);
    }

    #[test]
    fn rent_floors_fractional_usefulness() {
        // 10_000 * 2.5 = 25_000; 999 * 2.5 = 2497.5 -> 2497
        assert_eq!(rent_per_seat(10_000, Decimal::new(25, 1)), 25_000);
        assert_eq!(rent_per_seat(999, Decimal::new(25, 1)), 2_497);
    }

    #[test]
    fn rent_is_zero_without_allocation_or_catalog() {
        assert_eq!(rent_per_seat(0, Decimal::from(12)), 0);
        assert_eq!(rent_per_seat(10_000, Decimal::ZERO), 0);
    }

    #[test]
    fn indicative_tracks_lowest_allocated_bid() {
        let mut book = BidBook::new();
        book.upsert(client(1), 10_000, 1);
        book.upsert(client(2), 6_000, 1);
        assert_eq!(
            indicative_rent_per_seat(&book, 100, Decimal::from(12)),
            72_000
        );

        book.remove(client(2));
        assert_eq!(
            indicative_rent_per_seat(&book, 100, Decimal::from(12)),
            120_000
        );
    }

    #[test]
    fn indicative_ignores_shut_out_bids() {
        // Capacity exhausted before the lowest bid: it does not set the price.
        let mut book = BidBook::new();
        book.upsert(client(1), 20_000, 60);
        book.upsert(client(2), 10_000, 40);
        book.upsert(client(3), 6_000, 10);
        assert_eq!(
            indicative_rent_per_seat(&book, 100, Decimal::from(2)),
            20_000
        );
    }

    #[test]
    fn indicative_is_zero_for_empty_book() {
        assert_eq!(
            indicative_rent_per_seat(&BidBook::new(), 100, Decimal::from(12)),
            0
        );
    }
}
