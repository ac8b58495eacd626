//! Greedy seat allocation over the ordered bid book.
//!
//! The allocator walks the book best-first, granting each bid its full
//! requested seat count while it fits. The first bid that only partially
//! fits receives the remaining capacity and the walk stops — no
//! lower-ranked bid is allocated in that pass.

use openlease_types::{ClientId, SeatBid, TokenAmount};

use crate::bid_book::BidBook;

/// Seats granted to a single client in one allocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatGrant {
    pub client: ClientId,
    pub seats: u32,
    pub price_per_seat: TokenAmount,
}

/// Result of one allocation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatAllocation {
    /// Grants in rank order (highest-priced bidder first).
    pub grants: Vec<SeatGrant>,
    /// Price of the lowest-priced bid granted at least one seat; 0 if none.
    pub marginal_price: TokenAmount,
    /// Total seats granted across all clients.
    pub total_seats: u32,
}

impl SeatAllocation {
    /// Seats granted to the given client (0 if none).
    #[must_use]
    pub fn seats_for(&self, client: ClientId) -> u32 {
        self.grants
            .iter()
            .find(|g| g.client == client)
            .map_or(0, |g| g.seats)
    }

    /// Returns `true` if no seats were granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

/// Allocate `capacity` seats over all bids in the book.
#[must_use]
pub fn allocate(book: &BidBook, capacity: u32) -> SeatAllocation {
    allocate_where(book, capacity, |_| true)
}

/// Allocate `capacity` seats over the bids accepted by `include`.
///
/// Used for the indicative next-term view, where bids whose clients cannot
/// afford a single seat are skipped.
pub fn allocate_where(
    book: &BidBook,
    capacity: u32,
    mut include: impl FnMut(&SeatBid) -> bool,
) -> SeatAllocation {
    let mut grants = Vec::new();
    let mut remaining = capacity;
    let mut marginal_price = 0;

    for bid in book.iter() {
        if remaining == 0 {
            break;
        }
        if !include(bid) {
            continue;
        }
        let seats = bid.requested_seats.min(remaining);
        if seats == 0 {
            continue;
        }
        remaining -= seats;
        marginal_price = bid.price_per_seat;
        grants.push(SeatGrant {
            client: bid.client,
            seats,
            price_per_seat: bid.price_per_seat,
        });
        // Partial fit: the walk stops, leftover capacity stays unassigned.
        if seats < bid.requested_seats {
            break;
        }
    }

    SeatAllocation {
        marginal_price,
        total_seats: capacity - remaining,
        grants,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(n: u8) -> ClientId {
        ClientId::from_bytes([n; 16])
    }

    fn book_of(bids: &[(u8, TokenAmount, u32)]) -> BidBook {
        let mut book = BidBook::new();
        for &(id, price, seats) in bids {
            book.upsert(client(id), price, seats);
        }
        book
    }

    #[test]
    fn empty_book_allocates_nothing() {
        let alloc = allocate(&BidBook::new(), 100);
        assert!(alloc.is_empty());
        assert_eq!(alloc.marginal_price, 0);
        assert_eq!(alloc.total_seats, 0);
    }

    #[test]
    fn all_bids_fit_under_capacity() {
        let book = book_of(&[(1, 10_000, 10), (2, 20_000, 7), (3, 6_000, 3)]);
        let alloc = allocate(&book, 100);
        assert_eq!(alloc.total_seats, 20);
        assert_eq!(alloc.marginal_price, 6_000);
        assert_eq!(alloc.seats_for(client(1)), 10);
        assert_eq!(alloc.seats_for(client(2)), 7);
        assert_eq!(alloc.seats_for(client(3)), 3);
    }

    #[test]
    fn grants_are_in_rank_order() {
        let book = book_of(&[(1, 10_000, 10), (2, 20_000, 7)]);
        let alloc = allocate(&book, 100);
        let order: Vec<ClientId> = alloc.grants.iter().map(|g| g.client).collect();
        assert_eq!(order, vec![client(2), client(1)]);
    }

    #[test]
    fn partial_fit_stops_the_walk() {
        // 60 + 50 exceeds 100: the second bid gets the remaining 40 and the
        // third bid gets nothing even though capacity would have been left
        // had the walk continued differently.
        let book = book_of(&[(1, 20_000, 60), (2, 10_000, 50), (3, 6_000, 10)]);
        let alloc = allocate(&book, 100);
        assert_eq!(alloc.seats_for(client(1)), 60);
        assert_eq!(alloc.seats_for(client(2)), 40);
        assert_eq!(alloc.seats_for(client(3)), 0);
        assert_eq!(alloc.total_seats, 100);
        assert_eq!(alloc.marginal_price, 10_000);
    }

    #[test]
    fn exact_fit_stops_before_next_bid() {
        let book = book_of(&[(1, 20_000, 60), (2, 10_000, 40), (3, 6_000, 10)]);
        let alloc = allocate(&book, 100);
        assert_eq!(alloc.total_seats, 100);
        assert_eq!(alloc.seats_for(client(3)), 0);
        assert_eq!(alloc.marginal_price, 10_000);
    }

    #[test]
    fn ten_full_bidders_shut_out_the_eleventh() {
        let mut bids: Vec<(u8, TokenAmount, u32)> =
            (1..=10).map(|n| (n, 10_000, 10)).collect();
        bids.push((11, 10_000, 10));
        let book = book_of(&bids);
        let alloc = allocate(&book, 100);
        assert_eq!(alloc.total_seats, 100);
        assert_eq!(alloc.seats_for(client(11)), 0);
        for n in 1..=10 {
            assert_eq!(alloc.seats_for(client(n)), 10);
        }
    }

    #[test]
    fn filter_skips_excluded_bids() {
        let book = book_of(&[(1, 20_000, 10), (2, 10_000, 10), (3, 6_000, 10)]);
        let alloc = allocate_where(&book, 100, |bid| bid.client != client(2));
        assert_eq!(alloc.seats_for(client(1)), 10);
        assert_eq!(alloc.seats_for(client(2)), 0);
        assert_eq!(alloc.seats_for(client(3)), 10);
        assert_eq!(alloc.marginal_price, 6_000);
    }

    #[test]
    fn cancelling_highest_admits_lower_marginal() {
        // Capacity-constrained: the lowest bid is shut out until the top
        // bidder leaves, then becomes the marginal bid.
        let mut book = book_of(&[(1, 20_000, 60), (2, 10_000, 50), (3, 6_000, 10)]);
        assert_eq!(allocate(&book, 100).marginal_price, 10_000);

        book.remove(client(1));
        let alloc = allocate(&book, 100);
        assert_eq!(alloc.seats_for(client(2)), 50);
        assert_eq!(alloc.seats_for(client(3)), 10);
        assert_eq!(alloc.marginal_price, 6_000);
    }
}
