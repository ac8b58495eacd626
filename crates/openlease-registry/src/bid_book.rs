//! The price-ordered bid registry.
//!
//! Uses a `BTreeMap` keyed by `(price descending, insertion sequence)` so
//! iteration yields the highest-priced bid first, with ties won by the
//! earlier bid. An auxiliary `HashMap<ClientId, BidKey>` enables O(log N)
//! reposition and removal.
//!
//! Exactly one bid per client. A bid with zero requested seats is removed
//! outright — the client's already-paid current-term allocation is tracked
//! by the engine, not here.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Unbounded};

use openlease_types::{ClientId, LeaseError, Result, SeatBid, TokenAmount};
use serde::{Deserialize, Serialize};

/// Ranking key: descending price, then ascending insertion sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidKey {
    pub price: TokenAmount,
    pub seq: u64,
}

impl Ord for BidKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .price
            .cmp(&self.price)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for BidKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// The registry of active bids, ordered best-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BidBookDoc", into = "BidBookDoc")]
pub struct BidBook {
    /// Rank order: highest price first, earlier insertion wins ties.
    ranks: BTreeMap<BidKey, SeatBid>,
    /// Fast lookup: `ClientId -> BidKey` for O(log N) reposition/removal.
    index: HashMap<ClientId, BidKey>,
    /// Monotone insertion counter; never reused.
    next_seq: u64,
}

impl BidBook {
    /// Create a new empty bid book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Mutation
    // =================================================================

    /// Insert or reposition a client's bid.
    ///
    /// Zero requested seats removes the bid. Re-bidding at the same price
    /// updates the seat count in place (keeping tie seniority); re-bidding
    /// at a different price repositions the node with a fresh sequence.
    pub fn upsert(&mut self, client: ClientId, price_per_seat: TokenAmount, requested_seats: u32) {
        if requested_seats == 0 {
            self.remove(client);
            return;
        }

        if let Some(key) = self.index.get(&client).copied() {
            if key.price == price_per_seat {
                if let Some(bid) = self.ranks.get_mut(&key) {
                    bid.requested_seats = requested_seats;
                }
                return;
            }
            self.ranks.remove(&key);
        }

        let key = BidKey {
            price: price_per_seat,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.index.insert(client, key);
        self.ranks
            .insert(key, SeatBid::new(client, price_per_seat, requested_seats));
    }

    /// Remove a client's bid (cancellation or eviction). Returns the removed
    /// bid, or `None` if the client had none.
    pub fn remove(&mut self, client: ClientId) -> Option<SeatBid> {
        let key = self.index.remove(&client)?;
        self.ranks.remove(&key)
    }

    // =================================================================
    // Queries
    // =================================================================

    /// The bid registered for a client, if any.
    #[must_use]
    pub fn get(&self, client: ClientId) -> Option<&SeatBid> {
        self.index.get(&client).and_then(|key| self.ranks.get(key))
    }

    /// Whether a client has an active bid.
    #[must_use]
    pub fn contains(&self, client: ClientId) -> bool {
        self.index.contains_key(&client)
    }

    /// Number of active bids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Returns `true` if no bids are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    // =================================================================
    // Ordered traversal
    // =================================================================

    /// Iterate bids best-first (highest price, earliest on ties).
    pub fn iter(&self) -> impl Iterator<Item = &SeatBid> {
        self.ranks.values()
    }

    /// The best-ranked bid, or `None` if the book is empty.
    #[must_use]
    pub fn highest(&self) -> Option<&SeatBid> {
        self.ranks.values().next()
    }

    /// The bid ranked immediately below the given client's.
    ///
    /// # Errors
    /// `BidNotFound` if the client has no bid; `NoLowerBid` if it is the
    /// lowest-ranked bidder.
    pub fn next_below(&self, after: ClientId) -> Result<&SeatBid> {
        let key = self
            .index
            .get(&after)
            .copied()
            .ok_or(LeaseError::BidNotFound(after))?;
        self.ranks
            .range((Excluded(key), Unbounded))
            .map(|(_, bid)| bid)
            .next()
            .ok_or(LeaseError::NoLowerBid(after))
    }
}

// ---------------------------------------------------------------------------
// Serialization: JSON map keys must be strings, so the book round-trips
// through a flat document and the index is rebuilt on load.
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct BidBookDoc {
    next_seq: u64,
    bids: Vec<(BidKey, SeatBid)>,
}

impl From<BidBook> for BidBookDoc {
    fn from(book: BidBook) -> Self {
        Self {
            next_seq: book.next_seq,
            bids: book.ranks.into_iter().collect(),
        }
    }
}

impl From<BidBookDoc> for BidBook {
    fn from(doc: BidBookDoc) -> Self {
        let mut book = BidBook {
            ranks: BTreeMap::new(),
            index: HashMap::new(),
            next_seq: doc.next_seq,
        };
        for (key, bid) in doc.bids {
            book.index.insert(bid.client, key);
            book.ranks.insert(key, bid);
        }
        book
    }
}
