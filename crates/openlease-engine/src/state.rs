//! The persisted market state and the lease-term catch-up loop.
//!
//! All durable state lives in [`MarketState`], which is persisted as a
//! single document through the storage vault. Term advancement is lazy and
//! pull-based: nothing runs on a clock — any operation supplies `now`, and
//! the state catches up one boundary at a time until it reaches the term
//! containing `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::HashSet;

use openlease_registry::{BidBook, allocate, rent_per_seat};
use openlease_types::{
    ClientId, MarketParams, Receipt, ReceiptKind, TermIndex, TokenAmount, constants, full_dues,
};

use crate::account_book::AccountBook;
use crate::catalog::StrategyCatalog;

/// Per-term pricing state.
///
/// The settled rent for a term is locked exactly once — at the boundary
/// crossing when the entry allocation grants seats, or deferred to the first
/// mid-term seat grant when the term is entered with an empty book. Rents
/// for old terms are retained so a long-idle client can be caught up at the
/// prices that were in force.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLedger {
    /// The term the state has been settled through.
    pub current_term: TermIndex,
    /// Settled rent per seat for every term that locked a price.
    settled_rents: BTreeMap<TermIndex, TokenAmount>,
}

impl TermLedger {
    #[must_use]
    pub fn new(current_term: TermIndex) -> Self {
        Self {
            current_term,
            settled_rents: BTreeMap::new(),
        }
    }

    /// The settled rent per seat for a term, if it has locked one.
    #[must_use]
    pub fn rent_for(&self, term: TermIndex) -> Option<TokenAmount> {
        self.settled_rents.get(&term).copied()
    }

    /// Lock a term's rent. A second lock for the same term is ignored — the
    /// settled price is fixed for the term's duration.
    pub fn lock_rent(&mut self, term: TermIndex, rent: TokenAmount) {
        self.settled_rents.entry(term).or_insert(rent);
    }
}

/// A token movement implied by a committed state transition, to be executed
/// against the external token ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerMove {
    pub from: ClientId,
    pub to: ClientId,
    pub amount: TokenAmount,
}

/// The complete durable state of one seat-leasing market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketState {
    pub params: MarketParams,
    pub accounts: AccountBook,
    pub bids: BidBook,
    pub catalog: StrategyCatalog,
    pub terms: TermLedger,
    /// Append-only audit trail of monetary effects.
    pub receipts: Vec<Receipt>,
    /// Dispatcher-visible logic version (see `RentalEngine::upgrade_to`).
    pub version: String,
}

impl MarketState {
    /// Fresh state anchored at the term containing `genesis`.
    #[must_use]
    pub fn new(params: MarketParams, genesis: DateTime<Utc>) -> Self {
        Self {
            params,
            accounts: AccountBook::new(),
            bids: BidBook::new(),
            catalog: StrategyCatalog::new(),
            terms: TermLedger::new(TermIndex::containing(genesis)),
            receipts: Vec::new(),
            version: constants::VERSION.to_string(),
        }
    }

    /// Catch up through every term boundary between the settled term and the
    /// term containing `now`, returning the token moves the crossing implied.
    ///
    /// Idempotent: a second call with the same `now` is a no-op. Work is
    /// bounded by elapsed terms times active bids.
    pub fn advance_to(&mut self, now: DateTime<Utc>) -> Vec<LedgerMove> {
        let target = TermIndex::containing(now);
        let mut moves = Vec::new();
        while self.terms.current_term < target {
            let term = self.terms.current_term.next();
            self.roll_into(term, now, &mut moves);
            self.terms.current_term = term;
        }
        moves
    }

    /// Process one term boundary: allocate, lock the term's rent, charge
    /// every granted client, evict those who cannot pay.
    fn roll_into(&mut self, term: TermIndex, now: DateTime<Utc>, moves: &mut Vec<LedgerMove>) {
        let alloc = allocate(&self.bids, self.params.seat_capacity);
        if !alloc.is_empty() {
            let rent = rent_per_seat(
                alloc.marginal_price,
                self.catalog.total_incremental_usefulness(),
            );
            self.terms.lock_rent(term, rent);
        }
        let rent = self.terms.rent_for(term).unwrap_or(0);

        let mut seated: HashSet<ClientId> = HashSet::new();
        let mut evicted = 0_usize;

        for grant in &alloc.grants {
            let due = full_dues(rent, grant.seats);
            match self.accounts.debit(grant.client, due) {
                Ok(()) => {
                    let account = self.accounts.entry(grant.client);
                    account.current_term_seats = grant.seats;
                    account.paid_through_term = Some(term);
                    seated.insert(grant.client);
                    if due > 0 {
                        moves.push(LedgerMove {
                            from: self.params.escrow_wallet,
                            to: self.params.revenue_wallet,
                            amount: due,
                        });
                        self.receipts.push(Receipt::new(
                            ReceiptKind::TermDues,
                            grant.client,
                            term,
                            due,
                            Some(grant.seats),
                            now,
                        ));
                    }
                    tracing::debug!(
                        client = %grant.client,
                        term = %term,
                        seats = grant.seats,
                        due,
                        "Term dues charged"
                    );
                }
                Err(_) => {
                    // Cannot cover the term: forfeit seats, keep the balance.
                    // Freed seats re-enter allocation at the next boundary.
                    self.bids.remove(grant.client);
                    let account = self.accounts.entry(grant.client);
                    account.current_term_seats = 0;
                    account.paid_through_term = Some(term);
                    evicted += 1;
                    self.receipts.push(Receipt::new(
                        ReceiptKind::Eviction,
                        grant.client,
                        term,
                        due,
                        Some(grant.seats),
                        now,
                    ));
                    tracing::warn!(
                        client = %grant.client,
                        term = %term,
                        seats = grant.seats,
                        due,
                        "Client evicted: escrow cannot cover term dues"
                    );
                }
            }
        }

        // Outbid or cancelled clients lose their seats at the boundary.
        for (client, account) in self.accounts.iter_mut() {
            if !seated.contains(client) {
                account.current_term_seats = 0;
            }
        }

        tracing::info!(
            term = %term,
            rent,
            seats = alloc.total_seats,
            renters = seated.len(),
            evicted,
            "Lease term rolled"
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn client(n: u8) -> ClientId {
        ClientId::from_bytes([n; 16])
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
    }

    fn state_with_catalog(genesis: DateTime<Utc>) -> MarketState {
        let params = MarketParams::new(client(100), client(101), client(102));
        let mut state = MarketState::new(params, genesis);
        state.catalog.add("alpha", Decimal::from(3)).unwrap();
        state.catalog.add("beta", Decimal::from(2)).unwrap();
        state.catalog.add("gamma", Decimal::from(1)).unwrap();
        state
    }

    #[test]
    fn advance_is_idempotent() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.accounts.credit(client(1), 10_000_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);

        let now = at(2025, 3, 5);
        let moves = state.advance_to(now);
        assert!(!moves.is_empty());
        let balance = state.accounts.balance(client(1));

        let again = state.advance_to(now);
        assert!(again.is_empty());
        assert_eq!(state.accounts.balance(client(1)), balance);
        assert_eq!(state.terms.current_term, TermIndex::containing(now));
    }

    #[test]
    fn boundary_charges_full_rent_per_term() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.accounts.credit(client(1), 1_000_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);

        // Two boundaries crossed: rent = 1_000 * 6 = 6_000 per seat,
        // 10 seats -> 60_000 per term.
        let moves = state.advance_to(at(2025, 3, 5));
        assert_eq!(state.accounts.balance(client(1)), 1_000_000 - 2 * 60_000);
        assert_eq!(moves.iter().map(|m| m.amount).sum::<TokenAmount>(), 120_000);
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 10);
        assert_eq!(
            state.accounts.entry(client(1)).paid_through_term,
            Some(state.terms.current_term)
        );
    }

    #[test]
    fn rent_locks_at_boundary_and_ignores_later_strategy_adds() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.accounts.credit(client(1), 10_000_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);

        state.advance_to(at(2025, 2, 3));
        let term = state.terms.current_term;
        assert_eq!(state.terms.rent_for(term), Some(6_000));

        // Mid-term strategy add: the locked rent must not move.
        state.catalog.add("delta", Decimal::from(4)).unwrap();
        state.terms.lock_rent(term, 99_999);
        assert_eq!(state.terms.rent_for(term), Some(6_000));
    }

    #[test]
    fn insolvent_client_is_evicted_with_balance_intact() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        // Rent will be 6_000/seat; 10 seats = 60_000/term. Fund one term only.
        state.accounts.credit(client(1), 70_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);

        state.advance_to(at(2025, 2, 3));
        assert_eq!(state.accounts.balance(client(1)), 10_000);
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 10);

        state.advance_to(at(2025, 3, 3));
        // Second boundary: 60_000 due, only 10_000 left -> evicted.
        assert_eq!(state.accounts.balance(client(1)), 10_000);
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 0);
        assert!(!state.bids.contains(client(1)));
        assert!(
            state
                .receipts
                .iter()
                .any(|r| r.kind == ReceiptKind::Eviction && r.client == client(1))
        );
    }

    #[test]
    fn eviction_frees_seats_for_the_next_pass() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        // Capacity 100: rich client wants 60, poor client 50 (gets 40),
        // shut-out client 10.
        state.accounts.credit(client(1), 100_000_000).unwrap();
        state.accounts.credit(client(2), 1).unwrap();
        state.accounts.credit(client(3), 100_000_000).unwrap();
        state.bids.upsert(client(1), 2_000, 60);
        state.bids.upsert(client(2), 1_000, 50);
        state.bids.upsert(client(3), 500, 10);

        state.advance_to(at(2025, 2, 3));
        // Client 2 evicted at the boundary; client 3 stays shut out this term.
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 60);
        assert_eq!(state.accounts.entry(client(2)).current_term_seats, 0);
        assert_eq!(state.accounts.entry(client(3)).current_term_seats, 0);

        state.advance_to(at(2025, 3, 3));
        // Freed seats reach the lower bidder one boundary later.
        assert_eq!(state.accounts.entry(client(3)).current_term_seats, 10);
    }

    #[test]
    fn cancelled_bid_keeps_seats_until_the_boundary() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.accounts.credit(client(1), 1_000_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);

        state.advance_to(at(2025, 2, 3));
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 10);

        state.bids.remove(client(1));
        // Seats persist mid-term (already paid for)...
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 10);

        // ...and clear at the next boundary with no further charge.
        let balance = state.accounts.balance(client(1));
        state.advance_to(at(2025, 3, 3));
        assert_eq!(state.accounts.entry(client(1)).current_term_seats, 0);
        assert_eq!(state.accounts.balance(client(1)), balance);
    }

    #[test]
    fn empty_entry_defers_rent_lock() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.advance_to(at(2025, 4, 1));
        assert_eq!(state.terms.rent_for(state.terms.current_term), None);
        assert!(state.advance_to(at(2025, 4, 1)).is_empty());
    }

    #[test]
    fn state_serde_roundtrip() {
        let mut state = state_with_catalog(at(2025, 1, 10));
        state.accounts.credit(client(1), 500_000).unwrap();
        state.bids.upsert(client(1), 1_000, 10);
        state.advance_to(at(2025, 2, 3));

        let json = serde_json::to_string(&state).unwrap();
        let back: MarketState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.terms, state.terms);
        assert_eq!(back.accounts, state.accounts);
        assert_eq!(back.receipts, state.receipts);
        assert_eq!(back.version, state.version);
    }
}
