//! The lease-term engine: every client-facing mutation and the full
//! observable read surface.
//!
//! Control flow per operation: settle the market to `now`, apply the
//! operation's own effect, move tokens, persist, commit. A failure at any
//! step leaves balances, orderings, and the external ledger exactly as
//! before the call.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use openlease_registry::{SeatAllocation, allocate, allocate_where, rent_per_seat};
use openlease_types::{
    ClientId, ClientSummary, LeaseError, MarketParams, Receipt, ReceiptKind, Result, SeatBid,
    Strategy, TermIndex, TokenAmount, day_of_term, days_in_term, prorated_dues,
};

use crate::ledger::TokenLedger;
use crate::state::{LedgerMove, MarketState};
use crate::vault::StateVault;

/// The seat-leasing marketplace engine.
///
/// Generic over its two collaborator seams: the storage vault `S` (durable
/// state indirection) and the token ledger `L` (fund movement).
pub struct RentalEngine<S: StateVault, L: TokenLedger> {
    state: MarketState,
    vault: S,
    ledger: L,
}

impl<S: StateVault, L: TokenLedger> RentalEngine<S, L> {
    /// Create a fresh market anchored at the term containing `genesis` and
    /// persist its initial state.
    pub fn new(params: MarketParams, mut vault: S, ledger: L, genesis: DateTime<Utc>) -> Result<Self> {
        let state = MarketState::new(params, genesis);
        vault.save(&state)?;
        Ok(Self {
            state,
            vault,
            ledger,
        })
    }

    /// Reconstruct an engine from a vault that already holds market state.
    ///
    /// This is the upgrade path: a new logic version attaches to the same
    /// vault and finds every account, bid, and settled price intact.
    pub fn reopen(vault: S, ledger: L) -> Result<Self> {
        let state = vault
            .load()?
            .ok_or_else(|| LeaseError::StorageFailure("vault holds no market state".into()))?;
        Ok(Self {
            state,
            vault,
            ledger,
        })
    }

    // =================================================================
    // Mutation plumbing
    // =================================================================

    /// Settle to `now`, apply `apply`, execute token moves, persist, commit.
    fn commit<T>(
        &mut self,
        now: DateTime<Utc>,
        apply: impl FnOnce(&mut MarketState) -> Result<(T, Vec<LedgerMove>)>,
    ) -> Result<T> {
        if !self.vault.authorized() {
            return Err(LeaseError::StorageRevoked);
        }
        let mut next = self.state.clone();
        let advance_moves = next.advance_to(now);
        let (out, op_moves) = apply(&mut next)?;
        // Client-sourced moves run first so a rejected provision leaves the
        // external ledger untouched.
        for mv in op_moves.iter().chain(&advance_moves) {
            self.ledger.transfer_from(mv.from, mv.to, mv.amount)?;
        }
        self.vault.save(&next)?;
        self.state = next;
        Ok(out)
    }

    fn ensure_operator(&self, caller: ClientId) -> Result<()> {
        if caller == self.state.params.operator {
            Ok(())
        } else {
            Err(LeaseError::Unauthorized(caller))
        }
    }

    // =================================================================
    // Client-facing mutations
    // =================================================================

    /// Move `amount` tokens from the client into escrow.
    pub fn provision(&mut self, client: ClientId, amount: TokenAmount, now: DateTime<Utc>) -> Result<()> {
        self.commit(now, |state| {
            state.accounts.credit(client, amount)?;
            let mut moves = Vec::new();
            if amount > 0 {
                state.receipts.push(Receipt::new(
                    ReceiptKind::Provision,
                    client,
                    state.terms.current_term,
                    amount,
                    None,
                    now,
                ));
                moves.push(LedgerMove {
                    from: client,
                    to: state.params.escrow_wallet,
                    amount,
                });
            }
            Ok(((), moves))
        })
    }

    /// Move `amount` tokens from escrow back to the client.
    pub fn withdraw(&mut self, client: ClientId, amount: TokenAmount, now: DateTime<Utc>) -> Result<()> {
        self.commit(now, |state| {
            state.accounts.debit(client, amount)?;
            let mut moves = Vec::new();
            if amount > 0 {
                state.receipts.push(Receipt::new(
                    ReceiptKind::Withdrawal,
                    client,
                    state.terms.current_term,
                    amount,
                    None,
                    now,
                ));
                moves.push(LedgerMove {
                    from: state.params.escrow_wallet,
                    to: client,
                    amount,
                });
            }
            Ok(((), moves))
        })
    }

    /// Place, reposition, or cancel the client's bid (`seats == 0` cancels).
    ///
    /// Newly granted seats are drawn from unallocated capacity only —
    /// existing holders are never displaced mid-term — and are charged the
    /// prorated remainder of the current term up front. A charge the escrow
    /// cannot cover aborts the whole operation, bid included.
    pub fn lease_seats(
        &mut self,
        client: ClientId,
        price_per_seat: TokenAmount,
        seats: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.commit(now, |state| {
            if seats == 0 {
                // Cancellation: the already-paid current-term allocation
                // stands until the next boundary.
                state.bids.remove(client);
                return Ok(((), Vec::new()));
            }
            if price_per_seat == 0 {
                return Err(LeaseError::InvalidBid {
                    reason: "price per seat must be non-zero".into(),
                });
            }

            state.bids.upsert(client, price_per_seat, seats);
            let held = state.accounts.get(client).map_or(0, |a| a.current_term_seats);
            let mut moves = Vec::new();

            if seats > held {
                let taken = state.accounts.total_current_seats();
                let available = state.params.seat_capacity.saturating_sub(taken);
                let extra = (seats - held).min(available);
                if extra > 0 {
                    let term = state.terms.current_term;
                    let rent = match state.terms.rent_for(term) {
                        Some(rent) => rent,
                        None => {
                            // First seats granted this term lock its rent,
                            // with the triggering bid in the allocation.
                            let alloc = allocate(&state.bids, state.params.seat_capacity);
                            let rent = rent_per_seat(
                                alloc.marginal_price,
                                state.catalog.total_incremental_usefulness(),
                            );
                            state.terms.lock_rent(term, rent);
                            rent
                        }
                    };
                    let due = prorated_dues(rent, extra, day_of_term(now), days_in_term(now));
                    state.accounts.debit(client, due)?;
                    let account = state.accounts.entry(client);
                    account.current_term_seats = held + extra;
                    account.paid_through_term = Some(term);
                    if due > 0 {
                        state.receipts.push(Receipt::new(
                            ReceiptKind::LeaseCharge,
                            client,
                            term,
                            due,
                            Some(extra),
                            now,
                        ));
                        moves.push(LedgerMove {
                            from: state.params.escrow_wallet,
                            to: state.params.revenue_wallet,
                            amount: due,
                        });
                    }
                    tracing::debug!(
                        client = %client,
                        term = %term,
                        seats = extra,
                        due,
                        "Seats granted mid-term"
                    );
                } else {
                    // No capacity left this term: the bid stands for the
                    // next allocation pass, nothing is charged.
                    state.accounts.entry(client);
                }
            }
            Ok(((), moves))
        })
    }

    /// Apply for power-user status, paying the club fee once.
    pub fn apply_for_power_user(&mut self, client: ClientId, now: DateTime<Utc>) -> Result<()> {
        self.commit(now, |state| {
            if state
                .accounts
                .get(client)
                .is_some_and(|a| a.power_user_applied)
            {
                return Ok(((), Vec::new()));
            }
            let fee = state.params.power_user_club_fee;
            let balance = state.accounts.balance(client);
            let after_fee = balance
                .checked_sub(fee)
                .ok_or(LeaseError::InsufficientFunds {
                    needed: fee,
                    available: balance,
                })?;
            if after_fee < state.params.power_user_minimum {
                return Err(LeaseError::BelowPowerUserMinimum {
                    minimum: state.params.power_user_minimum,
                    available: after_fee,
                });
            }
            state.accounts.debit(client, fee)?;
            state.accounts.entry(client).power_user_applied = true;
            let mut moves = Vec::new();
            if fee > 0 {
                state.receipts.push(Receipt::new(
                    ReceiptKind::PowerUserFee,
                    client,
                    state.terms.current_term,
                    fee,
                    None,
                    now,
                ));
                moves.push(LedgerMove {
                    from: state.params.escrow_wallet,
                    to: state.params.revenue_wallet,
                    amount: fee,
                });
            }
            Ok(((), moves))
        })
    }

    /// Request historical data access; the fee is charged on every request.
    pub fn request_historical_data(&mut self, client: ClientId, now: DateTime<Utc>) -> Result<()> {
        self.commit(now, |state| {
            let fee = state.params.historical_data_fee;
            state.accounts.debit(client, fee)?;
            state.accounts.entry(client).historical_data_access = true;
            let mut moves = Vec::new();
            if fee > 0 {
                state.receipts.push(Receipt::new(
                    ReceiptKind::HistoricalDataFee,
                    client,
                    state.terms.current_term,
                    fee,
                    None,
                    now,
                ));
                moves.push(LedgerMove {
                    from: state.params.escrow_wallet,
                    to: state.params.revenue_wallet,
                    amount: fee,
                });
            }
            Ok(((), moves))
        })
    }

    /// Public poke: settle the market to `now` and persist.
    pub fn update_lease_terms(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.commit(now, |_| Ok(((), Vec::new())))
    }

    // =================================================================
    // Privileged operations
    // =================================================================

    /// Append a strategy to the catalog, raising the usefulness total for
    /// future terms (the current term's settled rent is unaffected).
    pub fn add_strategy(
        &mut self,
        caller: ClientId,
        name: impl Into<String>,
        incremental_usefulness: Decimal,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        let name = name.into();
        self.commit(now, |state| {
            state.catalog.add(name, incremental_usefulness)?;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_power_user_club_fee(
        &mut self,
        caller: ClientId,
        fee: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        self.commit(now, |state| {
            state.params.power_user_club_fee = fee;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_historical_data_fee(
        &mut self,
        caller: ClientId,
        fee: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        self.commit(now, |state| {
            state.params.historical_data_fee = fee;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_power_user_minimum(
        &mut self,
        caller: ClientId,
        minimum: TokenAmount,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        self.commit(now, |state| {
            state.params.power_user_minimum = minimum;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_escrow_wallet(
        &mut self,
        caller: ClientId,
        wallet: ClientId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        self.commit(now, |state| {
            state.params.escrow_wallet = wallet;
            Ok(((), Vec::new()))
        })
    }

    pub fn set_revenue_wallet(
        &mut self,
        caller: ClientId,
        wallet: ClientId,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        self.commit(now, |state| {
            state.params.revenue_wallet = wallet;
            Ok(((), Vec::new()))
        })
    }

    /// Record the dispatcher-visible logic version. Dispatch itself lives
    /// outside the engine.
    pub fn upgrade_to(
        &mut self,
        caller: ClientId,
        version: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.ensure_operator(caller)?;
        let version = version.into();
        self.commit(now, |state| {
            state.version = version;
            Ok(((), Vec::new()))
        })
    }

    /// Swap the storage vault, writing the current state into the new one.
    /// Returns the previous vault.
    pub fn replace_vault(&mut self, caller: ClientId, mut new_vault: S) -> Result<S> {
        self.ensure_operator(caller)?;
        if !new_vault.authorized() {
            return Err(LeaseError::StorageRevoked);
        }
        new_vault.save(&self.state)?;
        Ok(std::mem::replace(&mut self.vault, new_vault))
    }

    // =================================================================
    // Read surface (post-settlement views, never persisted)
    // =================================================================

    /// A consistent, fully-settled-as-of-`now` snapshot. Borrows when the
    /// state is already current; otherwise settles a clone.
    fn view(&self, now: DateTime<Utc>) -> Cow<'_, MarketState> {
        if TermIndex::containing(now) > self.state.terms.current_term {
            let mut projected = self.state.clone();
            projected.advance_to(now);
            Cow::Owned(projected)
        } else {
            Cow::Borrowed(&self.state)
        }
    }

    fn indicative_allocation(state: &MarketState) -> SeatAllocation {
        let usefulness = state.catalog.total_incremental_usefulness();
        // Skip bids whose clients cannot afford one seat at their own rate.
        allocate_where(&state.bids, state.params.seat_capacity, |bid| {
            state.accounts.balance(bid.client) >= rent_per_seat(bid.price_per_seat, usefulness)
        })
    }

    fn renter_list(state: &MarketState) -> Vec<ClientId> {
        let mut renters: Vec<ClientId> = state
            .bids
            .iter()
            .filter(|bid| {
                state
                    .accounts
                    .get(bid.client)
                    .is_some_and(|a| a.current_term_seats > 0)
            })
            .map(|bid| bid.client)
            .collect();
        let mut unlisted: Vec<ClientId> = state
            .accounts
            .iter()
            .filter(|(client, account)| {
                account.current_term_seats > 0 && !state.bids.contains(**client)
            })
            .map(|(client, _)| *client)
            .collect();
        unlisted.sort_unstable();
        renters.extend(unlisted);
        renters
    }

    /// The settled escrow balance of a client.
    #[must_use]
    pub fn allowance(&self, client: ClientId, now: DateTime<Utc>) -> TokenAmount {
        self.view(now).accounts.balance(client)
    }

    /// The full per-client summary.
    #[must_use]
    pub fn client_summary(&self, client: ClientId, now: DateTime<Utc>) -> ClientSummary {
        let state = self.view(now);
        let account = state.accounts.get(client).cloned().unwrap_or_default();
        ClientSummary {
            client,
            escrow_balance: account.escrow_balance,
            token_balance: self.ledger.balance_of(client),
            lease_term_paid: account.paid_through_term,
            power_user: account.is_power_user(state.params.power_user_minimum),
            historical_data_access: account.historical_data_access,
            current_term_seats: account.current_term_seats,
            indicative_next_term_seats: Self::indicative_allocation(&state).seats_for(client),
        }
    }

    /// The settled rent per seat for the current term (0 until the term's
    /// first seat grant locks a price).
    #[must_use]
    pub fn rent_per_seat_current_term(&self, now: DateTime<Utc>) -> TokenAmount {
        let state = self.view(now);
        state.terms.rent_for(state.terms.current_term).unwrap_or(0)
    }

    /// The live indicative rent per seat for the next term.
    #[must_use]
    pub fn indicative_rent_per_seat_next_term(&self, now: DateTime<Utc>) -> TokenAmount {
        let state = self.view(now);
        openlease_registry::indicative_rent_per_seat(
            &state.bids,
            state.params.seat_capacity,
            state.catalog.total_incremental_usefulness(),
        )
    }

    /// Sum of usefulness weights across the catalog.
    #[must_use]
    pub fn total_incremental_usefulness(&self) -> Decimal {
        self.state.catalog.total_incremental_usefulness()
    }

    /// Seats not currently held by any client.
    #[must_use]
    pub fn seats_available(&self, now: DateTime<Utc>) -> u32 {
        let state = self.view(now);
        state
            .params
            .seat_capacity
            .saturating_sub(state.accounts.total_current_seats())
    }

    /// Number of clients holding seats this term.
    #[must_use]
    pub fn number_of_renters(&self, now: DateTime<Utc>) -> usize {
        Self::renter_list(&self.view(now)).len()
    }

    /// The renter at `index` (bid-rank order, then cancelled holders by id).
    pub fn renter_by_index(&self, index: usize, now: DateTime<Utc>) -> Result<ClientId> {
        Self::renter_list(&self.view(now))
            .get(index)
            .copied()
            .ok_or(LeaseError::RenterIndexOutOfRange(index))
    }

    /// The best-ranked bid, if any.
    #[must_use]
    pub fn highest_bidder(&self, now: DateTime<Utc>) -> Option<SeatBid> {
        self.view(now).bids.highest().cloned()
    }

    /// The bid ranked immediately below the given client's.
    pub fn next_highest_bidder(&self, after: ClientId, now: DateTime<Utc>) -> Result<SeatBid> {
        self.view(now).bids.next_below(after).cloned()
    }

    /// Number of strategies in the catalog.
    #[must_use]
    pub fn strategy_count(&self) -> usize {
        self.state.catalog.len()
    }

    /// The strategy at `index`.
    pub fn strategy(&self, index: usize) -> Result<Strategy> {
        self.state.catalog.get(index).cloned()
    }

    /// The lease term containing `now`.
    #[must_use]
    pub fn current_lease_term(&self, now: DateTime<Utc>) -> TermIndex {
        self.view(now).terms.current_term
    }

    /// Seats the client holds for the current term.
    #[must_use]
    pub fn current_term_seats(&self, client: ClientId, now: DateTime<Utc>) -> u32 {
        self.view(now)
            .accounts
            .get(client)
            .map_or(0, |a| a.current_term_seats)
    }

    /// Seats the client would receive at the next boundary, per the
    /// indicative allocation.
    #[must_use]
    pub fn next_term_seats(&self, client: ClientId, now: DateTime<Utc>) -> u32 {
        Self::indicative_allocation(&self.view(now)).seats_for(client)
    }

    /// Effective power-user status (applied and above the minimum).
    #[must_use]
    pub fn is_power_user(&self, client: ClientId, now: DateTime<Utc>) -> bool {
        let state = self.view(now);
        state
            .accounts
            .get(client)
            .is_some_and(|a| a.is_power_user(state.params.power_user_minimum))
    }

    /// The persisted audit trail.
    #[must_use]
    pub fn receipts(&self) -> &[Receipt] {
        &self.state.receipts
    }

    /// The recorded logic version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.state.version
    }

    /// The market parameters.
    #[must_use]
    pub fn params(&self) -> &MarketParams {
        &self.state.params
    }

    /// The storage vault (e.g. to inspect or toggle its grant in tests).
    #[must_use]
    pub fn vault(&self) -> &S {
        &self.vault
    }

    /// Mutable access to the storage vault.
    pub fn vault_mut(&mut self) -> &mut S {
        &mut self.vault
    }

    /// The token ledger.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable access to the token ledger.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }
}
