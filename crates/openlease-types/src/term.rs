//! Calendar-month term arithmetic.
//!
//! A lease term is one calendar month. There is no stored calendar: the term
//! index is derived on demand from a supplied timestamp, so any call path can
//! catch up an arbitrary number of elapsed terms (lazy, pull-based
//! advancement).
//!
//! Proration uses actual calendar days — months have variable length — and
//! floor division throughout:
//!
//! ```text
//! prorated dues = floor(rent * seats * (D - d + 1) / D)
//! ```
//!
//! where `d` is the 1-based day-of-month of the triggering event and `D` the
//! number of days in that month.

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::account::TokenAmount;
use crate::constants::{LEASE_ANCHOR_MONTH, LEASE_ANCHOR_YEAR};
use crate::ids::TermIndex;

impl TermIndex {
    /// The term containing the given instant: whole calendar months elapsed
    /// since the lease anchor. Instants before the anchor clamp to term 0.
    #[must_use]
    pub fn containing(at: DateTime<Utc>) -> Self {
        let months = i64::from(at.year() - LEASE_ANCHOR_YEAR) * 12 + i64::from(at.month())
            - i64::from(LEASE_ANCHOR_MONTH);
        Self(u32::try_from(months.max(0)).unwrap_or(0))
    }
}

/// 1-based day-of-month of the given instant.
#[must_use]
pub fn day_of_term(at: DateTime<Utc>) -> u32 {
    at.day()
}

/// Number of calendar days in the month containing the given instant.
#[must_use]
pub fn days_in_term(at: DateTime<Utc>) -> u32 {
    days_in_month(at.year(), at.month())
}

/// Number of calendar days in the given month.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}

/// Dues for the remainder of a term, from day `day` (1-based, inclusive) to
/// the end of a `days`-day month. Floor division; saturates at `u64::MAX`.
#[must_use]
pub fn prorated_dues(rent_per_seat: TokenAmount, seats: u32, day: u32, days: u32) -> TokenAmount {
    if days == 0 || seats == 0 {
        return 0;
    }
    let day = day.clamp(1, days);
    let remaining = u128::from(days - day + 1);
    let exact = u128::from(rent_per_seat) * u128::from(seats) * remaining / u128::from(days);
    TokenAmount::try_from(exact).unwrap_or(TokenAmount::MAX)
}

/// Dues for a full term. Saturates at `u64::MAX`.
#[must_use]
pub fn full_dues(rent_per_seat: TokenAmount, seats: u32) -> TokenAmount {
    let exact = u128::from(rent_per_seat) * u128::from(seats);
    TokenAmount::try_from(exact).unwrap_or(TokenAmount::MAX)
}
