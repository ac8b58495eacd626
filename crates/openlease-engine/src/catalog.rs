//! The strategy catalog.
//!
//! Append-only list of strategies, each contributing an additive usefulness
//! weight. The running total scales the clearing price; entries are created
//! only by the operator and never removed.

use openlease_types::{LeaseError, Result, Strategy};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Append-only strategy list with a maintained usefulness total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCatalog {
    entries: Vec<Strategy>,
    total: Decimal,
}

impl StrategyCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a strategy.
    ///
    /// # Errors
    /// `DuplicateStrategy` if the name is already present; `Internal` for a
    /// negative usefulness weight.
    pub fn add(&mut self, name: impl Into<String>, incremental_usefulness: Decimal) -> Result<()> {
        let name = name.into();
        if incremental_usefulness.is_sign_negative() {
            return Err(LeaseError::Internal(format!(
                "negative usefulness for strategy {name}"
            )));
        }
        if self.entries.iter().any(|s| s.name == name) {
            return Err(LeaseError::DuplicateStrategy(name));
        }
        self.total += incremental_usefulness;
        self.entries.push(Strategy::new(name, incremental_usefulness));
        Ok(())
    }

    /// Sum of usefulness weights across all strategies.
    #[must_use]
    pub fn total_incremental_usefulness(&self) -> Decimal {
        self.total
    }

    /// Number of strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The strategy at `index`.
    ///
    /// # Errors
    /// `StrategyIndexOutOfRange` if no such entry exists.
    pub fn get(&self, index: usize) -> Result<&Strategy> {
        self.entries
            .get(index)
            .ok_or(LeaseError::StrategyIndexOutOfRange(index))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.entries.iter()
    }
}
