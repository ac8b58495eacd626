//! Strategy catalog entries.
//!
//! Each strategy contributes an additive usefulness weight to a running
//! total that scales the clearing price. Entries are append-only and
//! immutable once added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One strategy in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Unique strategy name.
    pub name: String,
    /// Additive usefulness weight (fractional weights are allowed).
    pub incremental_usefulness: Decimal,
}

impl Strategy {
    #[must_use]
    pub fn new(name: impl Into<String>, incremental_usefulness: Decimal) -> Self {
        Self {
            name: name.into(),
            incremental_usefulness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_serde_roundtrip() {
        let strat = Strategy::new("momentum-7d", Decimal::new(25, 1)); // 2.5
        let json = serde_json::to_string(&strat).unwrap();
        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(strat, back);
    }
}
