//! Upgrade-safety tests for the storage-indirection seam.
//!
//! The engine persists all durable state through its vault, so replacing
//! the logic component (dropping one engine, attaching another to the same
//! vault) must preserve every account, bid, settled price, and receipt.

use chrono::{DateTime, TimeZone, Utc};
use openlease_engine::{JsonFileVault, MemoryLedger, MemoryVault, RentalEngine};
use openlease_types::{ClientId, LeaseError, MarketParams};
use rust_decimal::Decimal;

fn client(n: u8) -> ClientId {
    ClientId::from_bytes([n; 16])
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 9, 0, 0).unwrap()
}

fn seeded_engine() -> RentalEngine<MemoryVault, MemoryLedger> {
    let operator = client(100);
    let params = MarketParams::new(operator, client(101), client(102));
    let mut ledger = MemoryLedger::new();
    ledger.mint(client(1), 1_000_000_000);
    let mut engine =
        RentalEngine::new(params, MemoryVault::new(), ledger, at(2025, 1, 1)).unwrap();
    engine
        .add_strategy(operator, "strat-a", Decimal::from(12), at(2025, 1, 1))
        .unwrap();
    engine.provision(client(1), 100_000_000, at(2025, 1, 5)).unwrap();
    engine.lease_seats(client(1), 10_000, 5, at(2025, 1, 5)).unwrap();
    engine
}

#[test]
fn state_survives_logic_replacement() {
    let mut old = seeded_engine();
    // Let several terms elapse and settle them through the old logic.
    old.update_lease_terms(at(2025, 7, 10)).unwrap();
    let now = at(2025, 7, 11);
    let rent = old.rent_per_seat_current_term(now);
    let allowance = old.allowance(client(1), now);
    let seats = old.current_term_seats(client(1), now);
    let receipts = old.receipts().len();

    // "Upgrade": a brand-new engine attaches to the same vault and ledger.
    let reopened =
        RentalEngine::reopen(old.vault().clone(), old.ledger().clone()).unwrap();
    assert_eq!(reopened.rent_per_seat_current_term(now), rent);
    assert_eq!(reopened.allowance(client(1), now), allowance);
    assert_eq!(reopened.current_term_seats(client(1), now), seats);
    assert_eq!(reopened.receipts().len(), receipts);
    for receipt in reopened.receipts() {
        assert!(receipt.verify());
    }
}

#[test]
fn new_logic_version_keeps_serving_old_state() {
    let mut old = seeded_engine();
    old.upgrade_to(client(100), "2.0", at(2025, 1, 6)).unwrap();
    let allowance = old.allowance(client(1), at(2025, 1, 6));

    let mut v2 = RentalEngine::reopen(old.vault().clone(), old.ledger().clone()).unwrap();
    assert_eq!(v2.version(), "2.0");
    assert_eq!(v2.allowance(client(1), at(2025, 1, 6)), allowance);

    // The upgraded engine keeps mutating the carried-over accounts.
    v2.provision(client(1), 10_000, at(2025, 1, 7)).unwrap();
    assert_eq!(v2.allowance(client(1), at(2025, 1, 7)), allowance + 10_000);
}

#[test]
fn reopen_on_an_empty_vault_fails() {
    let result = RentalEngine::reopen(MemoryVault::new(), MemoryLedger::new());
    assert!(matches!(result, Err(LeaseError::StorageFailure(_))));
}

#[test]
fn file_backed_vault_roundtrips_a_market() {
    let dir = std::env::temp_dir().join("openlease-upgrade-test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("market.json");
    let _ = std::fs::remove_file(&path);

    let operator = client(100);
    let params = MarketParams::new(operator, client(101), client(102));
    let mut ledger = MemoryLedger::new();
    ledger.mint(client(1), 1_000_000_000);

    let mut engine =
        RentalEngine::new(params, JsonFileVault::new(&path), ledger, at(2025, 1, 1)).unwrap();
    engine
        .add_strategy(operator, "strat-a", Decimal::from(12), at(2025, 1, 1))
        .unwrap();
    engine.provision(client(1), 50_000_000, at(2025, 1, 5)).unwrap();
    engine.lease_seats(client(1), 10_000, 5, at(2025, 1, 5)).unwrap();
    let allowance = engine.allowance(client(1), at(2025, 1, 5));
    let ledger_snapshot = engine.ledger().clone();
    drop(engine);

    let reopened = RentalEngine::reopen(JsonFileVault::new(&path), ledger_snapshot).unwrap();
    assert_eq!(reopened.allowance(client(1), at(2025, 1, 5)), allowance);
    assert_eq!(reopened.current_term_seats(client(1), at(2025, 1, 5)), 5);

    std::fs::remove_file(&path).unwrap();
}
