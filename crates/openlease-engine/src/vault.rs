//! The storage-indirection seam.
//!
//! The engine persists its entire state through this adapter so that
//! replacing the logic component preserves all durable data (see
//! [`crate::RentalEngine::reopen`]). Every state-touching operation fails
//! closed with `StorageRevoked` while the vault's grant is revoked.

use std::path::PathBuf;

use openlease_types::{LeaseError, Result};

use crate::state::MarketState;

/// Durable store for the serialized market state.
pub trait StateVault {
    /// Load the persisted state, if any.
    fn load(&self) -> Result<Option<MarketState>>;

    /// Persist the given state, replacing any previous document.
    fn save(&mut self, state: &MarketState) -> Result<()>;

    /// Whether the engine's grant on this vault is currently active.
    fn authorized(&self) -> bool {
        true
    }
}

/// In-memory vault with a revocable grant, for deterministic testing.
#[derive(Debug, Clone)]
pub struct MemoryVault {
    document: Option<String>,
    granted: bool,
}

impl Default for MemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryVault {
    /// Create an empty, authorized vault.
    #[must_use]
    pub fn new() -> Self {
        Self {
            document: None,
            granted: true,
        }
    }

    /// Grant the engine access.
    pub fn authorize(&mut self) {
        self.granted = true;
    }

    /// Revoke the engine's access; subsequent state-touching calls fail.
    pub fn revoke(&mut self) {
        self.granted = false;
    }
}

impl StateVault for MemoryVault {
    fn load(&self) -> Result<Option<MarketState>> {
        if !self.granted {
            return Err(LeaseError::StorageRevoked);
        }
        self.document
            .as_deref()
            .map(|doc| serde_json::from_str(doc).map_err(LeaseError::from))
            .transpose()
    }

    fn save(&mut self, state: &MarketState) -> Result<()> {
        if !self.granted {
            return Err(LeaseError::StorageRevoked);
        }
        self.document = Some(serde_json::to_string(state)?);
        Ok(())
    }

    fn authorized(&self) -> bool {
        self.granted
    }
}

/// File-backed vault: one JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileVault {
    path: PathBuf,
}

impl JsonFileVault {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StateVault for JsonFileVault {
    fn load(&self) -> Result<Option<MarketState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let doc = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&doc)?))
    }

    fn save(&mut self, state: &MarketState) -> Result<()> {
        let doc = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, doc)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono::Utc;
    use openlease_types::{ClientId, MarketParams};

    use super::*;

    fn sample_state() -> MarketState {
        let params = MarketParams::new(ClientId::new(), ClientId::new(), ClientId::new());
        MarketState::new(
            params,
            Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn memory_vault_roundtrip() {
        let mut vault = MemoryVault::new();
        assert!(vault.load().unwrap().is_none());

        let state = sample_state();
        vault.save(&state).unwrap();
        let loaded = vault.load().unwrap().unwrap();
        assert_eq!(loaded.terms.current_term, state.terms.current_term);
        assert_eq!(loaded.params, state.params);
    }

    #[test]
    fn revoked_vault_fails_closed() {
        let mut vault = MemoryVault::new();
        let state = sample_state();
        vault.save(&state).unwrap();

        vault.revoke();
        assert!(!vault.authorized());
        assert!(matches!(
            vault.save(&state),
            Err(LeaseError::StorageRevoked)
        ));
        assert!(matches!(vault.load(), Err(LeaseError::StorageRevoked)));

        vault.authorize();
        assert!(vault.load().unwrap().is_some());
    }

    #[test]
    fn file_vault_roundtrip() {
        let dir = std::env::temp_dir().join("openlease-vault-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("market_state.json");
        let _ = std::fs::remove_file(&path);

        let mut vault = JsonFileVault::new(&path);
        assert!(vault.load().unwrap().is_none());

        let state = sample_state();
        vault.save(&state).unwrap();
        let loaded = vault.load().unwrap().unwrap();
        assert_eq!(loaded.terms.current_term, state.terms.current_term);

        std::fs::remove_file(&path).unwrap();
    }
}
