//! Balance record storage.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use depositledger_common::{Address, AssetKind};

use crate::balance::BalanceRecord;

/// One row of a store snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBalance {
    /// Record owner.
    pub user: Address,
    /// Asset bucket.
    pub asset: AssetKind,
    /// Stored record.
    pub record: BalanceRecord,
}

/// Storage for balance records, injected into the ledger.
pub trait BalanceStore {
    /// Load a record; pairs with no history yield the default record.
    fn load(&self, user: &Address, asset: AssetKind) -> BalanceRecord;

    /// Replace a record.
    fn save(&mut self, user: Address, asset: AssetKind, record: BalanceRecord);

    /// All stored records, in no particular order.
    fn entries(&self) -> Vec<StoredBalance>;
}

/// HashMap-backed store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBalanceStore {
    records: HashMap<(Address, AssetKind), BalanceRecord>,
}

impl InMemoryBalanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot rows. Later rows win on duplicates.
    pub fn from_entries(entries: impl IntoIterator<Item = StoredBalance>) -> Self {
        let records = entries
            .into_iter()
            .map(|row| ((row.user, row.asset), row.record))
            .collect();
        Self { records }
    }

    /// Snapshot as JSON, rows sorted by user then asset.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut rows = self.entries();
        rows.sort_by_key(|row| (row.user, row.asset));
        serde_json::to_string_pretty(&rows)
    }

    /// Restore from a JSON snapshot produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let rows: Vec<StoredBalance> = serde_json::from_str(json)?;
        Ok(Self::from_entries(rows))
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no record was ever written.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl BalanceStore for InMemoryBalanceStore {
    fn load(&self, user: &Address, asset: AssetKind) -> BalanceRecord {
        self.records
            .get(&(*user, asset))
            .copied()
            .unwrap_or_default()
    }

    fn save(&mut self, user: Address, asset: AssetKind, record: BalanceRecord) {
        self.records.insert((user, asset), record);
    }

    fn entries(&self) -> Vec<StoredBalance> {
        self.records
            .iter()
            .map(|(&(user, asset), &record)| StoredBalance {
                user,
                asset,
                record,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_record_is_default() {
        let store = InMemoryBalanceStore::new();
        let record = store.load(&Address::derive("nobody"), AssetKind::Native);
        assert_eq!(record, BalanceRecord::default());
        assert!(store.is_empty());
    }

    #[test]
    fn test_assets_are_separate_buckets() {
        let mut store = InMemoryBalanceStore::new();
        let user = Address::derive("user1");

        store.save(user, AssetKind::Token, BalanceRecord::new(100, 5));

        assert_eq!(store.load(&user, AssetKind::Token), BalanceRecord::new(100, 5));
        assert_eq!(store.load(&user, AssetKind::Native), BalanceRecord::default());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_json_snapshot_restores_records() {
        let mut store = InMemoryBalanceStore::new();
        store.save(Address::derive("a"), AssetKind::Native, BalanceRecord::new(7, 1));
        store.save(Address::derive("b"), AssetKind::Token, BalanceRecord::new(9, 2));

        let json = store.to_json().unwrap();
        assert!(json.contains("\"Native\""));

        let restored = InMemoryBalanceStore::from_json(&json).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.load(&Address::derive("b"), AssetKind::Token),
            BalanceRecord::new(9, 2)
        );
    }
}
