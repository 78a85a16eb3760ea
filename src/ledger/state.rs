//! Thread-safe ledger state for the development ledger
//!
//! This module provides the account store and asset registry behind
//! `DevLedger`. Both use `DashMap` so balance queries from many tasks proceed
//! concurrently; writes only happen while a block is being sealed (or an
//! account funded), which the ledger serializes behind its chain lock.
//!
//! # Design
//!
//! Account snapshots are cloned out, modified as a working set, and written
//! back in one step once every rule of a transaction has passed, so a
//! rejected transaction never leaves a partial effect behind.

use std::collections::{BTreeMap, BTreeSet};

use dashmap::DashMap;

use super::LedgerConfig;
use crate::types::{AccountInformation, Address, AssetHolding, AssetId, AssetParams, MicroAlgos};

/// Ledger-side state of one account
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerAccount {
    /// Native balance
    pub amount: MicroAlgos,

    /// Holding slots by asset id (present = opted in)
    pub holdings: BTreeMap<AssetId, u64>,

    /// Assets this account created
    pub created: BTreeSet<AssetId>,
}

impl LedgerAccount {
    /// Base minimum plus one increment per holding slot
    pub fn min_balance(&self, config: &LedgerConfig) -> MicroAlgos {
        let slots = self.holdings.len() as u64;
        MicroAlgos(
            config
                .min_balance
                .0
                .saturating_add(config.asset_min_balance.0.saturating_mul(slots)),
        )
    }
}

/// Concurrent account store keyed by address
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: DashMap<Address, LedgerAccount>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
        }
    }

    /// Snapshot of an account, if the ledger has ever seen it
    pub fn get(&self, address: &Address) -> Option<LedgerAccount> {
        self.accounts.get(address).map(|entry| entry.value().clone())
    }

    /// Replace an account's state
    pub fn put(&self, address: Address, account: LedgerAccount) {
        self.accounts.insert(address, account);
    }

    /// Update an account using a closure, creating it empty if needed
    ///
    /// The entry stays locked while the closure runs.
    pub fn update<F, E>(&self, address: Address, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut LedgerAccount) -> Result<(), E>,
    {
        let mut entry = self.accounts.entry(address).or_default();
        f(entry.value_mut())
    }

    /// The account as a node would report it; unknown addresses read as empty
    pub fn information(&self, address: Address, config: &LedgerConfig) -> AccountInformation {
        let account = self.get(&address).unwrap_or_default();

        AccountInformation {
            address,
            amount: account.amount,
            min_balance: account.min_balance(config),
            assets: account
                .holdings
                .iter()
                .map(|(asset_id, amount)| AssetHolding {
                    asset_id: *asset_id,
                    amount: *amount,
                    is_frozen: false,
                })
                .collect(),
            created_assets: account.created.iter().copied().collect(),
        }
    }
}

/// A created asset and its creator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRecord {
    pub creator: Address,
    pub params: AssetParams,
}

/// Concurrent registry of created assets
#[derive(Debug, Default)]
pub struct AssetRegistry {
    assets: DashMap<AssetId, AssetRecord>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            assets: DashMap::new(),
        }
    }

    pub fn get(&self, asset_id: AssetId) -> Option<AssetRecord> {
        self.assets.get(&asset_id).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, asset_id: AssetId, record: AssetRecord) {
        self.assets.insert(asset_id, record);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_creates_account_if_not_exists() {
        let store = AccountStore::new();

        let result: Result<(), String> = store.update(Address([1; 32]), |account| {
            account.amount = MicroAlgos(5_000);
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(store.get(&Address([1; 32])).unwrap().amount, MicroAlgos(5_000));
    }

    #[test]
    fn test_update_error_is_returned() {
        let store = AccountStore::new();

        let result: Result<(), String> =
            store.update(Address([1; 32]), |_| Err("nope".to_string()));

        assert_eq!(result, Err("nope".to_string()));
    }

    #[test]
    fn test_min_balance_grows_per_holding() {
        let config = LedgerConfig::default();
        let mut account = LedgerAccount::default();
        assert_eq!(account.min_balance(&config), MicroAlgos(100_000));

        account.holdings.insert(AssetId(1), 0);
        account.holdings.insert(AssetId(2), 1);
        assert_eq!(account.min_balance(&config), MicroAlgos(300_000));
    }

    #[test]
    fn test_information_for_unknown_address_is_empty() {
        let store = AccountStore::new();
        let info = store.information(Address([9; 32]), &LedgerConfig::default());

        assert_eq!(info.amount, MicroAlgos::ZERO);
        assert!(info.assets.is_empty());
        assert!(info.created_assets.is_empty());
    }
}
