//! Transaction application rules
//!
//! Applies one confirmed-to-be-valid transaction to the ledger state while a
//! block is being sealed. Touched accounts are loaded into a working set,
//! modified there, and written back only when every rule has passed.
//!
//! Rejection reasons are the strings a node would put in `pool_error`.

use std::collections::HashMap;

use super::state::{AccountStore, AssetRecord, AssetRegistry, LedgerAccount};
use super::LedgerConfig;
use crate::types::{Address, AssetId, AssetParams, MicroAlgos, Round, TxBody, UnsignedTransaction};

/// Accounts touched by one transaction
struct WorkingSet<'a> {
    store: &'a AccountStore,
    touched: HashMap<Address, LedgerAccount>,
}

impl<'a> WorkingSet<'a> {
    fn new(store: &'a AccountStore) -> Self {
        Self {
            store,
            touched: HashMap::new(),
        }
    }

    fn account(&mut self, address: Address) -> &mut LedgerAccount {
        let store = self.store;
        self.touched
            .entry(address)
            .or_insert_with(|| store.get(&address).unwrap_or_default())
    }

    fn commit(self) {
        for (address, account) in self.touched {
            self.store.put(address, account);
        }
    }
}

/// State a block needs beyond the account store
pub struct BlockContext<'a> {
    pub config: &'a LedgerConfig,
    pub accounts: &'a AccountStore,
    pub assets: &'a AssetRegistry,
    pub round: Round,
    pub next_asset_id: &'a mut u64,
}

impl BlockContext<'_> {
    /// Apply `txn` in this block
    ///
    /// # Returns
    ///
    /// The id of the created asset for an asset-config transaction, `None`
    /// otherwise.
    ///
    /// # Errors
    ///
    /// The rejection reason; no state has been changed.
    pub fn apply(&mut self, txn: &UnsignedTransaction) -> Result<Option<AssetId>, String> {
        let header = &txn.header;
        if self.round < header.first_valid || self.round > header.last_valid {
            return Err(format!(
                "txn dead: round {} outside of {}--{}",
                self.round, header.first_valid, header.last_valid
            ));
        }

        let mut working = WorkingSet::new(self.accounts);
        debit(working.account(header.sender), header.fee, header.sender)?;

        let created = match &txn.body {
            TxBody::Payment { receiver, amount } => {
                debit(working.account(header.sender), *amount, header.sender)?;
                credit(working.account(*receiver), *amount)?;
                None
            }
            TxBody::AssetConfig(params) => Some(self.create_asset(&mut working, header.sender, params)?),
            TxBody::AssetTransfer {
                asset_id,
                receiver,
                amount,
                close_to,
            } => {
                self.transfer_asset(&mut working, header.sender, *asset_id, *receiver, *amount, *close_to)?;
                None
            }
        };

        let sender = working.account(header.sender);
        let min_balance = sender.min_balance(self.config);
        if sender.amount < min_balance {
            return Err(format!(
                "account {} balance {} below min {}",
                header.sender.short(),
                sender.amount.0,
                min_balance.0
            ));
        }

        working.commit();
        if let Some((asset_id, record)) = created {
            self.assets.insert(asset_id, record);
            *self.next_asset_id += 1;
            return Ok(Some(asset_id));
        }
        Ok(None)
    }

    /// Credit the total to the creator; the record is registered on commit
    fn create_asset(
        &self,
        working: &mut WorkingSet<'_>,
        creator: Address,
        params: &AssetParams,
    ) -> Result<(AssetId, AssetRecord), String> {
        let asset_id = AssetId(*self.next_asset_id);
        if self.assets.get(asset_id).is_some() {
            return Err(format!("asset {} already exists", asset_id));
        }

        let account = working.account(creator);
        account.holdings.insert(asset_id, params.total);
        account.created.insert(asset_id);

        Ok((
            asset_id,
            AssetRecord {
                creator,
                params: params.clone(),
            },
        ))
    }

    fn transfer_asset(
        &self,
        working: &mut WorkingSet<'_>,
        sender: Address,
        asset_id: AssetId,
        receiver: Address,
        amount: u64,
        close_to: Option<Address>,
    ) -> Result<(), String> {
        let record = self
            .assets
            .get(asset_id)
            .ok_or_else(|| format!("asset {} does not exist or has been deleted", asset_id))?;

        // Opt-in: zero units to self, allocating the slot if absent.
        if sender == receiver && amount == 0 && close_to.is_none() {
            working.account(sender).holdings.entry(asset_id).or_insert(0);
            return Ok(());
        }

        move_units(working, asset_id, sender, receiver, amount)?;

        if let Some(close_to) = close_to {
            if sender == record.creator {
                return Err(format!("cannot close asset ID {} out of creator account", asset_id));
            }
            let remainder = holding(working.account(sender), asset_id, sender)?;
            move_units(working, asset_id, sender, close_to, remainder)?;
            working.account(sender).holdings.remove(&asset_id);
        }

        Ok(())
    }
}

fn holding(account: &LedgerAccount, asset_id: AssetId, address: Address) -> Result<u64, String> {
    account
        .holdings
        .get(&asset_id)
        .copied()
        .ok_or_else(|| format!("asset {} missing from {}", asset_id, address.short()))
}

fn move_units(
    working: &mut WorkingSet<'_>,
    asset_id: AssetId,
    from: Address,
    to: Address,
    amount: u64,
) -> Result<(), String> {
    let available = holding(working.account(from), asset_id, from)?;
    holding(working.account(to), asset_id, to)?;

    let remaining = available.checked_sub(amount).ok_or_else(|| {
        format!(
            "underflow on subtracting {} from sender amount {}",
            amount, available
        )
    })?;
    working.account(from).holdings.insert(asset_id, remaining);

    let received = holding(working.account(to), asset_id, to)?
        .checked_add(amount)
        .ok_or_else(|| format!("overflow on adding {} to receiver holding", amount))?;
    working.account(to).holdings.insert(asset_id, received);
    Ok(())
}

fn debit(account: &mut LedgerAccount, amount: MicroAlgos, address: Address) -> Result<(), String> {
    account.amount = account.amount.checked_sub(amount).ok_or_else(|| {
        format!(
            "overspend (account {}, data {{amount: {}}}, tried to spend {})",
            address.short(),
            account.amount.0,
            amount.0
        )
    })?;
    Ok(())
}

fn credit(account: &mut LedgerAccount, amount: MicroAlgos) -> Result<(), String> {
    account.amount = account
        .amount
        .checked_add(amount)
        .ok_or_else(|| "balance overflow".to_string())?;
    Ok(())
}
