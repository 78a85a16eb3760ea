//! In-process development ledger
//!
//! `DevLedger` stands in for a ledger node so the orchestration core can be
//! run and tested without a network. It implements the same query interface
//! a node client would ([`LedgerClient`]) plus a faucet
//! ([`AccountProvisioner`]).
//!
//! # Block production
//!
//! Broadcast transactions are validated statelessly (encoding, signature,
//! genesis, fee, valid-round window, duplicates) and queued. Nothing is
//! applied until a block is sealed, which happens when somebody waits for a
//! round with [`LedgerClient::status_after_block`]. Each block applies the
//! queued transactions in arrival order; a transaction that breaks a rule is
//! evicted with a `pool_error` and leaves no effect.

mod apply;
mod pool;
mod state;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use ed25519_dalek::{Signature, VerifyingKey};
use futures::FutureExt;
use tracing::{debug, warn};

use crate::core::traits::{AccountProvisioner, LedgerClient, LedgerFuture};
use crate::types::{
    AccountInformation, Address, AssetId, ExchangeError, MicroAlgos, NodeStatus,
    PendingTransactionInfo, Round, SignedTransaction, TransactionParams, TxId,
};

use apply::BlockContext;
pub use pool::TransactionPool;
pub use state::{AccountStore, AssetRecord, AssetRegistry, LedgerAccount};

/// Consensus parameters of the development network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Network identifier every transaction must carry
    pub genesis_id: String,

    /// Lowest accepted flat fee
    pub min_fee: MicroAlgos,

    /// Balance every account must keep
    pub min_balance: MicroAlgos,

    /// Extra balance required per asset holding slot
    pub asset_min_balance: MicroAlgos,

    /// Longest accepted valid-round window
    pub max_txn_life: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            genesis_id: "devnet-v1".to_string(),
            min_fee: MicroAlgos(1_000),
            min_balance: MicroAlgos(100_000),
            asset_min_balance: MicroAlgos(100_000),
            max_txn_life: 1_000,
        }
    }
}

#[derive(Debug)]
struct ChainState {
    last_round: Round,
    next_asset_id: u64,
}

/// Asset-aware ledger that lives in the current process
#[derive(Debug)]
pub struct DevLedger {
    config: LedgerConfig,
    accounts: AccountStore,
    assets: AssetRegistry,
    pool: TransactionPool,
    chain: Mutex<ChainState>,
    produce_blocks: AtomicBool,
}

impl Default for DevLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl DevLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            accounts: AccountStore::new(),
            assets: AssetRegistry::new(),
            pool: TransactionPool::new(),
            chain: Mutex::new(ChainState {
                last_round: 1,
                next_asset_id: 1,
            }),
            produce_blocks: AtomicBool::new(true),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// When disabled, sealed blocks are empty and queued transactions stay pending
    pub fn set_block_production(&self, enabled: bool) {
        self.produce_blocks.store(enabled, Ordering::SeqCst);
    }

    pub fn last_round(&self) -> Round {
        self.lock_chain().last_round
    }

    /// Definition of a created asset
    pub fn asset(&self, asset_id: AssetId) -> Option<AssetRecord> {
        self.assets.get(asset_id)
    }

    /// Transactions broadcast but not yet included in a block
    pub fn pending_count(&self) -> usize {
        self.pool.pending_len()
    }

    fn lock_chain(&self) -> std::sync::MutexGuard<'_, ChainState> {
        match self.chain.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn suggest(&self) -> TransactionParams {
        let last_round = self.last_round();
        TransactionParams {
            fee: self.config.min_fee,
            first_valid: last_round,
            last_valid: last_round + self.config.max_txn_life,
            genesis_id: self.config.genesis_id.clone(),
        }
    }

    /// Validate a broadcast transaction and queue it for the next block
    fn broadcast(&self, raw: &[u8]) -> Result<TxId, ExchangeError> {
        let signed = SignedTransaction::decode(raw)
            .map_err(|e| ExchangeError::rejected(None, &e.to_string()))?;
        let txid = signed.txn.id()?;
        let reject = |reason: String| {
            warn!(%txid, %reason, "Broadcast rejected");
            ExchangeError::rejected(Some(txid), &reason)
        };

        verify_signature(&signed).map_err(reject)?;

        let header = &signed.txn.header;
        if header.genesis_id != self.config.genesis_id {
            return Err(reject(format!(
                "genesis id mismatch: {} != {}",
                header.genesis_id, self.config.genesis_id
            )));
        }
        if header.fee < self.config.min_fee {
            return Err(reject(format!(
                "fee {} below threshold {}",
                header.fee.0, self.config.min_fee.0
            )));
        }

        let next_round = self.last_round() + 1;
        if header.first_valid > next_round || header.last_valid < next_round {
            return Err(reject(format!(
                "txn dead: round {} outside of {}--{}",
                next_round, header.first_valid, header.last_valid
            )));
        }
        if header.last_valid.saturating_sub(header.first_valid) > self.config.max_txn_life {
            return Err(reject(format!(
                "transaction window size excessive: {}--{} exceeds {} rounds",
                header.first_valid, header.last_valid, self.config.max_txn_life
            )));
        }

        if !self.pool.admit(txid, signed) {
            return Err(reject(format!("transaction already in ledger: {}", txid)));
        }

        debug!(%txid, next_round, "Transaction queued");
        Ok(txid)
    }

    /// Seal blocks until a round later than `round` exists
    fn seal_until_after(&self, round: Round) -> NodeStatus {
        let mut chain = self.lock_chain();
        while chain.last_round <= round {
            self.seal_block(&mut chain);
        }
        NodeStatus {
            last_round: chain.last_round,
        }
    }

    fn seal_block(&self, chain: &mut ChainState) {
        let round = chain.last_round + 1;
        let included = if self.produce_blocks.load(Ordering::SeqCst) {
            self.pool.drain()
        } else {
            Vec::new()
        };

        let mut block = BlockContext {
            config: &self.config,
            accounts: &self.accounts,
            assets: &self.assets,
            round,
            next_asset_id: &mut chain.next_asset_id,
        };

        for (txid, signed) in included {
            let info = match block.apply(&signed.txn) {
                Ok(asset_index) => PendingTransactionInfo {
                    confirmed_round: Some(round),
                    pool_error: String::new(),
                    asset_index,
                },
                Err(reason) => {
                    warn!(%txid, round, %reason, "Transaction evicted");
                    PendingTransactionInfo {
                        pool_error: reason,
                        ..Default::default()
                    }
                }
            };
            self.pool.record(txid, info);
        }

        chain.last_round = round;
        debug!(round, "Block sealed");
    }

    fn credit(&self, address: Address, amount: MicroAlgos) -> Result<(), ExchangeError> {
        self.accounts.update(address, |account| -> Result<(), ExchangeError> {
            account.amount = account
                .amount
                .checked_add(amount)
                .ok_or_else(|| ExchangeError::rejected(None, "balance overflow"))?;
            Ok(())
        })?;
        debug!(address = %address.short(), %amount, "Account funded");
        Ok(())
    }
}

fn verify_signature(signed: &SignedTransaction) -> Result<(), String> {
    let key = VerifyingKey::from_bytes(signed.txn.sender().as_bytes())
        .map_err(|e| format!("invalid sender key: {}", e))?;
    let signature = Signature::from_slice(&signed.signature)
        .map_err(|e| format!("malformed signature: {}", e))?;
    let bytes = signed
        .txn
        .bytes_to_sign()
        .map_err(|e| e.to_string())?;

    key.verify_strict(&bytes, &signature)
        .map_err(|_| "signature does not match sender".to_string())
}

impl LedgerClient for DevLedger {
    fn suggested_params(&self) -> LedgerFuture<'_, TransactionParams> {
        async move { Ok(self.suggest()) }.boxed()
    }

    fn account_information(&self, address: Address) -> LedgerFuture<'_, AccountInformation> {
        async move {
            tokio::task::yield_now().await;
            Ok(self.accounts.information(address, &self.config))
        }
        .boxed()
    }

    fn send_raw_transaction(&self, raw: Vec<u8>) -> LedgerFuture<'_, TxId> {
        async move {
            tokio::task::yield_now().await;
            self.broadcast(&raw)
        }
        .boxed()
    }

    fn pending_transaction_information(
        &self,
        txid: TxId,
    ) -> LedgerFuture<'_, PendingTransactionInfo> {
        async move {
            self.pool
                .status(&txid)
                .ok_or_else(|| ExchangeError::network(&format!("transaction {} not found", txid)))
        }
        .boxed()
    }

    fn status(&self) -> LedgerFuture<'_, NodeStatus> {
        async move {
            Ok(NodeStatus {
                last_round: self.last_round(),
            })
        }
        .boxed()
    }

    fn status_after_block(&self, round: Round) -> LedgerFuture<'_, NodeStatus> {
        async move {
            tokio::task::yield_now().await;
            Ok(self.seal_until_after(round))
        }
        .boxed()
    }
}

impl AccountProvisioner for DevLedger {
    fn fund(&self, address: Address, amount: MicroAlgos) -> LedgerFuture<'_, ()> {
        async move { self.credit(address, amount) }.boxed()
    }
}
