//! Transaction pool for the development ledger
//!
//! Broadcast transactions wait here, in arrival order, until the next block
//! is sealed. Every transaction id the ledger has ever admitted keeps a
//! status entry so the submitter can poll it: pending, confirmed in a round,
//! or evicted with a pool error.

use std::collections::VecDeque;
use std::sync::Mutex;

use dashmap::DashMap;

use crate::types::{PendingTransactionInfo, SignedTransaction, TxId};

/// Pending queue plus per-transaction status
#[derive(Debug, Default)]
pub struct TransactionPool {
    pending: Mutex<VecDeque<(TxId, SignedTransaction)>>,
    statuses: DashMap<TxId, PendingTransactionInfo>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction for the next block
    ///
    /// Returns `false` without queuing if the id has been seen before
    /// (first occurrence wins).
    pub fn admit(&self, txid: TxId, signed: SignedTransaction) -> bool {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.statuses.contains_key(&txid) {
            return false;
        }
        self.statuses.insert(txid, PendingTransactionInfo::default());
        pending.push_back((txid, signed));
        true
    }

    /// Take every queued transaction, oldest first
    pub fn drain(&self) -> Vec<(TxId, SignedTransaction)> {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.drain(..).collect()
    }

    /// Record the final status of a drained transaction
    pub fn record(&self, txid: TxId, info: PendingTransactionInfo) {
        self.statuses.insert(txid, info);
    }

    /// Current status of a transaction, if it was ever admitted
    pub fn status(&self, txid: &TxId) -> Option<PendingTransactionInfo> {
        self.statuses.get(txid).map(|entry| entry.value().clone())
    }

    /// Number of transactions waiting for a block
    pub fn pending_len(&self) -> usize {
        match self.pending.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}
