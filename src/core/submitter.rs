//! Transaction submission and confirmation
//!
//! The `Submitter` is the single path by which intent becomes a confirmed
//! ledger effect:
//!
//! ```text
//! suggested_params ─▶ build(params) ─▶ sign ─▶ send_raw_transaction
//!                                                     │
//!                     ConfirmedReceipt ◀─ wait_for_confirmation (bounded)
//! ```
//!
//! There is no retry. Whatever fails surfaces to the caller as an
//! `ExchangeError` of the matching kind.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::account::Account;
use super::traits::LedgerClient;
use crate::types::{ConfirmedReceipt, ExchangeError, TransactionParams, TxId, UnsignedTransaction};

/// Configuration for confirmation waits
#[derive(Clone, Debug)]
pub struct SubmitConfig {
    /// Number of rounds to wait for a broadcast transaction to be confirmed
    pub wait_rounds: u64,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self { wait_rounds: 10 }
    }
}

impl SubmitConfig {
    /// Create a new SubmitConfig, falling back to the default for a zero bound
    pub fn new(wait_rounds: u64) -> Self {
        let default = Self::default();

        let wait_rounds = if wait_rounds == 0 {
            warn!(
                wait_rounds,
                default = default.wait_rounds,
                "Invalid wait_rounds, using default"
            );
            default.wait_rounds
        } else {
            wait_rounds
        };

        Self { wait_rounds }
    }
}

/// Signs, broadcasts and confirms transactions against an injected ledger client
///
/// Cheap to clone; every clone shares the same ledger client.
#[derive(Clone)]
pub struct Submitter {
    ledger: Arc<dyn LedgerClient>,
    config: SubmitConfig,
}

impl fmt::Debug for Submitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Submitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Submitter {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: SubmitConfig) -> Self {
        Self { ledger, config }
    }

    /// The ledger client used for queries as well as submissions
    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub fn config(&self) -> &SubmitConfig {
        &self.config
    }

    /// Build, sign, broadcast and confirm one transaction
    ///
    /// # Arguments
    ///
    /// * `signer` - Account whose key signs the transaction; must be its sender
    /// * `build` - Deferred builder, called with freshly fetched parameters
    ///
    /// # Errors
    ///
    /// * `NetworkFailure` - the ledger could not be reached
    /// * `SigningFailure` - the transaction's sender is not `signer`
    /// * `TransactionRejected` - the ledger refused the transaction
    /// * `Timeout` - no confirmation within `wait_rounds` rounds
    #[instrument(skip_all, fields(signer = %signer.name()))]
    pub async fn submit<F>(&self, signer: &Account, build: F) -> Result<ConfirmedReceipt, ExchangeError>
    where
        F: FnOnce(&TransactionParams) -> UnsignedTransaction,
    {
        let params = self.ledger.suggested_params().await?;
        let txn = build(&params);
        let signed = signer.sign(txn)?;

        let txid = self.ledger.send_raw_transaction(signed.encode()?).await?;
        debug!(%txid, first_valid = params.first_valid, "Transaction broadcast");

        let receipt = self.wait_for_confirmation(txid).await?;
        info!(%txid, round = receipt.confirmed_round, "Transaction confirmed");
        Ok(receipt)
    }

    /// Poll the pending pool until `txid` is confirmed, rejected, or the bound runs out
    ///
    /// The bound is counted in ledger rounds starting from the round after
    /// the current one, so a stalled ledger still terminates the wait. The
    /// pool is polled once more after the last waited block.
    pub async fn wait_for_confirmation(&self, txid: TxId) -> Result<ConfirmedReceipt, ExchangeError> {
        let start_round = self.ledger.status().await?.last_round + 1;
        let mut current_round = start_round;

        loop {
            let pending = self.ledger.pending_transaction_information(txid).await?;

            if let Some(confirmed_round) = pending.confirmed_round {
                return Ok(ConfirmedReceipt {
                    txid,
                    confirmed_round,
                    asset_index: pending.asset_index,
                });
            }

            if !pending.pool_error.is_empty() {
                warn!(%txid, reason = %pending.pool_error, "Transaction evicted from pool");
                return Err(ExchangeError::rejected(Some(txid), &pending.pool_error));
            }

            if current_round >= start_round + self.config.wait_rounds {
                break;
            }

            self.ledger.status_after_block(current_round).await?;
            current_round += 1;
        }

        warn!(%txid, rounds = self.config.wait_rounds, "Confirmation wait exhausted");
        Err(ExchangeError::timeout(txid, self.config.wait_rounds))
    }
}
