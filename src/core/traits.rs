//! Core traits for the external collaborators
//!
//! This module defines the seams between the orchestration core and the
//! systems it consumes: the ledger node, the test-account faucet, and the
//! negotiation contract. Implementations are injected as trait objects
//! (`Arc<dyn LedgerClient>`, `Arc<dyn ContractProgram>`) so the core never
//! reaches for ambient client state.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use super::account::Account;
use crate::types::{
    AccountInformation, Address, AssetId, ExchangeError, MicroAlgos, NodeStatus,
    PendingTransactionInfo, Round, TransactionParams, TxId,
};

/// Boxed future returned by every collaborator call
pub type LedgerFuture<'a, T> = BoxFuture<'a, Result<T, ExchangeError>>;

/// Trait for querying and submitting to a ledger node
///
/// Every call is a suspension point. Transport problems are reported as
/// `ExchangeError::NetworkFailure`; validation failures at broadcast time as
/// `ExchangeError::TransactionRejected`.
pub trait LedgerClient: Send + Sync {
    /// Fetch the current fee and valid-round window
    fn suggested_params(&self) -> LedgerFuture<'_, TransactionParams>;

    /// Fetch the native balance and asset holdings of an account
    fn account_information(&self, address: Address) -> LedgerFuture<'_, AccountInformation>;

    /// Broadcast an encoded signed transaction, returning its id
    fn send_raw_transaction(&self, raw: Vec<u8>) -> LedgerFuture<'_, TxId>;

    /// Fetch the pool status of a broadcast transaction
    fn pending_transaction_information(&self, txid: TxId)
        -> LedgerFuture<'_, PendingTransactionInfo>;

    /// Fetch the most recently sealed round
    fn status(&self) -> LedgerFuture<'_, NodeStatus>;

    /// Wait until a round later than `round` has been sealed
    fn status_after_block(&self, round: Round) -> LedgerFuture<'_, NodeStatus>;
}

/// Trait for creating funded test identities
///
/// Only needed by the demonstration flow and the tests; a production
/// deployment funds accounts out of band.
pub trait AccountProvisioner: Send + Sync {
    /// Credit `amount` to `address`, creating the ledger account if needed
    fn fund(&self, address: Address, amount: MicroAlgos) -> LedgerFuture<'_, ()>;
}

/// Connection info of a deployed contract instance
///
/// Derived from the deployment and handed to the other party so it can attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractInfo(pub u64);

impl fmt::Display for ContractInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctc-{}", self.0)
    }
}

/// A participant's connection to a contract instance
#[derive(Clone)]
pub struct ContractHandle {
    /// Which instance this handle talks to
    pub info: ContractInfo,

    /// The account acting through this handle
    pub account: Arc<Account>,
}

impl fmt::Debug for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractHandle")
            .field("info", &self.info)
            .field("account", &self.account.name())
            .finish()
    }
}

/// Seller-side callbacks, invoked by the contract
pub struct SellerInteract {
    /// Called once when the contract needs the sale terms
    pub get_token_and_price: Box<dyn FnOnce() -> (AssetId, MicroAlgos) + Send>,
}

/// Buyer-side callbacks, invoked by the contract
pub struct BuyerInteract {
    /// Called once when the contract delivers the proposed price
    pub accept_price: Box<dyn FnOnce(MicroAlgos) + Send>,
}

/// Trait for the external negotiation contract
///
/// The contract owns the trust and settlement mechanics of the exchange. The
/// core only supplies terms when asked and acknowledges them when informed.
pub trait ContractProgram: Send + Sync {
    /// Deploy a fresh instance on behalf of `account`
    fn deploy(&self, account: Arc<Account>) -> LedgerFuture<'_, ContractHandle>;

    /// Attach `account` to an instance deployed by someone else
    fn attach(&self, account: Arc<Account>, info: ContractInfo)
        -> LedgerFuture<'_, ContractHandle>;

    /// Run the seller participant to completion
    fn seller(&self, handle: ContractHandle, interact: SellerInteract) -> LedgerFuture<'_, ()>;

    /// Run the buyer participant to completion
    fn buyer(&self, handle: ContractHandle, interact: BuyerInteract) -> LedgerFuture<'_, ()>;
}
