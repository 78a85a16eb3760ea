//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: The ledger's view of an account
//! - `amount`: Native currency amounts and asset balances
//! - `transaction`: Identifiers, transactions, receipts
//! - `error`: Error types for the NFT exchange

pub mod account;
pub mod amount;
pub mod error;
pub mod transaction;

pub use account::{AccountInformation, AssetHolding, NodeStatus};
pub use amount::{AssetBalance, MicroAlgos, CURRENCY_SYMBOL, MICRO_PER_UNIT};
pub use error::{ExchangeError, Role};
pub use transaction::{
    Address, AssetId, AssetParams, ConfirmedReceipt, PendingTransactionInfo, Round,
    SignedTransaction, TransactionParams, TxBody, TxHeader, TxId, UnsignedTransaction,
};
