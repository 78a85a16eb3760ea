//! Rust NFT Exchange Library
//! # Overview
//!
//! This library orchestrates the lifecycle of a single non-fungible token on an
//! account-based, asset-aware ledger: funding test accounts, defining and
//! minting the token, opting accounts in and out of it, and selling it through
//! a two-party price negotiation whose seller and buyer run as concurrent tasks.
//!
//! # Architecture
//!
//! - [`types`] - Identifiers, amounts, transactions and the error enum
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::builder`] - Deferred transaction builders
//!   - [`core::submitter`] - Sign, broadcast, wait for confirmation
//!   - [`core::account`] - Accounts, balances, opt-in/opt-out
//!   - [`core::nft`] - NFT creation and minting
//!   - [`core::negotiation`] - Seller/buyer protocol
//! - [`ledger`] - In-process development ledger
//! - [`contract`] - In-process trade contract
//! - [`io`] - Balance report output
//! - [`scenario`] - The end-to-end demonstration flow
//!
//! # Transaction Flow
//!
//! Every ledger effect goes through [`core::Submitter::submit`]:
//!
//! - **Fetch parameters**: fee and valid-round window, fresh for each transaction
//! - **Build**: a deferred builder turns the parameters into an unsigned transaction
//! - **Sign**: only the sender's own account can sign it
//! - **Broadcast**: the ledger validates and queues it
//! - **Confirm**: wait a bounded number of rounds for confirmation or rejection
//!
//! # Asset Balances
//!
//! An account's holding of an asset is either `NotOptedIn` (no holding slot)
//! or `Held(n)`. The two are never conflated: holding zero units after opting
//! in is not the same as never having opted in.

// Module declarations
pub mod cli;
pub mod contract;
pub mod core;
pub mod io;
pub mod ledger;
pub mod scenario;
pub mod types;

pub use contract::TradeProgram;
pub use crate::core::{Account, Negotiation, Nft, SubmitConfig, Submitter};
pub use io::{write_report, ReportFormat};
pub use ledger::{DevLedger, LedgerConfig};
pub use scenario::{Scenario, ScenarioConfig, ScenarioSummary};
pub use types::{
    Address, AssetBalance, AssetId, ConfirmedReceipt, ExchangeError, MicroAlgos, Role, TxId,
};
