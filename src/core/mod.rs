//! Core business logic module
//!
//! This module contains the transaction orchestration components:
//! - `traits` - Seams to the ledger node, the faucet and the negotiation contract
//! - `builder` - Deferred transaction builders
//! - `submitter` - Sign, broadcast and wait for confirmation
//! - `account` - Named keypairs with balance queries and opt-in/opt-out
//! - `nft` - Single-unit asset definition and minting
//! - `negotiation` - Seller and buyer roles run as concurrent tasks

pub mod account;
pub mod builder;
pub mod negotiation;
pub mod nft;
pub mod submitter;
pub mod traits;

pub use account::{Account, AccountReport, Balance};
pub use negotiation::{
    BuyerState, BuyerView, Negotiation, NegotiationEvent, NegotiationOutcome, SaleTerms, SellerState,
    SellerView,
};
pub use nft::Nft;
pub use submitter::{SubmitConfig, Submitter};
pub use traits::{
    AccountProvisioner, BuyerInteract, ContractHandle, ContractInfo, ContractProgram, LedgerClient,
    LedgerFuture, SellerInteract,
};
