//! Error types for the NFT exchange
//!
//! This module defines all error types that can occur while building,
//! signing, submitting and confirming transactions, and while running the
//! two-party negotiation.
//!
//! # Error Categories
//!
//! - **Ledger Errors**: Unreachable node, rejected transactions, confirmation timeouts
//! - **Key Errors**: Signing with the wrong or an unusable key
//! - **Precondition Errors**: Local checks that fail before anything is submitted
//! - **Negotiation Errors**: Contract failures and cancelled participants
//! - **Output Errors**: Writing the balance report

use super::transaction::TxId;
use std::fmt;
use thiserror::Error;

/// Participant role in the negotiation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Seller,
    Buyer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Seller => write!(f, "seller"),
            Role::Buyer => write!(f, "buyer"),
        }
    }
}

/// Main error type for the NFT exchange
///
/// Every transaction-path error propagates to the orchestration caller
/// unchanged; nothing in the crate retries or recovers locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExchangeError {
    /// The ledger node could not be reached or answered with garbage
    ///
    /// Recoverable by retrying, which this crate never does on its own.
    #[error("Network failure: {message}")]
    NetworkFailure {
        /// Description of the transport failure
        message: String,
    },

    /// The ledger refused the transaction
    ///
    /// Fatal to the attempted operation. Carries the ledger's own reason string
    /// (insufficient balance, asset total exceeded, missing opt-in, ...).
    #[error("Transaction{} rejected: {reason}", txid.map(|t| format!(" {}", t)).unwrap_or_default())]
    TransactionRejected {
        /// Transaction id, when the ledger got far enough to assign one
        txid: Option<TxId>,
        /// The ledger's reason string
        reason: String,
    },

    /// The transaction could not be signed by the given account
    ///
    /// A configuration error: the key does not belong to the sender.
    #[error("Signing failure for account {account}: {reason}")]
    SigningFailure {
        /// Name of the account asked to sign
        account: String,
        /// What went wrong
        reason: String,
    },

    /// Confirmation was not observed within the configured number of rounds
    #[error("Transaction {txid} not confirmed after {rounds} rounds")]
    Timeout {
        /// The transaction being waited on
        txid: TxId,
        /// Rounds waited
        rounds: u64,
    },

    /// A local check failed before anything was submitted
    #[error("Precondition not met for {account}: {reason}")]
    PreconditionNotMet {
        /// Name of the account the check was about
        account: String,
        /// What was expected
        reason: String,
    },

    /// A confirmed asset-create receipt carried no asset index
    #[error("Confirmed transaction {txid} carries no asset index")]
    MissingAssetIndex {
        /// The asset-create transaction
        txid: TxId,
    },

    /// The external contract failed or was misused
    #[error("Contract error: {message}")]
    Contract {
        /// Description of the contract failure
        message: String,
    },

    /// A negotiation participant was cancelled because its sibling failed
    #[error("The {role} participant was cancelled")]
    Cancelled {
        /// The cancelled role
        role: Role,
    },

    /// A currency amount could not be represented in micro-units
    #[error("Invalid amount '{amount}'")]
    InvalidAmount {
        /// The amount as given
        amount: String,
    },

    /// A transaction could not be encoded or decoded
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the serialization failure
        message: String,
    },

    /// I/O error occurred while writing the report
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },
}

// Conversion from io::Error to ExchangeError
impl From<std::io::Error> for ExchangeError {
    fn from(error: std::io::Error) -> Self {
        ExchangeError::IoError {
            message: error.to_string(),
        }
    }
}

// Conversion from csv::Error to ExchangeError
impl From<csv::Error> for ExchangeError {
    fn from(error: csv::Error) -> Self {
        ExchangeError::IoError {
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl ExchangeError {
    /// Create a NetworkFailure error
    pub fn network(message: &str) -> Self {
        ExchangeError::NetworkFailure {
            message: message.to_string(),
        }
    }

    /// Create a TransactionRejected error
    pub fn rejected(txid: Option<TxId>, reason: &str) -> Self {
        ExchangeError::TransactionRejected {
            txid,
            reason: reason.to_string(),
        }
    }

    /// Create a SigningFailure error
    pub fn signing_failure(account: &str, reason: &str) -> Self {
        ExchangeError::SigningFailure {
            account: account.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(txid: TxId, rounds: u64) -> Self {
        ExchangeError::Timeout { txid, rounds }
    }

    /// Create a PreconditionNotMet error
    pub fn precondition(account: &str, reason: &str) -> Self {
        ExchangeError::PreconditionNotMet {
            account: account.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a Contract error
    pub fn contract(message: &str) -> Self {
        ExchangeError::Contract {
            message: message.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: &str) -> Self {
        ExchangeError::InvalidAmount {
            amount: amount.to_string(),
        }
    }

    /// Create an Encoding error
    pub fn encoding(message: &str) -> Self {
        ExchangeError::Encoding {
            message: message.to_string(),
        }
    }

    /// Whether this error only reports that a sibling task failed first
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ExchangeError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::network(
        ExchangeError::NetworkFailure { message: "connection refused".to_string() },
        "Network failure: connection refused"
    )]
    #[case::rejected_with_txid(
        ExchangeError::TransactionRejected { txid: Some(TxId([0; 32])), reason: "overspend".to_string() },
        "Transaction 0000000000000000000000000000000000000000000000000000000000000000 rejected: overspend"
    )]
    #[case::rejected_without_txid(
        ExchangeError::TransactionRejected { txid: None, reason: "invalid signature".to_string() },
        "Transaction rejected: invalid signature"
    )]
    #[case::signing_failure(
        ExchangeError::SigningFailure { account: "Buyer".to_string(), reason: "sender mismatch".to_string() },
        "Signing failure for account Buyer: sender mismatch"
    )]
    #[case::timeout(
        ExchangeError::Timeout { txid: TxId([0xff; 32]), rounds: 10 },
        "Transaction ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff not confirmed after 10 rounds"
    )]
    #[case::precondition(
        ExchangeError::PreconditionNotMet { account: "Buyer".to_string(), reason: "not opted in to asset 1".to_string() },
        "Precondition not met for Buyer: not opted in to asset 1"
    )]
    #[case::cancelled(
        ExchangeError::Cancelled { role: Role::Buyer },
        "The buyer participant was cancelled"
    )]
    #[case::invalid_amount(
        ExchangeError::InvalidAmount { amount: "-1".to_string() },
        "Invalid amount '-1'"
    )]
    fn test_error_display(#[case] error: ExchangeError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    #[case::network(
        ExchangeError::network("down"),
        ExchangeError::NetworkFailure { message: "down".to_string() }
    )]
    #[case::rejected(
        ExchangeError::rejected(None, "overspend"),
        ExchangeError::TransactionRejected { txid: None, reason: "overspend".to_string() }
    )]
    #[case::precondition(
        ExchangeError::precondition("Creator", "no slot"),
        ExchangeError::PreconditionNotMet { account: "Creator".to_string(), reason: "no slot".to_string() }
    )]
    #[case::contract(
        ExchangeError::contract("unknown contract"),
        ExchangeError::Contract { message: "unknown contract".to_string() }
    )]
    fn test_helper_functions(#[case] result: ExchangeError, #[case] expected: ExchangeError) {
        assert_eq!(result, expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        let error: ExchangeError = io_error.into();
        assert!(matches!(error, ExchangeError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: broken pipe");
    }

    #[test]
    fn test_is_cancellation() {
        assert!(ExchangeError::Cancelled { role: Role::Seller }.is_cancellation());
        assert!(!ExchangeError::network("down").is_cancellation());
    }
}
