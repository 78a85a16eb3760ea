//! Transaction-related types for the NFT exchange
//!
//! This module defines the ledger identifiers, the unsigned and signed
//! transaction shapes produced by the builder and consumed by the submitter,
//! and the suggested parameters the ledger hands out before every submission.

use super::amount::MicroAlgos;
use super::error::ExchangeError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512_256};
use std::fmt;

/// Ledger round number
pub type Round = u64;

/// Domain separation prefix prepended to every transaction before hashing or signing
const TX_SIGNING_PREFIX: &[u8] = b"TX";

/// Ledger address
///
/// An address is the raw 32-byte ed25519 public key of the account holder.
/// It is displayed as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// Raw public key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First eight hex characters, used in log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<&ed25519_dalek::VerifyingKey> for Address {
    fn from(key: &ed25519_dalek::VerifyingKey) -> Self {
        Address(key.to_bytes())
    }
}

/// Ledger-assigned asset identifier
///
/// Only known after the asset-create transaction has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction identifier
///
/// SHA-512/256 digest of the transaction's signing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Ledger-supplied parameters captured at submission time
///
/// Builders are deferred closures over these parameters so the valid-round
/// window is always fresh when the transaction is signed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionParams {
    /// Flat fee paid by the sender
    pub fee: MicroAlgos,

    /// First round in which the transaction may be included
    pub first_valid: Round,

    /// Last round in which the transaction may be included
    pub last_valid: Round,

    /// Identifier of the network the transaction is bound to
    pub genesis_id: String,
}

/// Fields shared by every transaction type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHeader {
    pub sender: Address,
    pub fee: MicroAlgos,
    pub first_valid: Round,
    pub last_valid: Round,
    pub genesis_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<u8>,
}

impl TxHeader {
    /// Header for `sender` using freshly fetched ledger parameters
    pub fn new(sender: Address, params: &TransactionParams) -> Self {
        Self {
            sender,
            fee: params.fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            note: Vec::new(),
        }
    }
}

/// Parameters of an asset definition
///
/// Role addresses (manager, reserve, freeze, clawback) are optional at the
/// ledger level; the builder in this crate always assigns the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetParams {
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: String,
    pub metadata_hash: Vec<u8>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

/// Type-specific body of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxBody {
    /// Native currency payment
    Payment { receiver: Address, amount: MicroAlgos },

    /// Asset definition; the ledger assigns the asset id on confirmation
    AssetConfig(AssetParams),

    /// Asset transfer
    ///
    /// A zero-amount transfer to self is an opt-in. When `close_to` is set
    /// the sender's holding slot is removed and any remainder goes to
    /// `close_to`.
    AssetTransfer {
        asset_id: AssetId,
        receiver: Address,
        amount: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        close_to: Option<Address>,
    },
}

/// Transaction ready to be signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    pub header: TxHeader,
    pub body: TxBody,
}

impl UnsignedTransaction {
    /// The account that must sign this transaction
    pub fn sender(&self) -> Address {
        self.header.sender
    }

    /// Canonical bytes covered by the signature
    ///
    /// # Errors
    ///
    /// Returns `ExchangeError::Encoding` if the transaction cannot be serialized.
    pub fn bytes_to_sign(&self) -> Result<Vec<u8>, ExchangeError> {
        let body = serde_json::to_vec(self).map_err(|e| ExchangeError::encoding(&e.to_string()))?;
        let mut bytes = Vec::with_capacity(TX_SIGNING_PREFIX.len() + body.len());
        bytes.extend_from_slice(TX_SIGNING_PREFIX);
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Transaction id derived from the signing bytes
    pub fn id(&self) -> Result<TxId, ExchangeError> {
        let digest = Sha512_256::digest(self.bytes_to_sign()?);
        Ok(TxId(digest.into()))
    }
}

/// Transaction together with the sender's ed25519 signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub txn: UnsignedTransaction,
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    /// Raw bytes broadcast to the ledger
    pub fn encode(&self) -> Result<Vec<u8>, ExchangeError> {
        serde_json::to_vec(self).map_err(|e| ExchangeError::encoding(&e.to_string()))
    }

    /// Inverse of [`SignedTransaction::encode`]
    pub fn decode(raw: &[u8]) -> Result<Self, ExchangeError> {
        serde_json::from_slice(raw).map_err(|e| ExchangeError::encoding(&e.to_string()))
    }
}

/// Pool status of a broadcast transaction
///
/// Mirrors what a ledger node reports for a transaction id: either it has
/// been confirmed in a round, it was evicted with a pool error, or it is
/// still pending (neither field set).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransactionInfo {
    pub confirmed_round: Option<Round>,
    pub pool_error: String,
    pub asset_index: Option<AssetId>,
}

/// Effects of a confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmedReceipt {
    pub txid: TxId,
    pub confirmed_round: Round,

    /// Set only for confirmed asset-create transactions
    pub asset_index: Option<AssetId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> UnsignedTransaction {
        let params = TransactionParams {
            fee: MicroAlgos(1_000),
            first_valid: 10,
            last_valid: 1_010,
            genesis_id: "devnet-v1".to_string(),
        };
        UnsignedTransaction {
            header: TxHeader::new(Address([1; 32]), &params),
            body: TxBody::AssetTransfer {
                asset_id: AssetId(7),
                receiver: Address([1; 32]),
                amount: 0,
                close_to: None,
            },
        }
    }

    #[test]
    fn test_signing_bytes_are_prefixed() {
        let bytes = sample().bytes_to_sign().unwrap();
        assert!(bytes.starts_with(b"TX{"));
    }

    #[test]
    fn test_id_is_stable_and_content_addressed() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.id().unwrap(), b.id().unwrap());

        b.header.first_valid += 1;
        assert_ne!(a.id().unwrap(), b.id().unwrap());
    }

    #[test]
    fn test_signed_transaction_decode_rejects_garbage() {
        let result = SignedTransaction::decode(b"not a transaction");
        assert!(matches!(result, Err(ExchangeError::Encoding { .. })));
    }

    #[test]
    fn test_address_display_is_hex() {
        let address = Address([0xab; 32]);
        assert_eq!(address.to_string().len(), 64);
        assert_eq!(address.short(), "abababab");
    }
}
