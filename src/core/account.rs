//! Ledger accounts
//!
//! An `Account` pairs a name with an ed25519 keypair and the submitter it
//! uses to reach the ledger. The secret key never leaves this module: the
//! only thing that touches it is [`Account::sign`].

use std::fmt;

use ed25519_dalek::{Signer, SigningKey};
use futures::future::try_join_all;
use rand::rngs::OsRng;
use tracing::{info, instrument};

use super::builder::{build_asset_transfer, build_opt_in};
use super::nft::Nft;
use super::submitter::Submitter;
use super::traits::AccountProvisioner;
use crate::types::{
    Address, AssetBalance, AssetId, ConfirmedReceipt, ExchangeError, MicroAlgos,
    SignedTransaction, UnsignedTransaction,
};

/// Balance query result
///
/// Either the native currency balance, or the holding of one specific asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Balance {
    Native(MicroAlgos),
    Asset { symbol: String, balance: AssetBalance },
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Balance::Native(amount) => write!(f, "{}", amount),
            Balance::Asset { symbol, balance } => write!(f, "{} {}", balance, symbol),
        }
    }
}

/// Balances of one account at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountReport {
    /// Account name
    pub name: String,

    /// Native currency balance
    pub native: MicroAlgos,

    /// One entry per requested asset: (asset id, symbol, balance)
    pub assets: Vec<(AssetId, String, AssetBalance)>,
}

/// Named ledger identity with an exclusively owned signing key
///
/// Created once, never mutated. Share it between tasks as `Arc<Account>`.
pub struct Account {
    name: String,
    address: Address,
    signing_key: SigningKey,
    submitter: Submitter,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Account {
    /// Provision a funded test identity
    ///
    /// Generates a fresh keypair and asks the provisioning collaborator to
    /// credit `starting_balance` to its address.
    #[instrument(skip(submitter, provisioner))]
    pub async fn create(
        submitter: &Submitter,
        provisioner: &dyn AccountProvisioner,
        name: &str,
        starting_balance: MicroAlgos,
    ) -> Result<Self, ExchangeError> {
        let account = Self::from_signing_key(name, SigningKey::generate(&mut OsRng), submitter.clone());
        provisioner.fund(account.address, starting_balance).await?;

        info!(address = %account.address.short(), %starting_balance, "Account funded");
        Ok(account)
    }

    /// Wrap an existing key
    pub fn from_signing_key(name: &str, signing_key: SigningKey, submitter: Submitter) -> Self {
        let address = Address::from(&signing_key.verifying_key());
        Self {
            name: name.to_string(),
            address,
            signing_key,
            submitter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    /// Sign a transaction sent by this account
    ///
    /// # Errors
    ///
    /// Returns `SigningFailure` if the transaction's sender is another
    /// address, or if the signature cannot be produced.
    pub fn sign(&self, txn: UnsignedTransaction) -> Result<SignedTransaction, ExchangeError> {
        if txn.sender() != self.address {
            return Err(ExchangeError::signing_failure(
                &self.name,
                &format!("transaction sender {} is not this account", txn.sender().short()),
            ));
        }

        let bytes = txn.bytes_to_sign()?;
        let signature = self
            .signing_key
            .try_sign(&bytes)
            .map_err(|e| ExchangeError::signing_failure(&self.name, &e.to_string()))?;

        Ok(SignedTransaction {
            txn,
            signature: signature.to_bytes().to_vec(),
        })
    }

    /// Native balance when `asset` is `None`, otherwise the holding of that asset
    ///
    /// Not being opted in is reported as `AssetBalance::NotOptedIn`, never as an error.
    pub async fn balance(&self, asset: Option<&Nft>) -> Result<Balance, ExchangeError> {
        match asset {
            None => Ok(Balance::Native(self.native_balance().await?)),
            Some(nft) => Ok(Balance::Asset {
                symbol: nft.symbol().to_string(),
                balance: self.asset_balance(nft.asset_id()).await?,
            }),
        }
    }

    pub async fn native_balance(&self) -> Result<MicroAlgos, ExchangeError> {
        let info = self.submitter.ledger().account_information(self.address).await?;
        Ok(info.amount)
    }

    pub async fn asset_balance(&self, asset_id: AssetId) -> Result<AssetBalance, ExchangeError> {
        let info = self.submitter.ledger().account_information(self.address).await?;
        Ok(info.asset_balance(asset_id))
    }

    /// Native balance plus the holding of every asset in `nfts`
    pub async fn balance_report(&self, nfts: &[&Nft]) -> Result<AccountReport, ExchangeError> {
        let native = self.native_balance().await?;
        let balances = try_join_all(nfts.iter().map(|nft| self.asset_balance(nft.asset_id()))).await?;

        Ok(AccountReport {
            name: self.name.clone(),
            native,
            assets: nfts
                .iter()
                .zip(balances)
                .map(|(nft, balance)| (nft.asset_id(), nft.symbol().to_string(), balance))
                .collect(),
        })
    }

    /// Allocate a holding slot for `nft`
    ///
    /// No local check is made; opting in again submits another harmless
    /// zero-amount transfer.
    #[instrument(skip_all, fields(account = %self.name, asset_id = %nft.asset_id()))]
    pub async fn opt_in(&self, nft: &Nft) -> Result<ConfirmedReceipt, ExchangeError> {
        self.submitter
            .submit(self, build_opt_in(nft.asset_id(), self.address))
            .await
    }

    /// Close this account's holding slot for `nft`, sending any remainder to `to`
    ///
    /// # Errors
    ///
    /// Returns `PreconditionNotMet` without submitting if this account is not
    /// opted in. Everything else (closing out the creator, a target without a
    /// slot) is left to the ledger.
    #[instrument(skip_all, fields(account = %self.name, asset_id = %nft.asset_id(), to = %to.name))]
    pub async fn opt_out(&self, nft: &Nft, to: &Account) -> Result<ConfirmedReceipt, ExchangeError> {
        if !self.asset_balance(nft.asset_id()).await?.is_opted_in() {
            return Err(ExchangeError::precondition(
                &self.name,
                &format!("not opted in to asset {}", nft.asset_id()),
            ));
        }

        self.submitter
            .submit(
                self,
                build_asset_transfer(nft.asset_id(), self.address, to.address, 0, true),
            )
            .await
    }
}
