//! Non-fungible token lifecycle
//!
//! An `Nft` is an asset with a total supply of exactly one indivisible unit.
//! It is defined by a confirmed asset-create transaction and minted by the
//! first transfer of that unit out of the issuer's account. Whether the unit
//! has already been minted is not tracked here; the ledger refuses a second
//! mint because no unit remains with the issuer.

use std::sync::Arc;

use tracing::{info, instrument};

use super::account::Account;
use super::builder::{build_asset_transfer, build_create_asset, NFT_DECIMALS, NFT_TOTAL_UNITS};
use crate::types::{AssetId, ConfirmedReceipt, ExchangeError};

/// A single-unit asset and the account that issued it
#[derive(Debug, Clone)]
pub struct Nft {
    issuer: Arc<Account>,
    name: String,
    symbol: String,
    asset_id: AssetId,
}

impl Nft {
    /// Define a new NFT on the ledger
    ///
    /// # Errors
    ///
    /// * `TransactionRejected` - e.g. the issuer cannot cover the fee and the
    ///   minimum balance increase of holding a new asset
    /// * `MissingAssetIndex` - the confirmation receipt carries no asset id
    #[instrument(skip_all, fields(issuer = %issuer.name(), %symbol))]
    pub async fn create(
        issuer: &Arc<Account>,
        name: &str,
        symbol: &str,
        note: &str,
    ) -> Result<Self, ExchangeError> {
        let receipt = issuer
            .submitter()
            .submit(issuer, build_create_asset(issuer.address(), name, symbol, note))
            .await?;

        let asset_id = receipt
            .asset_index
            .ok_or(ExchangeError::MissingAssetIndex { txid: receipt.txid })?;

        info!(%asset_id, "Asset created");
        Ok(Self {
            issuer: Arc::clone(issuer),
            name: name.to_string(),
            symbol: symbol.to_string(),
            asset_id,
        })
    }

    pub fn issuer(&self) -> &Arc<Account> {
        &self.issuer
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    pub fn total_units(&self) -> u64 {
        NFT_TOTAL_UNITS
    }

    pub fn decimals(&self) -> u32 {
        NFT_DECIMALS
    }

    /// Transfer the single unit from the issuer to `receiver`
    ///
    /// # Errors
    ///
    /// * `PreconditionNotMet` - `receiver` has not opted in; nothing is submitted
    /// * `TransactionRejected` - the ledger refused the transfer, e.g. because
    ///   the unit has already left the issuer
    #[instrument(skip_all, fields(asset_id = %self.asset_id, receiver = %receiver.name()))]
    pub async fn mint(&self, receiver: &Account) -> Result<ConfirmedReceipt, ExchangeError> {
        if !receiver.asset_balance(self.asset_id).await?.is_opted_in() {
            return Err(ExchangeError::precondition(
                receiver.name(),
                &format!("not opted in to asset {}", self.asset_id),
            ));
        }

        let receipt = self
            .issuer
            .submitter()
            .submit(
                &self.issuer,
                build_asset_transfer(
                    self.asset_id,
                    self.issuer.address(),
                    receiver.address(),
                    NFT_TOTAL_UNITS,
                    false,
                ),
            )
            .await?;

        info!(round = receipt.confirmed_round, "Minted");
        Ok(receipt)
    }
}
