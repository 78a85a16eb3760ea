//! Account-related types for the NFT exchange
//!
//! This module defines the ledger's view of an account: its native balance,
//! the minimum balance it must keep, and the asset holding slots it has
//! allocated by opting in.

use super::amount::{AssetBalance, MicroAlgos};
use super::transaction::{Address, AssetId, Round};
use serde::{Deserialize, Serialize};

/// One asset holding slot of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    /// The asset this slot belongs to
    pub asset_id: AssetId,

    /// Units held (zero right after opting in)
    pub amount: u64,

    /// Whether transfers out of this slot are frozen
    pub is_frozen: bool,
}

/// Account state as reported by the ledger
///
/// A snapshot at the time of the query; it is never cached by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInformation {
    /// The account address
    pub address: Address,

    /// Native currency balance
    pub amount: MicroAlgos,

    /// Balance the account must keep after every transaction it sends
    ///
    /// Grows with every asset the account holds or has created.
    pub min_balance: MicroAlgos,

    /// Asset holding slots, one per opted-in asset
    pub assets: Vec<AssetHolding>,

    /// Assets created by this account
    pub created_assets: Vec<AssetId>,
}

impl AccountInformation {
    /// Held amount for `asset_id`, or `NotOptedIn` if the account has no slot
    pub fn asset_balance(&self, asset_id: AssetId) -> AssetBalance {
        self.assets
            .iter()
            .find(|holding| holding.asset_id == asset_id)
            .map(|holding| AssetBalance::Held(holding.amount))
            .unwrap_or(AssetBalance::NotOptedIn)
    }
}

/// Node status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    /// Most recently sealed round
    pub last_round: Round,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_balance_lookup() {
        let info = AccountInformation {
            address: Address([3; 32]),
            amount: MicroAlgos(1_000_000),
            min_balance: MicroAlgos(200_000),
            assets: vec![AssetHolding {
                asset_id: AssetId(5),
                amount: 0,
                is_frozen: false,
            }],
            created_assets: vec![],
        };

        assert_eq!(info.asset_balance(AssetId(5)), AssetBalance::Held(0));
        assert_eq!(info.asset_balance(AssetId(6)), AssetBalance::NotOptedIn);
    }
}
