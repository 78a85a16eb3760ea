//! Transaction builders
//!
//! Pure functions that turn a semantic intent (define an asset, move an
//! asset, pay someone) into a deferred transaction: a closure that waits for
//! the ledger's suggested parameters. The submitter fetches the parameters
//! and calls the closure right before signing, so the valid-round window is
//! always taken at submission time rather than when the intent was declared.

use crate::types::{
    Address, AssetId, AssetParams, MicroAlgos, TransactionParams, TxBody, TxHeader,
    UnsignedTransaction,
};

/// Units minted for every NFT
pub const NFT_TOTAL_UNITS: u64 = 1;

/// Decimals of every NFT (indivisible)
pub const NFT_DECIMALS: u32 = 0;

/// Build an asset-create transaction for a single indivisible token
///
/// The issuer is assigned every administrative role (manager, reserve,
/// freeze, clawback); no external trustee is involved. `symbol` becomes the
/// unit name and `note` is attached as UTF-8 bytes.
pub fn build_create_asset(
    issuer: Address,
    name: &str,
    symbol: &str,
    note: &str,
) -> impl FnOnce(&TransactionParams) -> UnsignedTransaction {
    let asset = AssetParams {
        total: NFT_TOTAL_UNITS,
        decimals: NFT_DECIMALS,
        default_frozen: false,
        unit_name: symbol.to_string(),
        asset_name: name.to_string(),
        url: String::new(),
        metadata_hash: Vec::new(),
        manager: Some(issuer),
        reserve: Some(issuer),
        freeze: Some(issuer),
        clawback: Some(issuer),
    };
    let note = note.as_bytes().to_vec();

    move |params| UnsignedTransaction {
        header: TxHeader {
            note,
            ..TxHeader::new(issuer, params)
        },
        body: TxBody::AssetConfig(asset),
    }
}

/// Build an asset transfer of `amount` units from `from` to `to`
///
/// With `close_out` set, `to` also becomes the remainder recipient, which
/// removes the sender's holding slot entirely. Only use it for an intentional
/// opt-out, never for a mint or a balance-preserving transfer.
pub fn build_asset_transfer(
    asset_id: AssetId,
    from: Address,
    to: Address,
    amount: u64,
    close_out: bool,
) -> impl FnOnce(&TransactionParams) -> UnsignedTransaction {
    move |params| UnsignedTransaction {
        header: TxHeader::new(from, params),
        body: TxBody::AssetTransfer {
            asset_id,
            receiver: to,
            amount,
            close_to: close_out.then_some(to),
        },
    }
}

/// Build an opt-in: a zero-amount transfer of the asset to oneself
pub fn build_opt_in(
    asset_id: AssetId,
    account: Address,
) -> impl FnOnce(&TransactionParams) -> UnsignedTransaction {
    build_asset_transfer(asset_id, account, account, 0, false)
}

/// Build a native-currency payment
pub fn build_payment(
    from: Address,
    to: Address,
    amount: MicroAlgos,
) -> impl FnOnce(&TransactionParams) -> UnsignedTransaction {
    move |params| UnsignedTransaction {
        header: TxHeader::new(from, params),
        body: TxBody::Payment {
            receiver: to,
            amount,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const ALICE: Address = Address([1; 32]);
    const BOB: Address = Address([2; 32]);

    fn params(first_valid: u64) -> TransactionParams {
        TransactionParams {
            fee: MicroAlgos(1_000),
            first_valid,
            last_valid: first_valid + 1_000,
            genesis_id: "devnet-v1".to_string(),
        }
    }

    #[test]
    fn test_create_asset_fixes_nft_shape() {
        let txn = build_create_asset(ALICE, "Laughing Out Loud", "LOL1", "Edition 1 of 1")(&params(5));

        assert_eq!(txn.sender(), ALICE);
        assert_eq!(txn.header.note, b"Edition 1 of 1".to_vec());
        match txn.body {
            TxBody::AssetConfig(asset) => {
                assert_eq!(asset.total, 1);
                assert_eq!(asset.decimals, 0);
                assert!(!asset.default_frozen);
                assert_eq!(asset.unit_name, "LOL1");
                assert_eq!(asset.asset_name, "Laughing Out Loud");
                assert_eq!(asset.manager, Some(ALICE));
                assert_eq!(asset.reserve, Some(ALICE));
                assert_eq!(asset.freeze, Some(ALICE));
                assert_eq!(asset.clawback, Some(ALICE));
            }
            other => panic!("Expected asset config, got {:?}", other),
        }
    }

    #[test]
    fn test_builders_take_params_at_call_time() {
        let build = build_payment(ALICE, BOB, MicroAlgos(5));
        let txn = build(&params(42));

        assert_eq!(txn.header.first_valid, 42);
        assert_eq!(txn.header.last_valid, 1_042);
        assert_eq!(txn.header.fee, MicroAlgos(1_000));
        assert_eq!(txn.header.genesis_id, "devnet-v1");
    }

    #[rstest]
    #[case::plain_transfer(false, None)]
    #[case::close_out(true, Some(BOB))]
    fn test_asset_transfer_close_out(
        #[case] close_out: bool,
        #[case] expected_close_to: Option<Address>,
    ) {
        let txn = build_asset_transfer(AssetId(9), ALICE, BOB, 1, close_out)(&params(1));

        assert_eq!(
            txn.body,
            TxBody::AssetTransfer {
                asset_id: AssetId(9),
                receiver: BOB,
                amount: 1,
                close_to: expected_close_to,
            }
        );
    }

    #[test]
    fn test_opt_in_is_zero_amount_self_transfer() {
        let txn = build_opt_in(AssetId(3), BOB)(&params(1));

        assert_eq!(txn.sender(), BOB);
        assert_eq!(
            txn.body,
            TxBody::AssetTransfer {
                asset_id: AssetId(3),
                receiver: BOB,
                amount: 0,
                close_to: None,
            }
        );
    }
}
