//! End-to-end integration tests
//!
//! These tests drive the public API against a fresh `DevLedger` (and the
//! in-process `TradeProgram` for sales). Each test:
//! 1. Funds two accounts, Creator and Buyer
//! 2. Runs one part of the NFT lifecycle through the submitter
//! 3. Checks the balances the ledger reports afterwards
//!
//! Covered:
//! - Opt-in semantics (`NotOptedIn` vs `Held(0)`, idempotent opt-in)
//! - Creation and minting limits
//! - Opt-out with close-out
//! - The negotiated sale
//! - Failure modes (timeouts, signing with the wrong key, rejected transactions)
//! - The full demonstration, written to a report file

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use rust_nft_exchange::core::builder::build_payment;
    use rust_nft_exchange::core::negotiation::{BuyerState, SaleTerms, SellerState};
    use rust_nft_exchange::io::ReportFormat;
    use rust_nft_exchange::{
        Account, AssetBalance, DevLedger, ExchangeError, MicroAlgos, Negotiation, Nft, Scenario,
        ScenarioConfig, SubmitConfig, Submitter, TradeProgram,
    };
    use std::fs;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const TEN_UNITS: MicroAlgos = MicroAlgos(10_000_000);

    struct World {
        ledger: Arc<DevLedger>,
        creator: Arc<Account>,
        buyer: Arc<Account>,
    }

    /// Fund Creator and Buyer with 10 units each on a fresh ledger
    async fn world(wait_rounds: u64) -> World {
        let ledger = Arc::new(DevLedger::default());
        let submitter = Submitter::new(ledger.clone(), SubmitConfig::new(wait_rounds));
        let creator = Account::create(&submitter, ledger.as_ref(), "Creator", TEN_UNITS)
            .await
            .unwrap();
        let buyer = Account::create(&submitter, ledger.as_ref(), "Buyer", TEN_UNITS)
            .await
            .unwrap();

        World {
            ledger,
            creator: Arc::new(creator),
            buyer: Arc::new(buyer),
        }
    }

    async fn lol1(creator: &Arc<Account>) -> Nft {
        Nft::create(creator, "Laughing Out Loud", "LOL1", "Edition 1 of 1")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_creator_mints_to_itself_and_buyer_opts_in() {
        let World { creator, buyer, .. } = world(10).await;

        let nft = lol1(&creator).await;
        assert_eq!(nft.total_units(), 1);
        assert_eq!(nft.decimals(), 0);

        nft.mint(&creator).await.unwrap();
        buyer.opt_in(&nft).await.unwrap();

        assert_eq!(buyer.balance(Some(&nft)).await.unwrap().to_string(), "0 LOL1");
        assert_eq!(buyer.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(0));
        assert_eq!(creator.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(1));
        // create + mint
        assert_eq!(creator.native_balance().await.unwrap(), MicroAlgos(9_998_000));
    }

    #[tokio::test]
    async fn test_never_opted_in_reads_not_opted_in() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;

        let balance = buyer.asset_balance(nft.asset_id()).await.unwrap();

        assert_eq!(balance, AssetBalance::NotOptedIn);
        assert_ne!(balance, AssetBalance::Held(0));
        assert_eq!(buyer.balance(Some(&nft)).await.unwrap().to_string(), "NULL LOL1");
    }

    #[tokio::test]
    async fn test_two_creations_yield_distinct_ids() {
        let World { creator, .. } = world(10).await;

        let first = lol1(&creator).await;
        let second = lol1(&creator).await;

        assert_ne!(first.asset_id(), second.asset_id());
    }

    #[tokio::test]
    async fn test_mint_beyond_total_is_rejected() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;
        buyer.opt_in(&nft).await.unwrap();
        nft.mint(&buyer).await.unwrap();

        let err = nft.mint(&creator).await.unwrap_err();

        assert!(matches!(err, ExchangeError::TransactionRejected { .. }));
        assert_eq!(creator.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(0));
        assert_eq!(buyer.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(1));
    }

    #[tokio::test]
    async fn test_opting_in_twice_is_harmless() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;

        buyer.opt_in(&nft).await.unwrap();
        buyer.opt_in(&nft).await.unwrap();

        assert_eq!(buyer.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(0));
    }

    #[tokio::test]
    async fn test_opt_out_closes_remainder_to_target() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;
        buyer.opt_in(&nft).await.unwrap();
        nft.mint(&buyer).await.unwrap();
        let creator_before = creator.asset_balance(nft.asset_id()).await.unwrap();

        buyer.opt_out(&nft, &creator).await.unwrap();

        assert_eq!(buyer.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::NotOptedIn);
        assert_eq!(creator_before, AssetBalance::Held(0));
        assert_eq!(creator.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(1));
    }

    #[tokio::test]
    async fn test_opt_out_without_opt_in_is_a_precondition_failure() {
        let World { ledger, creator, buyer } = world(10).await;
        let nft = lol1(&creator).await;
        let round_before = ledger.last_round();

        let err = buyer.opt_out(&nft, &creator).await.unwrap_err();

        assert!(matches!(err, ExchangeError::PreconditionNotMet { .. }));
        assert_eq!(ledger.last_round(), round_before);
    }

    #[tokio::test]
    async fn test_creator_cannot_opt_out_of_own_asset() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;
        buyer.opt_in(&nft).await.unwrap();

        let err = creator.opt_out(&nft, &buyer).await.unwrap_err();

        assert!(
            matches!(err, ExchangeError::TransactionRejected { ref reason, .. } if reason.contains("creator"))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_negotiation_delivers_proposed_price_and_settles() {
        let World { creator, buyer, .. } = world(10).await;
        let nft = lol1(&creator).await;
        nft.mint(&creator).await.unwrap();
        let buyer_before = buyer.native_balance().await.unwrap();

        let outcome = Negotiation::new(Arc::new(TradeProgram::new()))
            .run(
                Arc::clone(&creator),
                Arc::clone(&buyer),
                SaleTerms {
                    asset_id: nft.asset_id(),
                    price: MicroAlgos(5_000_000),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome.buyer.accepted_price, MicroAlgos(5_000_000));
        assert_eq!(outcome.seller.state, SellerState::Done);
        assert_eq!(outcome.buyer.state, BuyerState::Done);
        assert_eq!(buyer.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(1));
        assert_eq!(creator.asset_balance(nft.asset_id()).await.unwrap(), AssetBalance::Held(0));
        // price + opt-in fee + payment fee
        assert_eq!(
            buyer.native_balance().await.unwrap(),
            MicroAlgos(buyer_before.0 - 5_000_000 - 2_000)
        );
    }

    #[tokio::test]
    async fn test_stalled_ledger_times_out_after_wait_rounds() {
        let World { ledger, creator, .. } = world(4).await;
        ledger.set_block_production(false);

        let err = Nft::create(&creator, "Laughing Out Loud", "LOL1", "")
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::Timeout { rounds: 4, .. }));
        assert_eq!(creator.native_balance().await.unwrap(), TEN_UNITS);
    }

    #[tokio::test]
    async fn test_signing_for_another_sender_fails() {
        let World { creator, buyer, .. } = world(10).await;

        let err = creator
            .submitter()
            .submit(&creator, build_payment(buyer.address(), creator.address(), MicroAlgos(1)))
            .await
            .unwrap_err();

        assert!(matches!(err, ExchangeError::SigningFailure { ref account, .. } if account == "Creator"));
        assert_eq!(buyer.native_balance().await.unwrap(), TEN_UNITS);
    }

    #[rstest]
    #[case::overspend(MicroAlgos(50_000_000), "overspend")]
    #[case::below_min_balance(MicroAlgos(9_950_000), "below min")]
    #[tokio::test]
    async fn test_rejected_payments_carry_ledger_reason(#[case] amount: MicroAlgos, #[case] reason: &str) {
        let World { creator, buyer, .. } = world(10).await;

        let err = creator
            .submitter()
            .submit(&creator, build_payment(creator.address(), buyer.address(), amount))
            .await
            .unwrap_err();

        match err {
            ExchangeError::TransactionRejected { txid, reason: actual } => {
                assert!(txid.is_some());
                assert!(actual.contains(reason), "unexpected reason: {}", actual);
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(buyer.native_balance().await.unwrap(), TEN_UNITS);
    }

    #[rstest]
    #[case::text(ReportFormat::Text, "Account: Buyer\n  * 4.9980 ALGO\n  * 1 LOL1\n")]
    #[case::csv(ReportFormat::Csv, "Buyer,,ALGO,4.9980\nBuyer,1,LOL1,1\n")]
    fn test_demonstration_report_file(#[case] format: ReportFormat, #[case] expected_tail: &str) {
        let config = ScenarioConfig {
            format,
            worker_threads: 2,
            ..Default::default()
        };
        let mut file = NamedTempFile::new().unwrap();

        let summary = Scenario::new(config).run(file.as_file_mut()).unwrap();

        let written = fs::read_to_string(file.path()).unwrap();
        assert!(written.ends_with(expected_tail), "unexpected report:\n{}", written);
        assert_eq!(summary.outcome.buyer.accepted_price, MicroAlgos(5_000_000));
    }
}
