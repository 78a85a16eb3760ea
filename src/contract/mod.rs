//! In-process trade contract
//!
//! `TradeProgram` implements [`ContractProgram`] for a single NFT sale. Each
//! deployed instance is a session with three one-shot messages between the
//! participants:
//!
//! ```text
//! Seller                         Buyer
//!   │ ── terms (asset, price) ──▶  │
//!   │ ◀── payment receipt ──────── │  (after opting in and paying)
//!   │ ── delivery receipt ──────▶  │  (after transferring the unit)
//! ```
//!
//! Settlement happens as two ordinary ledger transactions. A participant
//! whose counterpart goes away (for example because it was cancelled) sees
//! the message channel close and fails with a contract error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{debug, info, instrument};

use crate::core::account::Account;
use crate::core::builder::{build_asset_transfer, build_opt_in, build_payment, NFT_TOTAL_UNITS};
use crate::core::traits::{
    BuyerInteract, ContractHandle, ContractInfo, ContractProgram, LedgerFuture, SellerInteract,
};
use crate::types::{Address, AssetBalance, AssetId, ConfirmedReceipt, ExchangeError, MicroAlgos};

/// Terms published by the seller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Terms {
    asset_id: AssetId,
    price: MicroAlgos,
    seller: Address,
}

/// What the buyer hands back after paying
#[derive(Debug, Clone, PartialEq, Eq)]
struct Payment {
    buyer: Address,
    amount: MicroAlgos,
    receipt: ConfirmedReceipt,
}

struct SellerSide {
    terms_tx: oneshot::Sender<Terms>,
    payment_rx: oneshot::Receiver<Payment>,
    delivery_tx: oneshot::Sender<ConfirmedReceipt>,
}

struct BuyerSide {
    terms_rx: oneshot::Receiver<Terms>,
    payment_tx: oneshot::Sender<Payment>,
    delivery_rx: oneshot::Receiver<ConfirmedReceipt>,
}

/// One deployed instance; each side can be run exactly once
struct Session {
    seller: Mutex<Option<SellerSide>>,
    buyer: Mutex<Option<BuyerSide>>,
}

impl Session {
    fn new() -> Self {
        let (terms_tx, terms_rx) = oneshot::channel();
        let (payment_tx, payment_rx) = oneshot::channel();
        let (delivery_tx, delivery_rx) = oneshot::channel();

        Self {
            seller: Mutex::new(Some(SellerSide {
                terms_tx,
                payment_rx,
                delivery_tx,
            })),
            buyer: Mutex::new(Some(BuyerSide {
                terms_rx,
                payment_tx,
                delivery_rx,
            })),
        }
    }
}

fn take_side<T>(slot: &Mutex<Option<T>>, info: ContractInfo, role: &str) -> Result<T, ExchangeError> {
    let mut guard = match slot.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard
        .take()
        .ok_or_else(|| ExchangeError::contract(&format!("{} of {} already ran", role, info)))
}

/// Registry of trade sessions
#[derive(Default)]
pub struct TradeProgram {
    sessions: DashMap<ContractInfo, Arc<Session>>,
    next_id: AtomicU64,
}

impl TradeProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of instances deployed so far
    pub fn deployed(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, info: ContractInfo) -> Result<Arc<Session>, ExchangeError> {
        self.sessions
            .get(&info)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ExchangeError::contract(&format!("no contract deployed at {}", info)))
    }
}

#[instrument(skip_all, fields(contract = %handle.info, seller = %handle.account.name()))]
async fn run_seller(
    session: Arc<Session>,
    handle: ContractHandle,
    interact: SellerInteract,
) -> Result<(), ExchangeError> {
    let side = take_side(&session.seller, handle.info, "seller")?;
    let seller = &handle.account;

    let (asset_id, price) = (interact.get_token_and_price)();
    match seller.asset_balance(asset_id).await? {
        AssetBalance::Held(units) if units >= NFT_TOTAL_UNITS => {}
        balance => {
            return Err(ExchangeError::contract(&format!(
                "seller holds {} of asset {}, cannot offer it",
                balance, asset_id
            )))
        }
    }

    side.terms_tx
        .send(Terms {
            asset_id,
            price,
            seller: seller.address(),
        })
        .map_err(|_| ExchangeError::contract("buyer left before terms were published"))?;
    debug!(%asset_id, %price, "Terms published");

    let payment = side
        .payment_rx
        .await
        .map_err(|_| ExchangeError::contract("buyer left before paying"))?;
    if payment.amount != price {
        return Err(ExchangeError::contract(&format!(
            "buyer paid {} instead of {}",
            payment.amount, price
        )));
    }
    debug!(txid = %payment.receipt.txid, "Payment received");

    let delivery = seller
        .submitter()
        .submit(
            seller,
            build_asset_transfer(asset_id, seller.address(), payment.buyer, NFT_TOTAL_UNITS, false),
        )
        .await?;

    side.delivery_tx
        .send(delivery.clone())
        .map_err(|_| ExchangeError::contract("buyer left before delivery"))?;
    info!(txid = %delivery.txid, round = delivery.confirmed_round, "Asset delivered");
    Ok(())
}

#[instrument(skip_all, fields(contract = %handle.info, buyer = %handle.account.name()))]
async fn run_buyer(
    session: Arc<Session>,
    handle: ContractHandle,
    interact: BuyerInteract,
) -> Result<(), ExchangeError> {
    let side = take_side(&session.buyer, handle.info, "buyer")?;
    let buyer = &handle.account;

    let terms = side
        .terms_rx
        .await
        .map_err(|_| ExchangeError::contract("seller left before publishing terms"))?;
    (interact.accept_price)(terms.price);

    if !buyer.asset_balance(terms.asset_id).await?.is_opted_in() {
        buyer
            .submitter()
            .submit(buyer, build_opt_in(terms.asset_id, buyer.address()))
            .await?;
        debug!(asset_id = %terms.asset_id, "Opted in before paying");
    }

    let receipt = buyer
        .submitter()
        .submit(buyer, build_payment(buyer.address(), terms.seller, terms.price))
        .await?;
    side.payment_tx
        .send(Payment {
            buyer: buyer.address(),
            amount: terms.price,
            receipt,
        })
        .map_err(|_| ExchangeError::contract("seller left before payment was handed over"))?;

    let delivery = side
        .delivery_rx
        .await
        .map_err(|_| ExchangeError::contract("seller left before delivering"))?;
    info!(txid = %delivery.txid, "Delivery acknowledged");
    Ok(())
}

impl ContractProgram for TradeProgram {
    fn deploy(&self, account: Arc<Account>) -> LedgerFuture<'_, ContractHandle> {
        async move {
            let info = ContractInfo(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            self.sessions.insert(info, Arc::new(Session::new()));
            info!(contract = %info, deployer = %account.name(), "Contract deployed");
            Ok(ContractHandle { info, account })
        }
        .boxed()
    }

    fn attach(&self, account: Arc<Account>, info: ContractInfo) -> LedgerFuture<'_, ContractHandle> {
        async move { self.session(info).map(|_| ContractHandle { info, account }) }.boxed()
    }

    fn seller(&self, handle: ContractHandle, interact: SellerInteract) -> LedgerFuture<'_, ()> {
        async move {
            let session = self.session(handle.info)?;
            run_seller(session, handle, interact).await
        }
        .boxed()
    }

    fn buyer(&self, handle: ContractHandle, interact: BuyerInteract) -> LedgerFuture<'_, ()> {
        async move {
            let session = self.session(handle.info)?;
            run_buyer(session, handle, interact).await
        }
        .boxed()
    }
}
