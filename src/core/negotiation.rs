//! Two-party price negotiation
//!
//! The seller deploys a contract instance and the buyer attaches to it. Each
//! role then runs as its own tokio task against the contract:
//!
//! ```text
//! Seller: Idle ─▶ ProposePrice(asset, price) ─▶ AwaitOutcome ─▶ Done
//! Buyer:  Idle ─▶ AwaitProposal ─▶ AcceptPrice(price) ─────────▶ Done
//! ```
//!
//! The two tasks share no memory; everything they learn about each other
//! comes through the contract. [`Negotiation::run`] returns only after both
//! tasks are done. If one fails, the other is cancelled through a shared
//! `CancellationToken` and the first real failure is returned. Dropping the
//! `run` future cancels both tasks.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use super::account::Account;
use super::traits::{BuyerInteract, ContractHandle, ContractProgram, SellerInteract};
use crate::types::{AssetId, ExchangeError, MicroAlgos, Role};

/// Seller-side protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerState {
    Idle,
    ProposePrice,
    AwaitOutcome,
    Done,
}

/// Buyer-side protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyerState {
    Idle,
    AwaitProposal,
    AcceptPrice,
    Done,
}

/// What the seller puts up for sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTerms {
    pub asset_id: AssetId,
    pub price: MicroAlgos,
}

/// The seller's local view once its role has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SellerView {
    pub asset_id: AssetId,
    pub price: MicroAlgos,
    pub state: SellerState,
}

/// The buyer's local view once its role has finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuyerView {
    pub accepted_price: MicroAlgos,
    pub state: BuyerState,
}

/// Protocol step reported by a role at the moment it happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationEvent {
    Proposed { asset_id: AssetId, price: MicroAlgos },
    Accepted { price: MicroAlgos },
}

type EventSender = Option<mpsc::UnboundedSender<NegotiationEvent>>;

fn report(events: &EventSender, event: NegotiationEvent) {
    if let Some(events) = events {
        // Nobody listening is fine.
        let _ = events.send(event);
    }
}

/// Result of a negotiation in which both roles reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationOutcome {
    pub seller: SellerView,
    pub buyer: BuyerView,
}

/// Runs the seller and buyer roles against one contract program
#[derive(Clone)]
pub struct Negotiation {
    program: Arc<dyn ContractProgram>,
    events: EventSender,
}

impl Negotiation {
    pub fn new(program: Arc<dyn ContractProgram>) -> Self {
        Self {
            program,
            events: None,
        }
    }

    /// Report each proposal and acceptance on `events` as it happens
    pub fn with_events(mut self, events: mpsc::UnboundedSender<NegotiationEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Deploy, attach, and run both roles to completion
    ///
    /// # Errors
    ///
    /// Returns the first non-cancellation error raised by either role, or the
    /// deploy/attach error if the contract could not be set up.
    #[instrument(skip_all, fields(seller = %seller.name(), buyer = %buyer.name(), asset_id = %terms.asset_id))]
    pub async fn run(
        &self,
        seller: Arc<Account>,
        buyer: Arc<Account>,
        terms: SaleTerms,
    ) -> Result<NegotiationOutcome, ExchangeError> {
        let seller_handle = self.program.deploy(seller).await?;
        let buyer_handle = self.program.attach(buyer, seller_handle.info).await?;
        info!(contract = %seller_handle.info, "Contract deployed and attached");

        let cancel = CancellationToken::new();
        // Dropping `run` stops both roles.
        let _stop_roles = cancel.clone().drop_guard();
        let seller_task = tokio::spawn(run_seller(
            Arc::clone(&self.program),
            seller_handle,
            terms,
            self.events.clone(),
            cancel.clone(),
        ));
        let buyer_task = tokio::spawn(run_buyer(
            Arc::clone(&self.program),
            buyer_handle,
            self.events.clone(),
            cancel.clone(),
        ));

        let (seller_result, buyer_result) = tokio::join!(
            join_role(Role::Seller, seller_task, &cancel),
            join_role(Role::Buyer, buyer_task, &cancel),
        );

        match (seller_result, buyer_result) {
            (Ok(seller), Ok(buyer)) => Ok(NegotiationOutcome { seller, buyer }),
            (Err(seller_err), Err(buyer_err)) if seller_err.is_cancellation() => Err(buyer_err),
            (Err(err), _) | (_, Err(err)) => Err(err),
        }
    }
}

/// Await one role's task; on a real failure, cancel the sibling
async fn join_role<T>(
    role: Role,
    task: JoinHandle<Result<T, ExchangeError>>,
    cancel: &CancellationToken,
) -> Result<T, ExchangeError> {
    let result = match task.await {
        Ok(result) => result,
        Err(join_error) => Err(ExchangeError::contract(&format!(
            "{} task aborted: {}",
            role, join_error
        ))),
    };

    if let Err(err) = &result {
        if !err.is_cancellation() {
            warn!(%role, error = %err, "Participant failed, cancelling sibling");
            cancel.cancel();
        }
    }

    result
}

async fn run_seller(
    program: Arc<dyn ContractProgram>,
    handle: ContractHandle,
    terms: SaleTerms,
    events: EventSender,
    cancel: CancellationToken,
) -> Result<SellerView, ExchangeError> {
    info!(role = %Role::Seller, state = ?SellerState::Idle);

    let (proposed_tx, mut proposed_rx) = oneshot::channel();
    let interact = SellerInteract {
        get_token_and_price: Box::new(move || {
            info!(
                role = %Role::Seller,
                state = ?SellerState::ProposePrice,
                asset_id = %terms.asset_id,
                price = %terms.price
            );
            report(
                &events,
                NegotiationEvent::Proposed {
                    asset_id: terms.asset_id,
                    price: terms.price,
                },
            );
            // The receiver lives until the role finishes.
            let _ = proposed_tx.send(());
            info!(role = %Role::Seller, state = ?SellerState::AwaitOutcome);
            (terms.asset_id, terms.price)
        }),
    };

    tokio::select! {
        result = program.seller(handle, interact) => result?,
        _ = cancel.cancelled() => return Err(ExchangeError::Cancelled { role: Role::Seller }),
    }

    if proposed_rx.try_recv().is_err() {
        return Err(ExchangeError::contract(
            "seller finished without being asked for terms",
        ));
    }
    info!(role = %Role::Seller, state = ?SellerState::Done);
    Ok(SellerView {
        asset_id: terms.asset_id,
        price: terms.price,
        state: SellerState::Done,
    })
}

async fn run_buyer(
    program: Arc<dyn ContractProgram>,
    handle: ContractHandle,
    events: EventSender,
    cancel: CancellationToken,
) -> Result<BuyerView, ExchangeError> {
    info!(role = %Role::Buyer, state = ?BuyerState::Idle);
    info!(role = %Role::Buyer, state = ?BuyerState::AwaitProposal);

    let (accepted_tx, mut accepted_rx) = oneshot::channel();
    let interact = BuyerInteract {
        accept_price: Box::new(move |price: MicroAlgos| {
            info!(role = %Role::Buyer, state = ?BuyerState::AcceptPrice, %price);
            report(&events, NegotiationEvent::Accepted { price });
            let _ = accepted_tx.send(price);
        }),
    };

    tokio::select! {
        result = program.buyer(handle, interact) => result?,
        _ = cancel.cancelled() => return Err(ExchangeError::Cancelled { role: Role::Buyer }),
    }

    let accepted_price = accepted_rx.try_recv().map_err(|_| {
        ExchangeError::contract("buyer finished without receiving a price")
    })?;

    info!(role = %Role::Buyer, state = ?BuyerState::Done);
    Ok(BuyerView {
        accepted_price,
        state: BuyerState::Done,
    })
}
