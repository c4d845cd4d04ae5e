//! Matching Service - Submission Queue and Matching Loop
//!
//! Accepted orders flow through an unbounded multi-producer queue into a
//! pool of worker tasks. Each worker loops forever: dequeue, re-validate,
//! select a counter-order, then either execute a trade or book the order.
//! Submission is decoupled from processing; `submit` returns as soon as the
//! order is persisted and enqueued.
//!
//! ## Concurrency
//! Any number of workers drain the same queue. Concurrent matches against
//! one ticker are serialized by that ticker's book lock, and a resting order
//! can be consumed by at most one trade because execution claims it through
//! a version-checked deactivation in the backing store. Workers on different
//! tickers proceed fully in parallel.
use std::sync::Arc;

use parking_lot::Mutex as StdMutex;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::OrderBookService;
use crate::domain::model::{Order, Side, Trade};
use crate::domain::store::{StoreError, TradeSink};

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The order failed `is_valid_for_matching` at intake.
    #[error("rejected invalid order from {user_id}: expired or inactive")]
    Rejected { user_id: String },

    /// The submission queue has been shut down.
    #[error("submission queue is closed")]
    QueueClosed,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct MatchingService {
    books: Arc<OrderBookService>,
    trades: Arc<dyn TradeSink>,
    // Dropped on shutdown so parked workers observe the closed channel.
    queue_tx: StdMutex<Option<UnboundedSender<Order>>>,
    // Single receiver shared by every worker; the mutex hands queue items to
    // exactly one idle worker at a time.
    queue_rx: Arc<Mutex<UnboundedReceiver<Order>>>,
}

impl MatchingService {
    pub fn new(books: Arc<OrderBookService>, trades: Arc<dyn TradeSink>) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        MatchingService {
            books,
            trades,
            queue_tx: StdMutex::new(Some(queue_tx)),
            queue_rx: Arc::new(Mutex::new(queue_rx)),
        }
    }

    pub fn books(&self) -> &Arc<OrderBookService> {
        &self.books
    }

    /// Accepts an order for asynchronous processing.
    ///
    /// The order is persisted and enqueued; matching happens later on a
    /// worker. Orders that are already expired or inactive are rejected
    /// synchronously and never enqueued.
    pub async fn submit(&self, order: Order) -> Result<(), SubmitError> {
        if !order.is_valid_for_matching() {
            return Err(SubmitError::Rejected {
                user_id: order.user_id,
            });
        }
        let persisted = self.books.store().save(order).await?;
        self.enqueue(persisted)
    }

    fn enqueue(&self, order: Order) -> Result<(), SubmitError> {
        match self.queue_tx.lock().as_ref() {
            Some(tx) => tx.send(order).map_err(|_| SubmitError::QueueClosed),
            None => Err(SubmitError::QueueClosed),
        }
    }

    /// Spawns `workers` tasks draining the submission queue.
    pub fn spawn_workers(self: &Arc<Self>, workers: usize) -> Vec<JoinHandle<()>> {
        (0..workers)
            .map(|worker| {
                let service = Arc::clone(self);
                tokio::spawn(async move {
                    service.run_worker(worker).await;
                })
            })
            .collect()
    }

    /// Closes the submission queue. Workers drain what is already queued and
    /// then exit; later `submit` calls fail with `QueueClosed`.
    pub fn shutdown(&self) {
        self.queue_tx.lock().take();
    }

    async fn run_worker(&self, worker: usize) {
        debug!(worker, "matching worker started");
        loop {
            // Hold the receiver lock only for the dequeue itself so other
            // workers can park on the queue while this one processes.
            let next = self.queue_rx.lock().await.recv().await;
            match next {
                Some(order) => self.process(order).await,
                None => break,
            }
        }
        debug!(worker, "matching worker stopped");
    }

    /// One iteration of the matching loop for a dequeued order.
    ///
    /// Never returns an error: a bad order is discarded or evicted, logged,
    /// and the loop moves on.
    pub async fn process(&self, order: Order) {
        if !order.is_valid_for_matching() {
            debug!("skipping invalid order {}: expired or inactive", order.id);
            return;
        }

        loop {
            let Some(counter) = self.books.best_match(&order).await else {
                self.books.book_order(&order);
                return;
            };

            if !Self::can_match(&order, &counter) {
                self.books.book_order(&order);
                return;
            }

            match self.books.claim(&counter).await {
                Ok(claimed) => {
                    self.execute_trade(order, claimed).await;
                    return;
                }
                Err(e) => {
                    // Lost the race for this counter-order; evict the stale
                    // entry and consider the next-best one.
                    debug!("claim of order {} failed ({}), reselecting", counter.id, e);
                    self.books.remove_order(&counter);
                }
            }
        }
    }

    /// Prices cross when the buyer is willing to pay at least the seller's ask.
    pub fn can_match(incoming: &Order, counter: &Order) -> bool {
        if !counter.is_valid_for_matching() {
            return false;
        }
        match incoming.side {
            Side::Buy => incoming.price >= counter.price,
            Side::Sell => counter.price >= incoming.price,
        }
    }

    /// Executes a trade between the incoming order and a claimed resting
    /// counter-order. The execution price is the resting order's price.
    async fn execute_trade(&self, incoming: Order, resting: Order) {
        self.books.remove_order(&resting);

        let (buy, sell) = match incoming.side {
            Side::Buy => (&incoming, &resting),
            Side::Sell => (&resting, &incoming),
        };
        let trade = Trade::new(buy, sell, resting.price);

        let recorded = match self.trades.record(trade).await {
            Ok(recorded) => recorded,
            Err(e) => {
                // Nothing is dropped on a sink failure: both sides go back
                // through the queue. The resting order was already claimed,
                // so it re-enters as a fresh record keeping its timestamp.
                error!("trade persistence failed, requeueing both orders: {}", e);
                self.requeue(incoming).await;
                self.requeue(resting.reissued()).await;
                return;
            }
        };

        info!(
            "trade executed: [{}] {}x {} at {} between {} and {}",
            recorded.id,
            recorded.quantity,
            recorded.ticker,
            recorded.price,
            recorded.buyer_id,
            recorded.seller_id
        );

        // The incoming order is consumed too; a version conflict here means
        // a concurrent cancel raced the fill and is tolerated.
        let mut filled = incoming.clone();
        filled.active = false;
        if let Err(e) = self.books.store().compare_and_update(&filled).await {
            debug!("could not mark order {} filled: {}", incoming.id, e);
        }

        // Quantities rarely match exactly; the larger side's remainder is
        // split into a new order and re-submitted instead of being dropped.
        if incoming.quantity > recorded.quantity {
            self.requeue(incoming.split_remaining(incoming.quantity - recorded.quantity))
                .await;
        } else if resting.quantity > recorded.quantity {
            self.requeue(resting.split_remaining(resting.quantity - recorded.quantity))
                .await;
        }
    }

    async fn requeue(&self, order: Order) {
        debug!(
            "requeueing {} {}x {} at {} for {}",
            order.side, order.quantity, order.ticker, order.price, order.user_id
        );
        match self.books.store().save(order).await {
            Ok(persisted) => {
                if self.enqueue(persisted).is_err() {
                    error!("submission queue closed, dropping requeued order");
                }
            }
            Err(e) => error!("failed to persist requeued order: {}", e),
        }
    }
}
