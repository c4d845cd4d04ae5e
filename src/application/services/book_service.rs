/// Order Book Service - Booking, Reconciliation and Cancellation
///
/// Owns the [`BookDirectory`] and reconciles every order read out of a book
/// against the authoritative record in the backing store before anyone acts
/// on it. An in-memory book entry is only a hint; the store decides whether
/// the order is still real.
///
/// ## Eviction policy
/// A peeked order whose authoritative record is absent, invalid, or cannot
/// be fetched is removed from the book and skipped. Storage errors never
/// propagate to callers: an evicted order can no longer match but its record
/// stays queryable by id.
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::model::{Order, OrderId, Side, Ticker};
use crate::domain::orderbook::BookDirectory;
use crate::domain::store::{OrderStore, StoreError};

pub struct OrderBookService {
    directory: BookDirectory,
    store: Arc<dyn OrderStore>,
}

impl OrderBookService {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        OrderBookService {
            directory: BookDirectory::new(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Inserts an order into its ticker's book, creating the book lazily.
    pub fn book_order(&self, order: &Order) -> bool {
        let book = self.directory.get_or_create(&order.ticker);
        let added = book.add(order);
        if added {
            info!(
                "order booked: {} {}x {} at {}",
                order.side, order.quantity, order.ticker, order.price
            );
        }
        added
    }

    /// Removes an order from its ticker's book if present. Idempotent.
    pub fn remove_order(&self, order: &Order) -> bool {
        match self.directory.get(&order.ticker) {
            Some(book) => book.remove(order),
            None => false,
        }
    }

    /// Returns the best-priced valid counter-order for `incoming`, or `None`.
    ///
    /// This is the staleness reconciler: each peeked candidate is re-fetched
    /// from the store, and anything absent, invalid, or unfetchable is
    /// evicted before the next-best candidate is considered.
    pub async fn best_match(&self, incoming: &Order) -> Option<Order> {
        let book = self.directory.get(&incoming.ticker)?;
        loop {
            let candidate = book.best_match(incoming)?;
            match self.store.find_by_id(candidate.id).await {
                Ok(Some(fresh)) if fresh.is_valid_for_matching() => return Some(fresh),
                Ok(_) => {
                    debug!(order_id = %candidate.id, "evicting stale order from book");
                    book.remove(&candidate);
                }
                Err(e) => {
                    warn!("failed to refresh order {}: {}", candidate.id, e);
                    book.remove(&candidate);
                }
            }
        }
    }

    /// All currently valid orders on one side of a ticker's book, best first.
    ///
    /// Applies the same reconcile-or-evict policy as [`best_match`] to every
    /// snapshot entry, so expired or cancelled orders are never returned even
    /// while structurally present in the book.
    ///
    /// [`best_match`]: Self::best_match
    pub async fn active_orders(&self, ticker: &Ticker, side: Side) -> Vec<Order> {
        let Some(book) = self.directory.get(ticker) else {
            return Vec::new();
        };

        let mut valid = Vec::new();
        for order in book.snapshot(side) {
            match self.store.find_by_id(order.id).await {
                Ok(Some(fresh)) if fresh.is_valid_for_matching() => valid.push(fresh),
                Ok(_) => {
                    debug!(order_id = %order.id, "evicting stale order from snapshot");
                    book.remove(&order);
                }
                Err(e) => {
                    warn!("failed to refresh order {}: {}", order.id, e);
                    book.remove(&order);
                }
            }
        }
        valid
    }

    /// Authoritative lookup by id; cancelled and expired orders remain
    /// queryable here even after eviction from the book.
    pub async fn order_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        self.store.find_by_id(id).await
    }

    /// Every ticker a book exists for.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.directory.tickers()
    }

    /// Resting depth of one side of a ticker's book, unreconciled.
    pub fn depth(&self, ticker: &Ticker, side: Side) -> usize {
        self.directory
            .get(ticker)
            .map(|book| book.len(side))
            .unwrap_or(0)
    }

    /// Cancels an order on behalf of its owner.
    ///
    /// Returns `false` when the order is unknown, already inactive, owned by
    /// someone else, or lost a version race (a concurrent cancel or fill got
    /// there first). A second cancel of the same id is therefore `false`,
    /// never an error.
    pub async fn cancel_order(&self, id: OrderId, user_id: &str) -> bool {
        let order = match self.store.find_by_id(id).await {
            Ok(Some(order)) => order,
            Ok(None) => return false,
            Err(e) => {
                warn!("cancel fetch failed for order {}: {}", id, e);
                return false;
            }
        };

        if !order.active || order.user_id != user_id {
            return false;
        }

        let mut deactivated = order.clone();
        deactivated.active = false;
        match self.store.compare_and_update(&deactivated).await {
            Ok(_) => {
                self.remove_order(&order);
                info!("order cancelled: {} by user {}", id, user_id);
                true
            }
            // Version mismatch means a concurrent fill or cancel won; treat
            // exactly like "not found".
            Err(StoreError::VersionConflict(_)) | Err(StoreError::NotFound(_)) => false,
            Err(e) => {
                warn!("cancel update failed for order {}: {}", id, e);
                false
            }
        }
    }

    /// Claims an order for trade execution by deactivating its record with a
    /// version check, guaranteeing at most one consumer per resting order.
    ///
    /// Any error means the claim failed and the caller must re-select.
    pub async fn claim(&self, order: &Order) -> Result<Order, StoreError> {
        let fresh = self
            .store
            .find_by_id(order.id)
            .await?
            .ok_or(StoreError::NotFound(order.id))?;
        if !fresh.is_valid_for_matching() {
            return Err(StoreError::NotFound(order.id));
        }

        let mut claimed = fresh;
        claimed.active = false;
        let stored = self.store.compare_and_update(&claimed).await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Side;
    use crate::infrastructure::memory::InMemoryOrderStore;
    use rust_decimal_macros::dec;

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    fn order(side: Side, price: rust_decimal::Decimal, user: &str) -> Order {
        Order::new(side, ticker(), price, 100, user.to_string())
    }

    async fn service_with(orders: &[Order]) -> OrderBookService {
        let store = Arc::new(InMemoryOrderStore::new());
        let service = OrderBookService::new(store);
        for order in orders {
            service.store().save(order.clone()).await.unwrap();
            service.book_order(order);
        }
        service
    }

    #[tokio::test]
    async fn test_best_match_skips_and_evicts_cancelled_order() {
        let best = order(Side::Sell, dec!(145.00), "s1");
        let next = order(Side::Sell, dec!(146.00), "s2");
        let service = service_with(&[best.clone(), next.clone()]).await;

        assert!(service.cancel_order(best.id, "s1").await);

        let incoming = order(Side::Buy, dec!(150.00), "b1");
        let matched = service.best_match(&incoming).await.unwrap();
        assert_eq!(matched.id, next.id);
        // The cancelled order was evicted, not just skipped.
        assert_eq!(service.depth(&ticker(), Side::Sell), 1);
    }

    #[tokio::test]
    async fn test_best_match_evicts_expired_order() {
        let mut expired = order(Side::Sell, dec!(145.00), "s1");
        expired.expires_at = expired.timestamp;
        let service = service_with(&[expired]).await;

        let incoming = order(Side::Buy, dec!(150.00), "b1");
        assert!(service.best_match(&incoming).await.is_none());
        assert_eq!(service.depth(&ticker(), Side::Sell), 0);
    }

    #[tokio::test]
    async fn test_active_orders_filters_invalid_entries() {
        let valid = order(Side::Buy, dec!(150.00), "b1");
        let cancelled = order(Side::Buy, dec!(148.00), "b2");
        let service = service_with(&[valid.clone(), cancelled.clone()]).await;
        service.cancel_order(cancelled.id, "b2").await;

        let active = service.active_orders(&ticker(), Side::Buy).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, valid.id);
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let resting = order(Side::Sell, dec!(145.00), "s1");
        let service = service_with(&[resting.clone()]).await;

        assert!(service.cancel_order(resting.id, "s1").await);
        assert!(!service.cancel_order(resting.id, "s1").await);

        // The record is deactivated exactly once and still queryable.
        let stored = service.order_by_id(resting.id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn test_cancel_rejects_wrong_owner() {
        let resting = order(Side::Sell, dec!(145.00), "s1");
        let service = service_with(&[resting.clone()]).await;
        assert!(!service.cancel_order(resting.id, "someone-else").await);
        assert!(service
            .order_by_id(resting.id)
            .await
            .unwrap()
            .unwrap()
            .active);
    }

    #[tokio::test]
    async fn test_claim_consumes_order_once() {
        let resting = order(Side::Sell, dec!(145.00), "s1");
        let service = service_with(&[resting.clone()]).await;

        let claimed = service.claim(&resting).await.unwrap();
        assert!(!claimed.active);
        // A second claim loses: the record is no longer valid for matching.
        assert!(service.claim(&resting).await.is_err());
    }
}
