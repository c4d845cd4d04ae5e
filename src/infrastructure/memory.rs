/// In-Memory Backing Store
///
/// Store implementations for the simulation: a concurrent order map and an
/// append-only trade log. `InMemoryOrderStore` leans on the map's per-entry
/// locking for the read-then-conditionally-write atomicity the
/// [`OrderStore`] contract requires.
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::model::{Order, OrderId, Ticker, Trade};
use crate::domain::store::{OrderStore, StoreError, TradeSink};

/// Order records keyed by id. Orders are flagged inactive, never removed.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<OrderId, Order>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.get(&id).map(|entry| entry.clone()))
    }

    async fn save(&self, order: Order) -> Result<Order, StoreError> {
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn compare_and_update(&self, order: &Order) -> Result<Order, StoreError> {
        // The entry handle holds the shard lock, making the version check
        // and the write one atomic step.
        match self.orders.entry(order.id) {
            Entry::Occupied(mut entry) => {
                if entry.get().version != order.version {
                    return Err(StoreError::VersionConflict(order.id));
                }
                let mut updated = order.clone();
                updated.version += 1;
                entry.insert(updated.clone());
                Ok(updated)
            }
            Entry::Vacant(_) => Err(StoreError::NotFound(order.id)),
        }
    }
}

/// Append-only record of executed trades with the query surface the
/// simulation reports from.
#[derive(Default)]
pub struct InMemoryTradeLog {
    trades: RwLock<Vec<Trade>>,
}

impl InMemoryTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Trade> {
        self.trades.read().clone()
    }

    pub fn for_ticker(&self, ticker: &Ticker) -> Vec<Trade> {
        self.trades
            .read()
            .iter()
            .filter(|trade| &trade.ticker == ticker)
            .cloned()
            .collect()
    }

    pub fn for_user(&self, user_id: &str) -> Vec<Trade> {
        self.trades
            .read()
            .iter()
            .filter(|trade| trade.buyer_id == user_id || trade.seller_id == user_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }
}

#[async_trait]
impl TradeSink for InMemoryTradeLog {
    async fn record(&self, trade: Trade) -> Result<Trade, StoreError> {
        self.trades.write().push(trade.clone());
        Ok(trade)
    }
}
