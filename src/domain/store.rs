/// Backing Store Boundary
///
/// The matching core never owns durable persistence; it talks to it through
/// these traits. `OrderStore` is the authoritative source of truth the
/// reconciler re-fetches from before trusting any in-memory order, and
/// `TradeSink` is where executed trades are handed off. The core does not
/// retry sink failures itself.
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::model::{Order, OrderId, Trade};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The record changed between read and write. Callers treat this the
    /// same as `NotFound`: drop the attempt or re-read.
    #[error("version conflict updating order {0}")]
    VersionConflict(OrderId),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Authoritative order storage.
///
/// `compare_and_update` must be atomic with respect to concurrent writers of
/// the same record: the update applies only if the stored version still
/// equals the caller's version, and the store bumps the version on success.
/// That per-record discipline is what makes cancellation and matching on the
/// same order mutually exclusive.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persists a new order and returns the stored record.
    async fn save(&self, order: Order) -> Result<Order, StoreError>;

    /// Version-checked update; returns the stored record with its bumped
    /// version on success.
    async fn compare_and_update(&self, order: &Order) -> Result<Order, StoreError>;
}

/// Destination for executed trades.
#[async_trait]
pub trait TradeSink: Send + Sync {
    async fn record(&self, trade: Trade) -> Result<Trade, StoreError>;
}
