/// Trade - Executed Match Record
///
/// A trade is produced exactly once per successful match and never mutated
/// afterwards. The execution price is always the resting counter-order's
/// price: price-time priority rewards the order that arrived first.
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::order::{Order, OrderId, Side, Ticker};
use crate::shared::time::current_time_millis;

/// Opaque unique trade identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(Uuid);

impl TradeId {
    pub fn new() -> Self {
        TradeId(Uuid::new_v4())
    }
}

impl Default for TradeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An executed match between one buy order and one sell order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub ticker: Ticker,
    /// Execution price: the resting counter-order's limit price.
    pub price: Decimal,
    /// min(buy.quantity, sell.quantity); the larger side's remainder is
    /// re-submitted by the matching loop, never recorded here.
    pub quantity: u32,
    pub timestamp: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: String,
    pub seller_id: String,
}

impl Trade {
    /// Builds a trade from the two matched orders and the execution price.
    pub fn new(buy_order: &Order, sell_order: &Order, execution_price: Decimal) -> Self {
        debug_assert_eq!(buy_order.side, Side::Buy);
        debug_assert_eq!(sell_order.side, Side::Sell);
        debug_assert_eq!(buy_order.ticker, sell_order.ticker);
        Trade {
            id: TradeId::new(),
            ticker: buy_order.ticker.clone(),
            price: execution_price,
            quantity: buy_order.quantity.min(sell_order.quantity),
            timestamp: current_time_millis(),
            buy_order_id: buy_order.id,
            sell_order_id: sell_order.id,
            buyer_id: buy_order.user_id.clone(),
            seller_id: sell_order.user_id.clone(),
        }
    }
}
