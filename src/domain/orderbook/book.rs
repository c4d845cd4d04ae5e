/// TickerBook - Per-Ticker Order Book
///
/// Holds the resting orders for one ticker in two price-time orderings:
/// bids ranked highest price first, asks ranked lowest price first, ties on
/// both sides broken by earliest submission and then by order id.
///
/// ## Concurrency
/// A single reader/writer lock guards both sides together. `add` and
/// `remove` take the write lock; `best_match` and `snapshot` take the read
/// lock. Mutating one side therefore blocks readers of the other, which
/// keeps a cancel-plus-rebook on the same ticker atomic from the point of
/// view of every reader.
use std::cmp::Reverse;
use std::collections::BTreeMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::trace;

use crate::domain::model::{Order, OrderId, Side, Ticker};

/// Bids iterate best-first with the price component inverted.
type BidKey = (Reverse<Decimal>, u64, OrderId);
/// Asks iterate best-first in natural price order.
type AskKey = (Decimal, u64, OrderId);

#[derive(Default)]
struct BookSides {
    bids: BTreeMap<BidKey, Order>,
    asks: BTreeMap<AskKey, Order>,
}

impl BookSides {
    fn bid_key(order: &Order) -> BidKey {
        (Reverse(order.price), order.timestamp, order.id)
    }

    fn ask_key(order: &Order) -> AskKey {
        (order.price, order.timestamp, order.id)
    }
}

/// The order book for a single ticker. Owned by the [`BookDirectory`];
/// nothing outside this module touches the orderings directly.
///
/// [`BookDirectory`]: super::BookDirectory
pub struct TickerBook {
    ticker: Ticker,
    sides: RwLock<BookSides>,
}

impl TickerBook {
    pub fn new(ticker: Ticker) -> Self {
        TickerBook {
            ticker,
            sides: RwLock::new(BookSides::default()),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Inserts an order into the side matching its type.
    ///
    /// Returns `false` only if an entry with the same identity key already
    /// rests in the book.
    pub fn add(&self, order: &Order) -> bool {
        let mut sides = self.sides.write();
        let inserted = match order.side {
            Side::Buy => sides
                .bids
                .insert(BookSides::bid_key(order), order.clone())
                .is_none(),
            Side::Sell => sides
                .asks
                .insert(BookSides::ask_key(order), order.clone())
                .is_none(),
        };
        trace!(ticker = %self.ticker, order_id = %order.id, inserted, "book add");
        inserted
    }

    /// Peeks the best-ranked order on the side opposite the incoming order,
    /// without removing it.
    pub fn best_match(&self, incoming: &Order) -> Option<Order> {
        let sides = self.sides.read();
        match incoming.side {
            Side::Buy => sides.asks.values().next().cloned(),
            Side::Sell => sides.bids.values().next().cloned(),
        }
    }

    /// Removes a specific order by identity. Idempotent: removing an absent
    /// order is a no-op and returns `false`.
    pub fn remove(&self, order: &Order) -> bool {
        let mut sides = self.sides.write();
        let removed = match order.side {
            Side::Buy => sides.bids.remove(&BookSides::bid_key(order)).is_some(),
            Side::Sell => sides.asks.remove(&BookSides::ask_key(order)).is_some(),
        };
        trace!(ticker = %self.ticker, order_id = %order.id, removed, "book remove");
        removed
    }

    /// Point-in-time copy of one side, best-ranked first.
    pub fn snapshot(&self, side: Side) -> Vec<Order> {
        let sides = self.sides.read();
        match side {
            Side::Buy => sides.bids.values().cloned().collect(),
            Side::Sell => sides.asks.values().cloned().collect(),
        }
    }

    /// Number of orders resting on one side.
    pub fn len(&self, side: Side) -> usize {
        let sides = self.sides.read();
        match side {
            Side::Buy => sides.bids.len(),
            Side::Sell => sides.asks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        let sides = self.sides.read();
        sides.bids.is_empty() && sides.asks.is_empty()
    }
}
