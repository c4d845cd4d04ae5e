/// Order - Trading Intent Entity
///
/// An order records the intent to buy or sell a quantity of one ticker at a
/// limit price. Apart from the `active` flag and the optimistic-concurrency
/// `version` counter, an order never changes after creation; fills and
/// cancellations are expressed by deactivating the record, never by deleting
/// it from the backing store.
use std::fmt;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::shared::time::current_time_millis;

/// Default time-to-live for a new order when the submission does not override it.
pub const DEFAULT_TTL_SECONDS: u64 = 3600;

/// Minimum TTL a submission may request.
pub const MIN_TTL_SECONDS: u64 = 60;

/// Which side of the book an order belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an order of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Opaque unique order identifier. Assigned at creation, never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    pub fn new() -> Self {
        OrderId(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Error raised when a ticker symbol fails the `[A-Z]{1,5}` format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ticker must be 1-5 uppercase letters, got {0:?}")]
pub struct TickerError(pub String);

/// Validated stock symbol: 1-5 uppercase ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(symbol: &str) -> Result<Self, TickerError> {
        let valid = (1..=5).contains(&symbol.len())
            && symbol.bytes().all(|b| b.is_ascii_uppercase());
        if valid {
            Ok(Ticker(symbol.to_string()))
        } else {
            Err(TickerError(symbol.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Ticker {
    type Error = TickerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(ticker: Ticker) -> Self {
        ticker.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A limit order resting in, or on its way to, the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub ticker: Ticker,
    pub price: Decimal,
    pub quantity: u32,
    pub user_id: String,
    /// Submission time, milliseconds since the UNIX epoch. Drives time priority.
    pub timestamp: u64,
    /// Expiration time, milliseconds since the UNIX epoch. Strictly after `timestamp`.
    pub expires_at: u64,
    pub active: bool,
    /// Optimistic-concurrency counter, bumped by the store on every update.
    pub version: u64,
}

impl Order {
    /// Creates an active order with the default TTL.
    pub fn new(side: Side, ticker: Ticker, price: Decimal, quantity: u32, user_id: String) -> Self {
        Self::with_ttl(
            side,
            ticker,
            price,
            quantity,
            user_id,
            Duration::from_secs(DEFAULT_TTL_SECONDS),
        )
    }

    /// Creates an active order expiring `ttl` after its submission timestamp.
    ///
    /// The intake validator enforces the 60-second minimum; this constructor
    /// does not, so tests can build orders that expire quickly.
    pub fn with_ttl(
        side: Side,
        ticker: Ticker,
        price: Decimal,
        quantity: u32,
        user_id: String,
        ttl: Duration,
    ) -> Self {
        let timestamp = current_time_millis();
        Order {
            id: OrderId::new(),
            side,
            ticker,
            price,
            quantity,
            user_id,
            timestamp,
            expires_at: timestamp + ttl.as_millis() as u64,
            active: true,
            version: 0,
        }
    }

    pub fn is_expired(&self) -> bool {
        current_time_millis() >= self.expires_at
    }

    /// The predicate gating every read and mutation path: an order may only
    /// participate in matching while it is active and unexpired.
    pub fn is_valid_for_matching(&self) -> bool {
        self.active && !self.is_expired()
    }

    /// Clones the order as a fresh active record with a new id and a reset
    /// version, keeping the original timestamp. Used when a claimed order
    /// has to re-enter the submission queue.
    pub fn reissued(&self) -> Order {
        Order {
            id: OrderId::new(),
            active: true,
            version: 0,
            ..self.clone()
        }
    }

    /// Builds the resting remainder of a partially matched order.
    ///
    /// The remainder gets a fresh id and version but keeps the original
    /// submission timestamp, so splitting does not cost the order its place
    /// in the time-priority queue.
    pub fn split_remaining(&self, remaining: u32) -> Order {
        debug_assert!(remaining > 0 && remaining < self.quantity);
        Order {
            id: OrderId::new(),
            quantity: remaining,
            active: true,
            version: 0,
            ..self.clone()
        }
    }
}
