mod order;
mod trade;

pub use order::{Order, OrderId, Side, Ticker, TickerError, DEFAULT_TTL_SECONDS, MIN_TTL_SECONDS};
pub use trade::{Trade, TradeId};
