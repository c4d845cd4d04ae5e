// Global allocator: jemalloc holds up better than the system allocator under
// concurrent submission bursts.
#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use application::services::{MatchingService, OrderBookService, SubmitError};
pub use domain::model::{Order, OrderId, Side, Ticker, Trade, TradeId};
pub use domain::orderbook::{BookDirectory, TickerBook};
pub use domain::store::{OrderStore, StoreError, TradeSink};
pub use domain::validation::{NewOrderRequest, OrderValidator, ValidationError};
