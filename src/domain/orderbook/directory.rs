/// BookDirectory - Ticker to Order Book Mapping
///
/// One long-lived directory instance owns every [`TickerBook`]. Books are
/// created lazily on first reference and never removed, so the map is
/// bounded by the number of distinct tickers ever traded.
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::TickerBook;
use crate::domain::model::Ticker;

#[derive(Default)]
pub struct BookDirectory {
    books: DashMap<Ticker, Arc<TickerBook>>,
}

impl BookDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the book for `ticker`, creating it atomically if absent.
    ///
    /// Concurrent first-access for the same ticker yields the same book
    /// instance to every caller; the map's create-if-absent primitive is the
    /// only locking involved.
    pub fn get_or_create(&self, ticker: &Ticker) -> Arc<TickerBook> {
        self.books
            .entry(ticker.clone())
            .or_insert_with(|| {
                debug!(%ticker, "creating order book");
                Arc::new(TickerBook::new(ticker.clone()))
            })
            .clone()
    }

    /// Returns the book for `ticker` if one has ever been created.
    pub fn get(&self, ticker: &Ticker) -> Option<Arc<TickerBook>> {
        self.books.get(ticker).map(|entry| entry.clone())
    }

    /// Every ticker that has a book, in no particular order.
    pub fn tickers(&self) -> Vec<Ticker> {
        self.books.iter().map(|entry| entry.key().clone()).collect()
    }
}
