mod book_service;
mod matching_service;

pub use book_service::OrderBookService;
pub use matching_service::{MatchingService, SubmitError};
