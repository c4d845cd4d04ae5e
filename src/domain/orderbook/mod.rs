mod book;
mod directory;

pub use book::TickerBook;
pub use directory::BookDirectory;
