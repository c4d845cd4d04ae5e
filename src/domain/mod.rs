pub mod model;
pub mod orderbook;
pub mod store;
pub mod validation;
