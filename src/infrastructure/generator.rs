/// Random Order Generator - Simulation Traffic
///
/// Produces plausible submission requests for demo runs: random side, one of
/// a handful of tickers, a price around 100.00, and a small quantity.
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::model::Side;
use crate::domain::validation::NewOrderRequest;

const SAMPLE_TICKERS: [&str; 4] = ["AAPL", "GOOGL", "MSFT", "AMZN"];

/// Base price in cents; generated prices land in [100.00, 110.00).
const BASE_PRICE_CENTS: i64 = 10_000;
const PRICE_SPREAD_CENTS: i64 = 1_000;

#[derive(Debug, Default, Clone)]
pub struct RandomOrderGenerator;

impl RandomOrderGenerator {
    pub fn new() -> Self {
        RandomOrderGenerator
    }

    pub fn generate(&self) -> NewOrderRequest {
        let mut rng = rand::thread_rng();
        let side = if rng.gen_bool(0.5) {
            Side::Buy
        } else {
            Side::Sell
        };
        let ticker = SAMPLE_TICKERS[rng.gen_range(0..SAMPLE_TICKERS.len())];
        let price = Decimal::new(
            BASE_PRICE_CENTS + rng.gen_range(0..PRICE_SPREAD_CENTS),
            2,
        );
        let user_id = format!("user-{}", &Uuid::new_v4().simple().to_string()[..8]);

        NewOrderRequest {
            side,
            ticker: ticker.to_string(),
            price,
            quantity: rng.gen_range(1..=100),
            user_id,
            ttl_seconds: None,
        }
    }
}
