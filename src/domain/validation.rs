/// Order Intake Validation
///
/// Validates submission requests against the business rules before an
/// [`Order`] is constructed: ticker format, positive price, minimum
/// quantity, non-empty owner id, and the TTL floor.
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::model::{Order, Side, Ticker, DEFAULT_TTL_SECONDS, MIN_TTL_SECONDS};

/// A submission as received at the boundary, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub side: Side,
    pub ticker: String,
    pub price: Decimal,
    pub quantity: u32,
    pub user_id: String,
    /// Time-to-live override in seconds; defaults to one hour.
    pub ttl_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("ticker must be 1-5 uppercase letters, got {0:?}")]
    InvalidTicker(String),

    #[error("price must be greater than 0")]
    InvalidPrice,

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("user id is required")]
    MissingUserId,

    #[error("ttl must be at least {MIN_TTL_SECONDS} seconds, got {0}")]
    TtlTooShort(u64),
}

/// Validates submission requests and turns them into orders.
#[derive(Debug, Default, Clone)]
pub struct OrderValidator;

impl OrderValidator {
    pub fn new() -> Self {
        OrderValidator
    }

    /// Validates `request` and builds the order it describes.
    pub fn build(&self, request: NewOrderRequest) -> Result<Order, ValidationError> {
        let ticker = Ticker::parse(&request.ticker)
            .map_err(|e| ValidationError::InvalidTicker(e.0))?;

        if request.price <= Decimal::ZERO {
            return Err(ValidationError::InvalidPrice);
        }
        if request.quantity < 1 {
            return Err(ValidationError::InvalidQuantity);
        }
        if request.user_id.trim().is_empty() {
            return Err(ValidationError::MissingUserId);
        }

        let ttl_seconds = request.ttl_seconds.unwrap_or(DEFAULT_TTL_SECONDS);
        if ttl_seconds < MIN_TTL_SECONDS {
            return Err(ValidationError::TtlTooShort(ttl_seconds));
        }

        Ok(Order::with_ttl(
            request.side,
            ticker,
            request.price,
            request.quantity,
            request.user_id,
            Duration::from_secs(ttl_seconds),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> NewOrderRequest {
        NewOrderRequest {
            side: Side::Buy,
            ticker: "AAPL".to_string(),
            price: dec!(150.00),
            quantity: 100,
            user_id: "user-1".to_string(),
            ttl_seconds: None,
        }
    }

    #[test]
    fn test_valid_request_builds_order() {
        let order = OrderValidator::new().build(request()).unwrap();
        assert_eq!(order.ticker.as_str(), "AAPL");
        assert_eq!(order.price, dec!(150.00));
        assert_eq!(
            order.expires_at - order.timestamp,
            DEFAULT_TTL_SECONDS * 1000
        );
    }

    #[test]
    fn test_ttl_override() {
        let mut req = request();
        req.ttl_seconds = Some(120);
        let order = OrderValidator::new().build(req).unwrap();
        assert_eq!(order.expires_at - order.timestamp, 120_000);
    }

    #[test]
    fn test_ttl_below_minimum_is_rejected() {
        let mut req = request();
        req.ttl_seconds = Some(59);
        assert_eq!(
            OrderValidator::new().build(req).unwrap_err(),
            ValidationError::TtlTooShort(59)
        );
    }

    #[test]
    fn test_bad_ticker_is_rejected() {
        let mut req = request();
        req.ticker = "aapl".to_string();
        assert!(matches!(
            OrderValidator::new().build(req).unwrap_err(),
            ValidationError::InvalidTicker(_)
        ));
    }

    #[test]
    fn test_zero_price_is_rejected() {
        let mut req = request();
        req.price = Decimal::ZERO;
        assert_eq!(
            OrderValidator::new().build(req).unwrap_err(),
            ValidationError::InvalidPrice
        );
    }

    #[test]
    fn test_zero_quantity_is_rejected() {
        let mut req = request();
        req.quantity = 0;
        assert_eq!(
            OrderValidator::new().build(req).unwrap_err(),
            ValidationError::InvalidQuantity
        );
    }

    #[test]
    fn test_blank_user_is_rejected() {
        let mut req = request();
        req.user_id = "  ".to_string();
        assert_eq!(
            OrderValidator::new().build(req).unwrap_err(),
            ValidationError::MissingUserId
        );
    }
}
