/// CLI Interface Module
///
/// Entry point for running the exchange as a standalone simulation.
///
/// ## Responsibilities
/// - Parse command-line arguments
/// - Initialize logging
/// - Wire the in-memory store, services and matching workers
/// - Drive the random order generator and report a run summary
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::application::services::{MatchingService, OrderBookService};
use crate::domain::model::Side;
use crate::domain::validation::OrderValidator;
use crate::infrastructure::generator::RandomOrderGenerator;
use crate::infrastructure::memory::{InMemoryOrderStore, InMemoryTradeLog};

/// Stock exchange simulation configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "stock-exchange")]
#[command(version = "0.1.0")]
#[command(about = "Order book and matching engine simulation", long_about = None)]
pub struct CliConfig {
    /// Number of matching workers (0 = number of CPU cores)
    #[arg(short, long, default_value_t = 0)]
    pub workers: usize,

    /// Number of random orders to submit
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub orders: u64,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = ["trace", "debug", "info", "warn", "error"])]
    pub log_level: String,

    /// Print the effective configuration and exit
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl CliConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

/// Runs the CLI application: parses arguments, spawns the matching workers
/// and drives the simulation to completion.
pub async fn run() {
    let config = CliConfig::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config.dry_run {
        info!(
            "dry run: {} workers, {} orders",
            config.effective_workers(),
            config.orders
        );
        return;
    }

    let store = Arc::new(InMemoryOrderStore::new());
    let trade_log = Arc::new(InMemoryTradeLog::new());
    let books = Arc::new(OrderBookService::new(store));
    let service = Arc::new(MatchingService::new(
        Arc::clone(&books),
        trade_log.clone(),
    ));

    let workers = config.effective_workers();
    info!("starting matching engine with {} workers", workers);
    let handles = service.spawn_workers(workers);

    let generator = RandomOrderGenerator::new();
    let validator = OrderValidator::new();
    let mut submitted = 0u64;
    for _ in 0..config.orders {
        let order = match validator.build(generator.generate()) {
            Ok(order) => order,
            Err(e) => {
                warn!("generator produced invalid order: {}", e);
                continue;
            }
        };
        match service.submit(order).await {
            Ok(()) => submitted += 1,
            Err(e) => error!("submission failed: {}", e),
        }
    }

    // Give the workers a moment to drain requeued remainders, then stop.
    tokio::time::sleep(Duration::from_millis(500)).await;
    service.shutdown();
    for handle in handles {
        if let Err(e) = handle.await {
            error!("worker task failed: {}", e);
        }
    }

    let mut tickers: Vec<_> = books.tickers();
    tickers.sort();
    let per_ticker: Vec<_> = tickers
        .iter()
        .map(|ticker| {
            json!({
                "ticker": ticker.as_str(),
                "trades": trade_log.for_ticker(ticker).len(),
                "resting_bids": books.depth(ticker, Side::Buy),
                "resting_asks": books.depth(ticker, Side::Sell),
            })
        })
        .collect();
    let summary = json!({
        "orders_submitted": submitted,
        "trades_executed": trade_log.len(),
        "tickers": per_ticker,
    });
    info!("simulation finished: {}", summary);
}
