/// Main entry point for the stock exchange simulation
///
/// This serves as a thin wrapper that delegates to the interfaces layer.
/// The actual application logic is implemented in `interfaces::cli`.
use stock_exchange::interfaces::cli;

#[tokio::main]
async fn main() {
    cli::run().await;
}
