//! Wallet Flow Visualizer
//!
//! A terminal tool for tracing how funds move out of a wallet address.
//!
//! This library provides functionality for:
//! - Fetching address and transaction data from a Blockbook-compatible API (or fixtures)
//! - Picking the most plausible destination of each transaction
//! - Expanding a bounded number of breadth-first waves from an origin address
//! - Folding the result into an address graph with merged, direction-aware edges
//! - Rendering the graph as a table, JSON or DOT, and exporting the raw trace

pub mod cli;
pub mod config;
pub mod data_source;
pub mod error;
pub mod flow_graph;

pub use config::Config;
pub use error::{Error, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
///
/// Logs go to stderr so JSON and DOT output on stdout stay machine-readable.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "wallet-flow-viz");
    }
}
