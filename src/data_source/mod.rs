//! Data source module - Abstraction for fetching address and transaction data
//!
//! This module provides a trait-based abstraction over the indexing service the
//! traversal queries (Blockbook-compatible HTTP API, in-memory fixtures).

use crate::{Config, Result};
use async_trait::async_trait;

pub mod blockbook;
pub mod mock;
pub mod models;

// Re-export models
use crate::cli::DataSourceType;
pub use models::{AddressRecord, Amount, TransactionRecord, TxOutput};

/// Data source trait for fetching wallet data
///
/// Implementations provide different backends:
/// - `BlockbookDataSource`: Blockbook-compatible REST API
/// - `MockDataSource`: Fixture data for tests and offline runs
///
/// Every call is a fresh lookup; implementations do not retry or cache.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the address document, including its transaction ids
    async fn get_address(&self, address: &str) -> Result<AddressRecord>;

    /// Fetch a single transaction by id
    async fn get_transaction(&self, txid: &str) -> Result<TransactionRecord>;
}

/// Create a data source instance based on type and configuration
pub fn create_data_source(
    source_type: DataSourceType,
    config: &Config,
    api_key: Option<String>,
) -> Result<Box<dyn DataSource>> {
    match source_type {
        DataSourceType::Mock => {
            let path = config.mock_fixture_path()?;
            Ok(Box::new(mock::MockDataSource::from_file(path)?))
        }
        DataSourceType::Blockbook => {
            let api_key = match api_key {
                Some(key) => key,
                None => config.provider_api_key()?,
            };
            let ds = blockbook::BlockbookDataSource::new(&config.provider.base_url, api_key)?
                .with_api_key_header(&config.provider.api_key_header)
                .with_timeout(config.provider.timeout());
            Ok(Box::new(ds))
        }
    }
}
