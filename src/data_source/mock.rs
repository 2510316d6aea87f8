//! Mock data source for testing and offline runs
//!
//! Serves address and transaction documents from memory, optionally loaded from
//! a JSON fixture file shaped as
//! `{"addresses": {addr: {...}}, "transactions": {txid: {...}}}`.
//! Every lookup is counted so tests can assert how often the provider was hit.

use super::{AddressRecord, DataSource, TransactionRecord};
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Fixture document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub addresses: HashMap<String, AddressRecord>,

    #[serde(default)]
    pub transactions: HashMap<String, TransactionRecord>,
}

/// Failure to inject for a given id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    InvalidAddress,
    InvalidCredential,
    Status(u16),
    Malformed,
}

impl MockFailure {
    fn to_error(self, id: &str) -> Error {
        match self {
            MockFailure::InvalidAddress => Error::InvalidAddress(id.to_string()),
            MockFailure::InvalidCredential => Error::InvalidCredential,
            MockFailure::Status(code) => Error::provider(Some(code), format!("mock failure for {}", id)),
            MockFailure::Malformed => Error::malformed(format!("mock body for {}", id)),
        }
    }
}

/// Mock data source providing fixture data
#[derive(Debug, Default)]
pub struct MockDataSource {
    fixtures: Fixtures,
    failures: HashMap<String, MockFailure>,
    calls: Mutex<Vec<String>>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            fixtures,
            ..Default::default()
        }
    }

    /// Load fixtures from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read fixture file {:?}: {}", path, e)))?;
        let fixtures: Fixtures = serde_json::from_str(&contents)
            .map_err(|e| Error::parser(format!("Failed to parse fixture file {:?}: {}", path, e)))?;

        tracing::info!(
            "Loaded {} addresses and {} transactions from {:?}",
            fixtures.addresses.len(),
            fixtures.transactions.len(),
            path
        );
        Ok(Self::from_fixtures(fixtures))
    }

    pub fn with_address(mut self, record: AddressRecord) -> Self {
        self.fixtures
            .addresses
            .insert(record.address.clone(), record);
        self
    }

    pub fn with_transaction(mut self, tx: TransactionRecord) -> Self {
        self.fixtures.transactions.insert(tx.txid.clone(), tx);
        self
    }

    /// Make lookups of `id` (address or txid) fail
    pub fn with_failure(mut self, id: impl Into<String>, failure: MockFailure) -> Self {
        self.failures.insert(id.into(), failure);
        self
    }

    /// Every lookup made so far, prefixed with `address:` or `tx:`
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of lookups made for one address
    pub fn address_calls(&self, address: &str) -> usize {
        let key = format!("address:{}", address);
        self.calls().iter().filter(|c| **c == key).count()
    }

    fn record_call(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn get_address(&self, address: &str) -> Result<AddressRecord> {
        self.record_call(format!("address:{}", address));

        if let Some(failure) = self.failures.get(address) {
            return Err(failure.to_error(address));
        }

        self.fixtures
            .addresses
            .get(address)
            .cloned()
            .ok_or_else(|| Error::InvalidAddress(address.to_string()))
    }

    async fn get_transaction(&self, txid: &str) -> Result<TransactionRecord> {
        self.record_call(format!("tx:{}", txid));

        if let Some(failure) = self.failures.get(txid) {
            return Err(failure.to_error(txid));
        }

        self.fixtures
            .transactions
            .get(txid)
            .cloned()
            .ok_or_else(|| Error::provider(Some(404), format!("transaction {} not found", txid)))
    }
}
