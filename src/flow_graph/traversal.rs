//! Breadth-first address expansion
//!
//! Starting from an origin address, each wave fetches the addresses queued by
//! the previous one, explores their most recent transactions and queues the
//! destinations for the next wave. The wave count is the caller's depth.

use super::destination::select_destination;
use super::status::{Phase, StatusSink};
use crate::data_source::{AddressRecord, DataSource};
use crate::Result;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Transactions explored per address, taken from the head of its txid list
pub const MAX_TXIDS_PER_ADDRESS: usize = 10;

/// Address records keyed by address, iterated in discovery order.
///
/// Serializes as a JSON object keyed by address; key order is preserved on
/// both serialization and deserialization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexMap {
    order: Vec<String>,
    records: HashMap<String, AddressRecord>,
}

impl VertexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.records.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&AddressRecord> {
        self.records.get(address)
    }

    /// Insert a record under `address`. Returns false, leaving the map
    /// untouched, if the address is already present.
    pub fn insert(&mut self, address: impl Into<String>, record: AddressRecord) -> bool {
        let address = address.into();
        if self.records.contains_key(&address) {
            return false;
        }
        self.order.push(address.clone());
        self.records.insert(address, record);
        true
    }

    /// Addresses in discovery order
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(address, record)` pairs in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AddressRecord)> {
        self.order
            .iter()
            .filter_map(|a| self.records.get(a).map(|r| (a.as_str(), r)))
    }

    /// Total number of explored transactions across all vertices
    pub fn transaction_count(&self) -> usize {
        self.records.values().map(|r| r.transactions.len()).sum()
    }
}

impl Serialize for VertexMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (address, record) in self.iter() {
            map.serialize_entry(address, record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VertexMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct VertexMapVisitor;

        impl<'de> Visitor<'de> for VertexMapVisitor {
            type Value = VertexMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of address to address record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<VertexMap, A::Error> {
                let mut vertices = VertexMap::new();
                while let Some((address, record)) = access.next_entry::<String, AddressRecord>()? {
                    if !vertices.insert(address.clone(), record) {
                        return Err(serde::de::Error::custom(format!(
                            "duplicate address {}",
                            address
                        )));
                    }
                }
                Ok(vertices)
            }
        }

        deserializer.deserialize_map(VertexMapVisitor)
    }
}

/// Per-traversal frontier state
#[derive(Debug)]
struct Frontier {
    visited: VertexMap,
    current_level: Vec<String>,
    next_level: Vec<String>,
}

impl Frontier {
    fn new(origin: &str) -> Self {
        Self {
            visited: VertexMap::new(),
            current_level: vec![origin.to_string()],
            next_level: Vec::new(),
        }
    }

    fn take_current(&mut self) -> Vec<String> {
        std::mem::take(&mut self.current_level)
    }

    fn advance(&mut self) {
        self.current_level = std::mem::take(&mut self.next_level);
    }
}

/// Expand `depth` waves from `origin`.
///
/// Reports `Loading` on entry. Any data source or heuristic failure aborts the
/// whole traversal: the sink gets `Error` plus the message and the error is
/// returned as-is.
pub async fn traverse(
    source: &dyn DataSource,
    origin: &str,
    depth: u32,
    status: &mut dyn StatusSink,
) -> Result<VertexMap> {
    status.report_phase(Phase::Loading);
    tracing::info!("Tracing {} to depth {}", origin, depth);

    match expand(source, origin, depth, status).await {
        Ok(vertices) => {
            tracing::info!(
                "Visited {} addresses, explored {} transactions",
                vertices.len(),
                vertices.transaction_count()
            );
            Ok(vertices)
        }
        Err(e) => {
            status.report_phase(Phase::Error);
            status.report_error(&e.to_string());
            Err(e)
        }
    }
}

async fn expand(
    source: &dyn DataSource,
    origin: &str,
    depth: u32,
    status: &mut dyn StatusSink,
) -> Result<VertexMap> {
    let mut frontier = Frontier::new(origin);

    for level in 0..depth {
        // Remaining waves would have nothing to do
        if frontier.current_level.is_empty() {
            tracing::debug!("Frontier exhausted at level {}", level);
            break;
        }

        let outermost = level + 1 == depth;
        let wave = frontier.take_current();
        tracing::debug!("Level {}: {} queued addresses", level, wave.len());

        for address in wave {
            if frontier.visited.contains(&address) {
                continue;
            }

            status.report_progress(&format!("visiting {}", address));
            let mut record = source.get_address(&address).await?;

            let mut transactions = Vec::new();
            if !outermost {
                for txid in record.txids.iter().take(MAX_TXIDS_PER_ADDRESS) {
                    status.report_progress(&format!("exploring {}", txid));
                    let mut tx = source.get_transaction(txid).await?;
                    let destination = select_destination(&tx)?;
                    tracing::debug!("{} -> {} via {}", address, destination, txid);

                    frontier.next_level.push(destination.clone());
                    tx.destination = Some(destination);
                    transactions.push(tx);
                }
            }
            record.transactions = transactions;

            frontier.visited.insert(address, record);
        }

        frontier.advance();
    }

    Ok(frontier.visited)
}
