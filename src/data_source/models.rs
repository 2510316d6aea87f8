//! Core data models for provider responses
//!
//! This module defines the typed shapes of the address and transaction
//! documents returned by the indexing service, plus the annotations the
//! traversal attaches to them. Fields the core does not interpret are kept in
//! `extra` so exports carry the provider's data through unchanged.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Amount in the smallest currency unit.
///
/// Block explorers disagree on whether amounts are JSON strings or numbers,
/// so both are accepted on input. Always serialized as a string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(pub u64);

impl Amount {
    pub fn abs_diff(self, other: Amount) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Amount(n)),
            Raw::Text(s) => s
                .trim()
                .parse::<u64>()
                .map(Amount)
                .map_err(|e| serde::de::Error::custom(format!("invalid amount {:?}: {}", s, e))),
        }
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Amount(value)
    }
}

/// Wallet address document (`GET /address/{address}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRecord {
    /// Address identifier
    pub address: String,

    /// Confirmed balance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<Amount>,

    /// Number of transactions the provider knows about
    #[serde(default)]
    pub txs: u64,

    /// Transaction ids, provider order
    #[serde(default)]
    pub txids: Vec<String>,

    /// Transactions explored from this address (engine annotation)
    #[serde(default)]
    pub transactions: Vec<TransactionRecord>,

    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl AddressRecord {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            balance: None,
            txs: 0,
            txids: Vec::new(),
            transactions: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn with_txids<I, S>(mut self, txids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.txids = txids.into_iter().map(Into::into).collect();
        self.txs = self.txids.len() as u64;
        self
    }
}

/// Transaction document (`GET /tx/{txid}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Transaction id
    pub txid: String,

    /// Total input value
    pub value: Amount,

    /// Outputs, in transaction order
    pub vout: Vec<TxOutput>,

    /// Address chosen by the destination heuristic (engine annotation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TransactionRecord {
    pub fn new(txid: impl Into<String>, value: u64, vout: Vec<TxOutput>) -> Self {
        Self {
            txid: txid.into(),
            value: Amount(value),
            vout,
            destination: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    /// Output value
    pub value: Amount,

    /// Receiving addresses; empty for non-standard scripts, several for bare multisig
    #[serde(default)]
    pub addresses: Vec<String>,

    /// Remaining provider fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TxOutput {
    pub fn new(value: u64, addresses: &[&str]) -> Self {
        Self {
            value: Amount(value),
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_accepts_string_and_number() {
        let a: Amount = serde_json::from_str("\"12345\"").unwrap();
        let b: Amount = serde_json::from_str("12345").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"12345\"");
    }

    #[test]
    fn test_amount_rejects_garbage() {
        assert!(serde_json::from_str::<Amount>("\"12.5 BTC\"").is_err());
        assert!(serde_json::from_str::<Amount>("-3").is_err());
    }

    #[test]
    fn test_address_record_from_provider_body() {
        let body = r#"{
            "page": 1,
            "totalPages": 1,
            "itemsOnPage": 1000,
            "address": "bc1qxyz",
            "balance": "5000",
            "totalReceived": "15000",
            "totalSent": "10000",
            "unconfirmedBalance": "0",
            "unconfirmedTxs": 0,
            "txs": 2,
            "txids": ["t2", "t1"]
        }"#;

        let record: AddressRecord = serde_json::from_str(body).unwrap();
        assert_eq!(record.address, "bc1qxyz");
        assert_eq!(record.balance, Some(Amount(5000)));
        assert_eq!(record.txs, 2);
        assert_eq!(record.txids, vec!["t2", "t1"]);
        assert!(record.transactions.is_empty());
        assert_eq!(record.extra["totalReceived"], "15000");
    }

    #[test]
    fn test_address_without_history() {
        let record: AddressRecord =
            serde_json::from_str(r#"{"address": "bc1qempty", "txs": 0}"#).unwrap();
        assert!(record.txids.is_empty());
    }

    #[test]
    fn test_transaction_record_keeps_unknown_fields() {
        let body = r#"{
            "txid": "abc",
            "blockHeight": 800000,
            "value": "100",
            "vout": [
                {"value": "70", "n": 0, "addresses": ["bc1qa"], "isAddress": true},
                {"value": "30", "n": 1, "isAddress": false}
            ]
        }"#;

        let tx: TransactionRecord = serde_json::from_str(body).unwrap();
        assert_eq!(tx.value, Amount(100));
        assert_eq!(tx.vout.len(), 2);
        assert!(tx.vout[1].addresses.is_empty());
        assert_eq!(tx.extra["blockHeight"], 800000);
        assert!(tx.destination.is_none());

        let json = serde_json::to_value(tx.with_destination("bc1qa")).unwrap();
        assert_eq!(json["destination"], "bc1qa");
        assert_eq!(json["blockHeight"], 800000);
        assert_eq!(json["vout"][0]["n"], 0);
    }
}
