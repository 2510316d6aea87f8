//! Destination heuristic
//!
//! A transaction's destination is taken to be the output whose value is closest
//! to the total input value: change outputs tend to be small, so the payment
//! is usually the output that absorbs most of the input.

use crate::data_source::TransactionRecord;
use crate::{Error, Result};

/// Pick the most plausible receiving address of `tx`.
///
/// Outputs without an address are never candidates. Ties keep the earliest
/// output. For multi-address outputs the first listed address is returned.
pub fn select_destination(tx: &TransactionRecord) -> Result<String> {
    let mut best: Option<(u64, &str)> = None;

    for output in &tx.vout {
        let Some(address) = output.addresses.first() else {
            continue;
        };
        let diff = tx.value.abs_diff(output.value);
        if best.is_none_or(|(min, _)| diff < min) {
            best = Some((diff, address));
        }
    }

    best.map(|(_, address)| address.to_string())
        .ok_or_else(|| Error::NoOutputs(tx.txid.clone()))
}
