// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Carving batches out of the transfer list.

use alloy::primitives::Address;

use crate::blockchain::MultiSendCall;
use crate::models::TransferRecord;

/// Contiguous slice of the transfer list sent as one multi-send call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch<'a> {
    /// Index of the first record in the full list
    pub start: usize,
    pub records: &'a [TransferRecord],
}

impl<'a> Batch<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// An empty batch means the run is complete.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Index one past the last record.
    pub fn end(&self) -> usize {
        self.start + self.records.len()
    }

    /// Call arguments for this batch, amounts already in base units.
    pub fn to_call(&self, token: Address) -> MultiSendCall {
        MultiSendCall {
            token,
            recipients: self.records.iter().map(|r| r.recipient).collect(),
            amounts: self.records.iter().map(|r| r.base_units).collect(),
        }
    }
}

/// Slice `[cursor, cursor + size)` of `transfers`, clipped to its length.
///
/// Returns an empty batch once `cursor` is at or past the end.
pub fn next_batch(transfers: &[TransferRecord], cursor: usize, size: usize) -> Batch<'_> {
    let start = cursor.min(transfers.len());
    let end = start.saturating_add(size).min(transfers.len());
    Batch {
        start,
        records: &transfers[start..end],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    fn transfers(n: usize) -> Vec<TransferRecord> {
        (0..n)
            .map(|i| TransferRecord {
                recipient: Address::with_last_byte((i % 256) as u8),
                amount: i.to_string(),
                base_units: U256::from(i),
            })
            .collect()
    }

    #[test]
    fn full_and_clipped_batches() {
        let list = transfers(3200);

        let first = next_batch(&list, 0, 1500);
        assert_eq!((first.start, first.len()), (0, 1500));

        let last = next_batch(&list, 3000, 1500);
        assert_eq!((last.start, last.len(), last.end()), (3000, 200, 3200));
    }

    #[test]
    fn empty_at_or_past_end() {
        let list = transfers(10);
        assert!(next_batch(&list, 10, 5).is_empty());
        assert!(next_batch(&list, 42, 5).is_empty());
        assert!(next_batch(&[], 0, 5).is_empty());
    }

    #[test]
    fn same_inputs_same_batch() {
        let list = transfers(100);
        assert_eq!(next_batch(&list, 37, 20), next_batch(&list, 37, 20));
    }

    #[test]
    fn huge_size_does_not_overflow() {
        let list = transfers(5);
        assert_eq!(next_batch(&list, 2, usize::MAX).len(), 3);
    }

    #[test]
    fn call_preserves_order() {
        let list = transfers(4);
        let call = next_batch(&list, 1, 2).to_call(Address::ZERO);
        assert_eq!(call.recipients, vec![list[1].recipient, list[2].recipient]);
        assert_eq!(call.amounts, vec![U256::from(1u64), U256::from(2u64)]);
    }
}
