// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Run-level errors.
//!
//! Every variant here is fatal: the driver stops and the binary exits
//! non-zero. Submission failures are not listed because the controller
//! absorbs them by shrinking the batch.

use crate::blockchain::ChainError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transfer list could not be read or is malformed.
    #[error("Transfer source unavailable: {0}")]
    SourceUnavailable(String),

    /// Gas estimation failed for a batch; the run halts.
    #[error("Gas estimation failed for batch {batch_number} (start {start_index}, size {batch_size}): {reason}")]
    EstimationFailed {
        batch_number: u64,
        start_index: usize,
        batch_size: usize,
        reason: String,
    },

    /// Halving the batch size after a failed submission went below the floor.
    #[error("Batch size exhausted: halved to {attempted}, below the floor of {floor}")]
    BatchSizeExhausted { attempted: usize, floor: usize },

    /// An audit log or checkpoint write failed.
    #[error("Audit write failed: {0}")]
    AuditWriteFailed(#[source] StorageError),

    /// The stored checkpoint does not belong to the loaded transfer list.
    #[error("Checkpoint mismatch: {0}")]
    CheckpointMismatch(String),

    /// Chain setup failed before the run started.
    #[error(transparent)]
    Chain(#[from] ChainError),
}

pub type DistributionResult<T> = Result<T, DistributionError>;
