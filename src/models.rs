// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Distribution data model: transfer records, run state and attempt outcomes.

use alloy::primitives::{Address, U256};

/// One recipient/amount pair from the input list.
///
/// Immutable once loaded. Duplicated recipients are sent independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    /// Recipient address
    pub recipient: Address,
    /// Amount exactly as it appeared in the input list
    pub amount: String,
    /// Amount scaled to the token's smallest unit
    pub base_units: U256,
}

/// Mutable state of a run, owned by the driver.
///
/// `cursor` only moves forward and `current_batch_size` only moves down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunState {
    /// Index of the first transfer not yet sent
    pub cursor: usize,
    /// Size used to carve the next batch
    pub current_batch_size: usize,
    /// Number of attempts made so far (also the last batch number)
    pub batch_count: u64,
}

impl RunState {
    /// Fresh state at cursor zero.
    pub fn new(initial_batch_size: usize) -> Self {
        Self {
            cursor: 0,
            current_batch_size: initial_batch_size,
            batch_count: 0,
        }
    }
}

/// Result category of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    Success,
    GasEstimationFailed,
    SubmissionFailed,
}

/// Everything known about one attempt, produced once and then persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    /// 1-based attempt number within the run
    pub batch_number: u64,
    /// Cursor the batch was carved from
    pub start_index: usize,
    /// Number of transfers in the batch
    pub batch_size: usize,
    /// Gas estimate, absent when estimation failed
    pub estimated_gas: Option<u64>,
    /// Gas used according to the receipt
    pub actual_gas: Option<u64>,
    /// Hash of the broadcast transaction, if it got that far
    pub tx_hash: Option<String>,
    pub status: AttemptStatus,
    /// Error detail for failed attempts
    pub error: Option<String>,
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Success
    }

    /// Outcome text used in the batch log.
    pub fn outcome_text(&self) -> String {
        let detail = self.error.as_deref().unwrap_or("unknown error");
        match self.status {
            AttemptStatus::Success => "Success".to_string(),
            AttemptStatus::GasEstimationFailed => format!("Gas estimation failed: {detail}"),
            AttemptStatus::SubmissionFailed => format!("Transaction failed: {detail}"),
        }
    }
}

/// How a run ended without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The cursor reached the end of the list
    Completed,
    /// A stop signal was observed between attempts
    Stopped,
}

/// Summary returned by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub status: RunStatus,
    pub cursor: usize,
    pub total_records: usize,
    pub attempts: u64,
    pub succeeded_batches: u64,
    pub failed_attempts: u64,
    pub final_batch_size: usize,
    pub total_gas_used: u64,
}
