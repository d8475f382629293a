// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Adaptive Batch Controller
//!
//! Runs one attempt per batch through
//! `Idle → Estimating → Submitting → Confirming → {Succeeded | Failed}` and
//! decides what the run does next.
//!
//! ## Failure policy
//!
//! - A failed gas estimate halts the whole run. The batch is not shrunk.
//! - A failed submission (rejected, reverted, or not confirmed within the
//!   confirmation timeout) halves the batch size and the same cursor is
//!   re-sliced at the smaller size. Once halving would go below the floor
//!   the run halts.
//! - The batch size is never raised again within a run.

use std::fmt;
use std::time::Duration;

use alloy::primitives::Address;

use crate::batcher::Batch;
use crate::blockchain::{FeeSettings, MultiSendChain};
use crate::error::{DistributionError, DistributionResult};
use crate::models::{AttemptStatus, RunState, SubmissionOutcome};

/// Default time to wait for a receipt before treating the attempt as failed.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Default minimum batch size.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 10;

/// Phases of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPhase {
    Idle,
    Estimating,
    Submitting,
    Confirming,
    Succeeded,
    Failed,
}

impl fmt::Display for AttemptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Estimating => "estimating",
            Self::Submitting => "submitting",
            Self::Confirming => "confirming",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the driver does after an attempt that did not halt the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The batch was sent; continue from `cursor`.
    Advance { cursor: usize },
    /// The batch failed; re-slice the same cursor at `batch_size`.
    Retry { cursor: usize, batch_size: usize },
}

/// Fixed per-run submission settings.
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Token being distributed
    pub token: Address,
    /// EIP-1559 fees for every submission
    pub fees: FeeSettings,
    /// Extra percentage added on top of the estimate for the gas limit
    pub gas_limit_buffer_percent: u64,
    /// Maximum wait for a receipt
    pub confirmation_timeout: Duration,
    /// Floor below which the run halts
    pub min_batch_size: usize,
}

impl ControllerSettings {
    pub fn new(token: Address) -> Self {
        Self {
            token,
            fees: FeeSettings::DEFAULT,
            gas_limit_buffer_percent: 0,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
        }
    }
}

/// Drives attempts against a [`MultiSendChain`].
pub struct BatchController<C> {
    chain: C,
    settings: ControllerSettings,
}

impl<C: MultiSendChain> BatchController<C> {
    pub fn new(chain: C, settings: ControllerSettings) -> Self {
        Self { chain, settings }
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    /// Gas limit for a given estimate.
    pub fn gas_limit(&self, estimated: u64) -> u64 {
        let buffer = estimated.saturating_mul(self.settings.gas_limit_buffer_percent) / 100;
        estimated.saturating_add(buffer)
    }

    /// Run one attempt for a non-empty batch.
    ///
    /// Never returns an error: every failure is folded into the outcome so
    /// it can be audited before the run reacts to it.
    pub async fn attempt(&self, batch: &Batch<'_>, batch_number: u64) -> SubmissionOutcome {
        let mut outcome = SubmissionOutcome {
            batch_number,
            start_index: batch.start,
            batch_size: batch.len(),
            estimated_gas: None,
            actual_gas: None,
            tx_hash: None,
            status: AttemptStatus::Success,
            error: None,
        };

        // The estimate and the submission use this exact call.
        let call = batch.to_call(self.settings.token);
        let mut phase = self.enter(AttemptPhase::Idle, AttemptPhase::Estimating, &outcome);

        let estimated = match self.chain.estimate_gas(&call).await {
            Ok(gas) => gas,
            Err(e) => {
                self.enter(phase, AttemptPhase::Failed, &outcome);
                outcome.status = AttemptStatus::GasEstimationFailed;
                outcome.error = Some(e.to_string());
                return outcome;
            }
        };
        outcome.estimated_gas = Some(estimated);
        tracing::info!(
            batch_number,
            start_index = batch.start,
            batch_size = batch.len(),
            estimated_gas = estimated,
            "Gas estimated"
        );

        phase = self.enter(phase, AttemptPhase::Submitting, &outcome);
        let gas_limit = self.gas_limit(estimated);
        let tx_hash = match self
            .chain
            .send_transaction(&call, gas_limit, self.settings.fees)
            .await
        {
            Ok(hash) => hash,
            Err(e) => return self.fail(phase, outcome, e.to_string()),
        };
        tracing::info!(batch_number, tx_hash = %tx_hash, gas_limit, "Batch broadcast");
        outcome.tx_hash = Some(tx_hash.clone());

        phase = self.enter(phase, AttemptPhase::Confirming, &outcome);
        let confirmation = tokio::time::timeout(
            self.settings.confirmation_timeout,
            self.chain.wait_for_confirmation(&tx_hash),
        )
        .await;

        match confirmation {
            Err(_) => {
                let timeout = self.settings.confirmation_timeout.as_secs_f64();
                self.fail(phase, outcome, format!("not confirmed within {timeout}s"))
            }
            Ok(Err(e)) => self.fail(phase, outcome, e.to_string()),
            Ok(Ok(receipt)) => {
                outcome.actual_gas = Some(receipt.gas_used);
                if !receipt.success {
                    let detail = format!("reverted in block {}", receipt.block_number);
                    return self.fail(phase, outcome, detail);
                }
                self.enter(phase, AttemptPhase::Succeeded, &outcome);
                outcome
            }
        }
    }

    /// Apply an attempt's outcome to the run state.
    ///
    /// Returns an error when the run must halt.
    pub fn settle(
        &self,
        state: &mut RunState,
        outcome: &SubmissionOutcome,
    ) -> DistributionResult<Transition> {
        match outcome.status {
            AttemptStatus::Success => {
                state.cursor += outcome.batch_size;
                Ok(Transition::Advance {
                    cursor: state.cursor,
                })
            }
            AttemptStatus::GasEstimationFailed => Err(DistributionError::EstimationFailed {
                batch_number: outcome.batch_number,
                start_index: outcome.start_index,
                batch_size: outcome.batch_size,
                reason: outcome.error.clone().unwrap_or_default(),
            }),
            AttemptStatus::SubmissionFailed => {
                let halved = state.current_batch_size / 2;
                if halved < self.settings.min_batch_size {
                    return Err(DistributionError::BatchSizeExhausted {
                        attempted: halved,
                        floor: self.settings.min_batch_size,
                    });
                }
                state.current_batch_size = halved;
                Ok(Transition::Retry {
                    cursor: state.cursor,
                    batch_size: halved,
                })
            }
        }
    }

    fn enter(
        &self,
        from: AttemptPhase,
        to: AttemptPhase,
        outcome: &SubmissionOutcome,
    ) -> AttemptPhase {
        tracing::debug!(
            batch_number = outcome.batch_number,
            from = %from,
            to = %to,
            "Attempt phase transition"
        );
        to
    }

    fn fail(
        &self,
        phase: AttemptPhase,
        mut outcome: SubmissionOutcome,
        detail: String,
    ) -> SubmissionOutcome {
        self.enter(phase, AttemptPhase::Failed, &outcome);
        tracing::warn!(
            batch_number = outcome.batch_number,
            start_index = outcome.start_index,
            batch_size = outcome.batch_size,
            phase = %phase,
            error = %detail,
            "Batch submission failed"
        );
        outcome.status = AttemptStatus::SubmissionFailed;
        outcome.error = Some(detail);
        outcome
    }
}
