// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Run Driver
//!
//! Orchestrates a distribution run:
//!
//! 1. carve the next batch at the current cursor and size;
//! 2. let the controller estimate, submit and confirm it;
//! 3. write the audit rows for the attempt and flush them;
//! 4. advance the cursor, retry smaller, or halt.
//!
//! Attempts are strictly sequential. The stop signal is only checked between
//! attempts, so a confirmation in progress is always awaited and audited.

use std::future::Future;
use std::io;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::batcher::{next_batch, Batch};
use crate::blockchain::MultiSendChain;
use crate::controller::{BatchController, Transition};
use crate::error::{DistributionError, DistributionResult};
use crate::models::{RunReport, RunState, RunStatus, SubmissionOutcome, TransferRecord};
use crate::storage::{AuditSink, Checkpoint, CheckpointStore};

/// Distribution run over one transfer list.
pub struct Distributor<C, A> {
    controller: BatchController<C>,
    audit: A,
    checkpoint: Option<(CheckpointStore, String)>,
    run_id: Uuid,
}

#[derive(Default)]
struct Tally {
    attempts: u64,
    succeeded: u64,
    failed: u64,
    gas_used: u64,
}

impl<C: MultiSendChain, A: AuditSink> Distributor<C, A> {
    pub fn new(controller: BatchController<C>, audit: A) -> Self {
        Self {
            controller,
            audit,
            checkpoint: None,
            run_id: Uuid::new_v4(),
        }
    }

    /// Persist progress under `run_key` after every attempt.
    pub fn with_checkpoint(mut self, store: CheckpointStore, run_key: impl Into<String>) -> Self {
        self.checkpoint = Some((store, run_key.into()));
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    /// Distribute `transfers` starting from `state`.
    ///
    /// Returns a report when the list is exhausted or `shutdown` fires, and
    /// an error for every condition that halts the run.
    pub async fn run(
        &mut self,
        transfers: &[TransferRecord],
        state: RunState,
        shutdown: &CancellationToken,
    ) -> DistributionResult<RunReport> {
        let span = tracing::info_span!("distribution", run_id = %self.run_id);
        self.run_loop(transfers, state, shutdown)
            .instrument(span)
            .await
    }

    async fn run_loop(
        &mut self,
        transfers: &[TransferRecord],
        mut state: RunState,
        shutdown: &CancellationToken,
    ) -> DistributionResult<RunReport> {
        let floor = self.controller.settings().min_batch_size;
        if state.current_batch_size < floor.max(1) {
            return Err(DistributionError::Config(format!(
                "batch size {} is below the floor of {floor}",
                state.current_batch_size
            )));
        }
        if state.cursor > transfers.len() {
            return Err(DistributionError::CheckpointMismatch(format!(
                "cursor {} is past the end of a {}-record list",
                state.cursor,
                transfers.len()
            )));
        }

        tracing::info!(
            total_records = transfers.len(),
            cursor = state.cursor,
            batch_size = state.current_batch_size,
            "Distribution starting"
        );

        let mut tally = Tally::default();

        loop {
            if shutdown.is_cancelled() {
                tracing::warn!(cursor = state.cursor, "Stop requested, ending run");
                return Ok(report(RunStatus::Stopped, &state, transfers.len(), &tally));
            }

            let batch = next_batch(transfers, state.cursor, state.current_batch_size);
            if batch.is_empty() {
                let report = report(RunStatus::Completed, &state, transfers.len(), &tally);
                tracing::info!(
                    attempts = report.attempts,
                    failed_attempts = report.failed_attempts,
                    total_gas_used = report.total_gas_used,
                    "Distribution complete"
                );
                return Ok(report);
            }

            state.batch_count += 1;
            let outcome = self.controller.attempt(&batch, state.batch_count).await;

            tally.attempts += 1;
            tally.gas_used = tally
                .gas_used
                .saturating_add(outcome.actual_gas.unwrap_or(0));
            if outcome.is_success() {
                tally.succeeded += 1;
            } else {
                tally.failed += 1;
            }

            self.record(&batch, &outcome)?;

            // Checkpoint every attempt so a resumed run never reuses a
            // batch number or raises the size again.
            let settled = self.controller.settle(&mut state, &outcome);
            let saved = self.save_checkpoint(&state, transfers.len());

            let transition = match settled {
                Ok(transition) => {
                    saved?;
                    transition
                }
                Err(e) => {
                    if let Err(save_err) = saved {
                        tracing::error!(error = %save_err, "Checkpoint write failed");
                    }
                    tracing::error!(error = %e, cursor = state.cursor, "Distribution halted");
                    return Err(e);
                }
            };

            match transition {
                Transition::Advance { cursor } => {
                    tracing::info!(
                        batch_number = outcome.batch_number,
                        cursor,
                        remaining = transfers.len() - cursor,
                        actual_gas = outcome.actual_gas,
                        "Batch confirmed"
                    );
                }
                Transition::Retry { cursor, batch_size } => {
                    tracing::warn!(
                        batch_number = outcome.batch_number,
                        cursor,
                        batch_size,
                        "Reducing batch size and retrying"
                    );
                }
            }
        }
    }

    /// Write the audit rows of one attempt and make them durable.
    fn record(&mut self, batch: &Batch<'_>, outcome: &SubmissionOutcome) -> DistributionResult<()> {
        if outcome.is_success() {
            for record in batch.records {
                self.audit
                    .record_transfer(record, outcome)
                    .map_err(DistributionError::AuditWriteFailed)?;
            }
        }
        self.audit
            .record_batch(outcome)
            .map_err(DistributionError::AuditWriteFailed)?;
        self.audit
            .flush()
            .map_err(DistributionError::AuditWriteFailed)
    }

    fn save_checkpoint(&self, state: &RunState, total_records: usize) -> DistributionResult<()> {
        let Some((store, run_key)) = &self.checkpoint else {
            return Ok(());
        };
        store
            .save(run_key, &Checkpoint::capture(self.run_id, state, total_records))
            .map_err(DistributionError::AuditWriteFailed)
    }
}

fn report(status: RunStatus, state: &RunState, total_records: usize, tally: &Tally) -> RunReport {
    RunReport {
        status,
        cursor: state.cursor,
        total_records,
        attempts: tally.attempts,
        succeeded_batches: tally.succeeded,
        failed_attempts: tally.failed,
        final_batch_size: state.current_batch_size,
        total_gas_used: tally.gas_used,
    }
}

/// Starting state for a run over `total_records` transfers.
///
/// With `resume` the checkpoint stored under `run_key` is continued. Without
/// it an existing checkpoint is reported and the run starts over.
pub fn starting_state(
    store: &CheckpointStore,
    run_key: &str,
    resume: bool,
    initial_batch_size: usize,
    total_records: usize,
) -> DistributionResult<RunState> {
    let stored = store
        .load(run_key)
        .map_err(DistributionError::AuditWriteFailed)?;
    let fresh = RunState::new(initial_batch_size);

    match (resume, stored) {
        (true, Some(checkpoint)) => {
            if checkpoint.total_records != total_records {
                return Err(DistributionError::CheckpointMismatch(format!(
                    "checkpoint covers {} records, list has {total_records}",
                    checkpoint.total_records
                )));
            }
            tracing::info!(
                previous_run_id = %checkpoint.run_id,
                cursor = checkpoint.cursor,
                batch_size = checkpoint.batch_size,
                batch_count = checkpoint.batch_count,
                updated_at = %checkpoint.updated_at,
                "Resuming from checkpoint"
            );
            Ok(checkpoint.run_state())
        }
        (true, None) => {
            tracing::info!("No checkpoint for this list, starting from the beginning");
            Ok(fresh)
        }
        (false, Some(checkpoint)) => {
            tracing::warn!(
                cursor = checkpoint.cursor,
                "A checkpoint exists for this list; starting over (set RESUME=true to continue it)"
            );
            Ok(fresh)
        }
        (false, None) => Ok(fresh),
    }
}

/// Cancel `shutdown` on the first stop signal, then return on the second.
///
/// Fails when the signal source does.
pub async fn watch_stop_signals<S, F>(mut signal: S, shutdown: CancellationToken) -> io::Result<()>
where
    S: FnMut() -> F,
    F: Future<Output = io::Result<()>>,
{
    signal().await?;
    tracing::warn!("Stop requested, finishing the current attempt (repeat to exit now)");
    shutdown.cancel();
    signal().await
}
