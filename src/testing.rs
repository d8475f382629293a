// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test doubles for the chain and the audit trail.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, U256};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::blockchain::{ChainError, FeeSettings, MultiSendCall, MultiSendChain, TxReceipt};
use crate::models::{SubmissionOutcome, TransferRecord};
use crate::storage::{AuditSink, StorageError, StorageResult};

/// `n` distinct transfer records; amount `i` for record `i`.
pub(crate) fn records(n: usize) -> Vec<TransferRecord> {
    (0..n)
        .map(|i| {
            let mut bytes = [0u8; 20];
            bytes[12..].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            TransferRecord {
                recipient: Address::from(bytes),
                amount: i.to_string(),
                base_units: U256::from(i),
            }
        })
        .collect()
}

/// What happens to the next broadcast transaction.
#[derive(Debug, Clone)]
pub(crate) enum SendScript {
    /// Mined successfully
    Confirm,
    /// `send_transaction` itself fails
    Reject(String),
    /// Mined with status 0
    Revert,
    /// No receipt ever appears
    Hang,
}

#[derive(Debug, Clone)]
pub(crate) struct SentTx {
    pub call: MultiSendCall,
    pub gas_limit: u64,
    pub fees: FeeSettings,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ChainLog {
    pub estimated: Vec<MultiSendCall>,
    pub sent: Vec<SentTx>,
}

#[derive(Default)]
struct Script {
    estimate_plan: VecDeque<Option<String>>,
    send_plan: VecDeque<SendScript>,
    default_send: Option<SendScript>,
    pending: HashMap<String, (SendScript, u64)>,
    cancel_after_confirmations: Option<(usize, CancellationToken)>,
    confirmations: usize,
    log: ChainLog,
}

/// [`MultiSendChain`] that plays back a scripted sequence of results.
///
/// Unscripted estimates succeed and unscripted sends confirm, unless a
/// default send behaviour is set.
#[derive(Clone, Default)]
pub(crate) struct ScriptedChain {
    script: Arc<Mutex<Script>>,
}

impl ScriptedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic estimate for a batch of `len` transfers.
    pub fn estimate_for(len: usize) -> u64 {
        50_000 + 30_000 * len as u64
    }

    pub fn then_estimate_ok(self) -> Self {
        self.with(|s| s.estimate_plan.push_back(None))
    }

    pub fn fail_estimate(self, reason: &str) -> Self {
        let reason = reason.to_string();
        self.with(move |s| s.estimate_plan.push_back(Some(reason)))
    }

    pub fn then_send(self, script: SendScript) -> Self {
        self.with(|s| s.send_plan.push_back(script))
    }

    /// Behaviour for every send once the plan is exhausted.
    pub fn otherwise_send(self, script: SendScript) -> Self {
        self.with(|s| s.default_send = Some(script))
    }

    /// Cancel `token` as the `n`-th confirmation is returned.
    pub fn cancel_after(self, n: usize, token: CancellationToken) -> Self {
        self.with(|s| s.cancel_after_confirmations = Some((n, token)))
    }

    pub fn log(&self) -> ChainLog {
        self.script.lock().unwrap().log.clone()
    }

    fn with(self, f: impl FnOnce(&mut Script)) -> Self {
        f(&mut self.script.lock().unwrap());
        self
    }
}

#[async_trait]
impl MultiSendChain for ScriptedChain {
    async fn estimate_gas(&self, call: &MultiSendCall) -> Result<u64, ChainError> {
        let mut script = self.script.lock().unwrap();
        script.log.estimated.push(call.clone());
        match script.estimate_plan.pop_front().flatten() {
            Some(reason) => Err(ChainError::RpcError(format!("Gas estimation failed: {reason}"))),
            None => Ok(Self::estimate_for(call.len())),
        }
    }

    async fn send_transaction(
        &self,
        call: &MultiSendCall,
        gas_limit: u64,
        fees: FeeSettings,
    ) -> Result<String, ChainError> {
        let mut script = self.script.lock().unwrap();
        let next = script
            .send_plan
            .pop_front()
            .or_else(|| script.default_send.clone())
            .unwrap_or(SendScript::Confirm);

        if let SendScript::Reject(reason) = next {
            return Err(ChainError::TransactionFailed(reason));
        }

        script.log.sent.push(SentTx {
            call: call.clone(),
            gas_limit,
            fees,
        });
        let tx_hash = format!("0x{:064x}", script.log.sent.len());
        let gas_used = gas_limit * 9 / 10;
        script.pending.insert(tx_hash.clone(), (next, gas_used));
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        let (outcome, gas_used) = {
            let script = self.script.lock().unwrap();
            script
                .pending
                .get(tx_hash)
                .cloned()
                .ok_or_else(|| ChainError::RpcError(format!("unknown tx {tx_hash}")))?
        };

        let success = match outcome {
            SendScript::Hang => return std::future::pending().await,
            SendScript::Revert => false,
            SendScript::Confirm | SendScript::Reject(_) => true,
        };

        let mut script = self.script.lock().unwrap();
        script.confirmations += 1;
        if let Some((n, token)) = &script.cancel_after_confirmations {
            if script.confirmations == *n {
                token.cancel();
            }
        }

        Ok(TxReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: 1_000 + script.confirmations as u64,
            gas_used,
            success,
        })
    }
}

/// In-memory [`AuditSink`] that can be told to start failing.
#[derive(Default)]
pub(crate) struct MemoryAudit {
    pub transfers: Vec<(TransferRecord, SubmissionOutcome)>,
    pub batches: Vec<SubmissionOutcome>,
    pub flushes: usize,
    /// Fail every batch write once this many batch rows exist
    pub fail_after_batches: Option<usize>,
}

impl MemoryAudit {
    pub fn failing_after(batches: usize) -> Self {
        Self {
            fail_after_batches: Some(batches),
            ..Self::default()
        }
    }
}

impl AuditSink for MemoryAudit {
    fn record_transfer(
        &mut self,
        record: &TransferRecord,
        outcome: &SubmissionOutcome,
    ) -> StorageResult<()> {
        self.transfers.push((record.clone(), outcome.clone()));
        Ok(())
    }

    fn record_batch(&mut self, outcome: &SubmissionOutcome) -> StorageResult<()> {
        if self.fail_after_batches.is_some_and(|n| self.batches.len() >= n) {
            return Err(StorageError::io(
                "memory://batch_log.csv",
                io::Error::other("disk full"),
            ));
        }
        self.batches.push(outcome.clone());
        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.flushes += 1;
        Ok(())
    }
}
