// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Audit logging for distribution attempts.
//!
//! Two append-only CSV logs are kept:
//!
//! - the per-recipient log gets one row for every transfer of a succeeded
//!   batch;
//! - the per-batch log gets one row for every attempt, including failed
//!   estimations and failed submissions.
//!
//! Header rows are written only when a file is new or empty, so a resumed
//! run keeps appending to the same files.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::{SubmissionOutcome, TransferRecord};

use super::{OutputPaths, StorageError, StorageResult};

/// Header of the per-recipient log.
pub const TRANSFER_LOG_HEADER: &str =
    "Recipient,Amount,Estimated Gas,Actual Gas Used,Transaction Hash";

/// Header of the per-batch log.
pub const BATCH_LOG_HEADER: &str = "Batch Number,Batch Size,Estimated Gas,Actual Gas,Outcome";

/// Placeholder for values an attempt never produced.
const NOT_AVAILABLE: &str = "N/A";

/// Destination for per-transfer and per-attempt audit records.
pub trait AuditSink {
    /// Append one row for a transfer of a succeeded batch.
    fn record_transfer(
        &mut self,
        record: &TransferRecord,
        outcome: &SubmissionOutcome,
    ) -> StorageResult<()>;

    /// Append one row for an attempt.
    fn record_batch(&mut self, outcome: &SubmissionOutcome) -> StorageResult<()>;

    /// Make everything recorded so far durable.
    fn flush(&mut self) -> StorageResult<()>;
}

/// CSV audit logs on the local filesystem.
pub struct CsvAuditLog {
    transfers: AppendLog,
    batches: AppendLog,
}

impl CsvAuditLog {
    /// Open (or create) both logs under `paths`.
    pub fn open(paths: &OutputPaths) -> StorageResult<Self> {
        std::fs::create_dir_all(paths.root()).map_err(|e| StorageError::io(paths.root(), e))?;

        Ok(Self {
            transfers: AppendLog::open(&paths.transfer_log(), TRANSFER_LOG_HEADER)?,
            batches: AppendLog::open(&paths.batch_log(), BATCH_LOG_HEADER)?,
        })
    }
}

impl AuditSink for CsvAuditLog {
    fn record_transfer(
        &mut self,
        record: &TransferRecord,
        outcome: &SubmissionOutcome,
    ) -> StorageResult<()> {
        self.transfers.append(&[
            record.recipient.to_checksum(None),
            record.amount.clone(),
            gas_field(outcome.estimated_gas),
            gas_field(outcome.actual_gas),
            outcome
                .tx_hash
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        ])
    }

    fn record_batch(&mut self, outcome: &SubmissionOutcome) -> StorageResult<()> {
        self.batches.append(&[
            outcome.batch_number.to_string(),
            outcome.batch_size.to_string(),
            gas_field(outcome.estimated_gas),
            gas_field(outcome.actual_gas),
            outcome.outcome_text(),
        ])
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.transfers.sync()?;
        self.batches.sync()
    }
}

/// One append-mode CSV file.
struct AppendLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl AppendLog {
    fn open(path: &Path, header: &str) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::io(path, e))?;

        let is_empty = file
            .metadata()
            .map_err(|e| StorageError::io(path, e))?
            .len()
            == 0;

        let mut log = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        };

        if is_empty {
            log.write_line(header)?;
            log.sync()?;
        }

        Ok(log)
    }

    fn append(&mut self, fields: &[String]) -> StorageResult<()> {
        let line = fields
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        self.write_line(&line)
    }

    fn write_line(&mut self, line: &str) -> StorageResult<()> {
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|e| StorageError::io(&self.path, e))
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_data())
            .map_err(|e| StorageError::io(&self.path, e))
    }
}

fn gas_field(gas: Option<u64>) -> String {
    gas.map(|g| g.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Quote a field when it would otherwise break the row.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttemptStatus;
    use alloy::primitives::{address, U256};
    use tempfile::TempDir;

    fn setup() -> (TempDir, OutputPaths) {
        let temp = TempDir::new().unwrap();
        let paths = OutputPaths::new(temp.path().join("out"));
        (temp, paths)
    }

    fn record() -> TransferRecord {
        TransferRecord {
            recipient: address!("1111111111111111111111111111111111111111"),
            amount: "0.042".to_string(),
            base_units: U256::from(42_000_000_000_000_000u64),
        }
    }

    fn success() -> SubmissionOutcome {
        SubmissionOutcome {
            batch_number: 1,
            start_index: 0,
            batch_size: 1,
            estimated_gas: Some(60_000),
            actual_gas: Some(52_311),
            tx_hash: Some("0xfeed".to_string()),
            status: AttemptStatus::Success,
            error: None,
        }
    }

    #[test]
    fn headers_written_once() {
        let (_temp, paths) = setup();
        {
            let mut log = CsvAuditLog::open(&paths).unwrap();
            log.record_batch(&success()).unwrap();
            log.flush().unwrap();
        }
        {
            let mut log = CsvAuditLog::open(&paths).unwrap();
            log.record_batch(&success()).unwrap();
            log.flush().unwrap();
        }

        let batches = std::fs::read_to_string(paths.batch_log()).unwrap();
        let lines: Vec<&str> = batches.lines().collect();
        assert_eq!(lines[0], BATCH_LOG_HEADER);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,1,60000,52311,Success");
        assert_eq!(lines[2], lines[1]);

        let transfers = std::fs::read_to_string(paths.transfer_log()).unwrap();
        assert_eq!(transfers.lines().collect::<Vec<_>>(), vec![TRANSFER_LOG_HEADER]);
    }

    #[test]
    fn transfer_row_layout() {
        let (_temp, paths) = setup();
        let mut log = CsvAuditLog::open(&paths).unwrap();
        log.record_transfer(&record(), &success()).unwrap();
        log.flush().unwrap();

        let transfers = std::fs::read_to_string(paths.transfer_log()).unwrap();
        let row = transfers.lines().nth(1).unwrap();
        assert_eq!(
            row.to_lowercase(),
            "0x1111111111111111111111111111111111111111,0.042,60000,52311,0xfeed"
        );
    }

    #[test]
    fn failed_attempts_use_placeholders_and_quote_details() {
        let (_temp, paths) = setup();
        let mut log = CsvAuditLog::open(&paths).unwrap();

        let estimation = SubmissionOutcome {
            estimated_gas: None,
            actual_gas: None,
            tx_hash: None,
            status: AttemptStatus::GasEstimationFailed,
            error: Some("execution reverted: \"paused\", code 3".to_string()),
            ..success()
        };
        log.record_batch(&estimation).unwrap();
        log.flush().unwrap();

        let batches = std::fs::read_to_string(paths.batch_log()).unwrap();
        let row = batches.lines().nth(1).unwrap();
        assert_eq!(
            row,
            r#"1,1,N/A,N/A,"Gas estimation failed: execution reverted: ""paused"", code 3""#
        );
    }

    #[test]
    fn csv_field_passthrough() {
        assert_eq!(csv_field("Success"), "Success");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}
