// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Durable Run Storage
//!
//! Everything a distribution run persists lives under one output directory:
//!
//! ```text
//! <OUTPUT_DIR>/
//!   distribution_log.csv   # One row per transfer in a succeeded batch
//!   batch_log.csv          # One row per attempt, successes and failures
//!   checkpoint.redb        # Resume point per input list
//! ```
//!
//! Logs are append-only. Rows for an attempt are flushed to disk before the
//! next attempt starts, so a crash leaves a consistent trail up to the last
//! completed attempt.

use std::io;
use std::path::PathBuf;

pub mod audit;
pub mod checkpoint;
pub mod paths;

pub use audit::{AuditSink, CsvAuditLog};
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use paths::OutputPaths;

/// Error type for audit log and checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
