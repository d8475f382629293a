// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Run checkpoints backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `checkpoints`: run key → serialized [`Checkpoint`] (JSON bytes)
//!
//! The run key identifies the input list, so a resumed run only picks up
//! progress made against the same file.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::RunState;

use super::{StorageError, StorageResult};

/// Run key → checkpoint JSON.
const CHECKPOINTS: TableDefinition<&str, &[u8]> = TableDefinition::new("checkpoints");

/// Progress of a run after its last succeeded batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Run that wrote the checkpoint
    pub run_id: Uuid,
    /// Next transfer to send
    pub cursor: usize,
    /// Batch size in force after the last success
    pub batch_size: usize,
    /// Attempts made so far
    pub batch_count: u64,
    /// Length of the input list the cursor refers to
    pub total_records: usize,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Snapshot `state` for the run `run_id`.
    pub fn capture(run_id: Uuid, state: &RunState, total_records: usize) -> Self {
        Self {
            run_id,
            cursor: state.cursor,
            batch_size: state.current_batch_size,
            batch_count: state.batch_count,
            total_records,
            updated_at: Utc::now(),
        }
    }

    /// Run state to resume from.
    pub fn run_state(&self) -> RunState {
        RunState {
            cursor: self.cursor,
            current_batch_size: self.batch_size,
            batch_count: self.batch_count,
        }
    }
}

/// Embedded checkpoint database.
pub struct CheckpointStore {
    db: Database,
}

impl CheckpointStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(CHECKPOINTS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Load the checkpoint stored under `run_key`.
    pub fn load(&self, run_key: &str) -> StorageResult<Option<Checkpoint>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CHECKPOINTS)?;
        match table.get(run_key)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    /// Persist `checkpoint` under `run_key`, replacing the previous one.
    pub fn save(&self, run_key: &str, checkpoint: &Checkpoint) -> StorageResult<()> {
        let bytes = serde_json::to_vec(checkpoint)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CHECKPOINTS)?;
            table.insert(run_key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// Key identifying an input list.
///
/// Uses the canonical path when the file exists so relative and absolute
/// spellings of the same list share a checkpoint.
pub fn run_key(input: &Path) -> String {
    let path = std::fs::canonicalize(input).unwrap_or_else(|_| input.to_path_buf());
    format!("input:{}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (CheckpointStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::open(&dir.path().join("checkpoint.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn missing_checkpoint_is_none() {
        let (store, _dir) = temp_store();
        assert!(store.load("input:/nowhere.csv").unwrap().is_none());
    }

    #[test]
    fn save_and_load() {
        let (store, _dir) = temp_store();
        let state = RunState {
            cursor: 2250,
            current_batch_size: 750,
            batch_count: 4,
        };
        let checkpoint = Checkpoint::capture(Uuid::new_v4(), &state, 3200);

        store.save("input:/list.csv", &checkpoint).unwrap();
        let loaded = store.load("input:/list.csv").unwrap().unwrap();
        assert_eq!(loaded, checkpoint);
        assert_eq!(loaded.run_state(), state);
    }

    #[test]
    fn later_save_replaces_earlier() {
        let (store, _dir) = temp_store();
        let run_id = Uuid::new_v4();
        let mut state = RunState::new(1500);

        state.cursor = 1500;
        store.save("k", &Checkpoint::capture(run_id, &state, 3200)).unwrap();
        state.cursor = 3000;
        store.save("k", &Checkpoint::capture(run_id, &state, 3200)).unwrap();

        assert_eq!(store.load("k").unwrap().unwrap().cursor, 3000);
    }

    #[test]
    fn run_key_canonicalizes_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("list.csv");
        std::fs::write(&file, "address,amount\n").unwrap();

        let dotted = dir.path().join(".").join("list.csv");
        assert_eq!(run_key(&file), run_key(&dotted));
    }
}
