// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Output file layout.

use std::path::{Path, PathBuf};

/// Per-recipient audit log file name.
pub const TRANSFER_LOG_FILE: &str = "distribution_log.csv";

/// Per-batch audit log file name.
pub const BATCH_LOG_FILE: &str = "batch_log.csv";

/// Checkpoint database file name.
pub const CHECKPOINT_FILE: &str = "checkpoint.redb";

/// Paths of the files a run writes.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    root: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self::new(".")
    }
}

impl OutputPaths {
    /// Create a new OutputPaths rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the per-recipient log.
    pub fn transfer_log(&self) -> PathBuf {
        self.root.join(TRANSFER_LOG_FILE)
    }

    /// Path to the per-batch log.
    pub fn batch_log(&self) -> PathBuf {
        self.root.join(BATCH_LOG_FILE)
    }

    /// Path to the checkpoint database.
    pub fn checkpoint_db(&self) -> PathBuf {
        self.root.join(CHECKPOINT_FILE)
    }
}
