// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! MultiSend Distributor - Batched ERC-20 Distribution Engine
//!
//! Sends a token to an ordered list of recipients through a multi-send
//! contract, one batch per transaction. Failed submissions shrink the batch
//! and retry from the same position; every attempt is written to append-only
//! CSV audit logs before the next one starts.
//!
//! ## Modules
//!
//! - `blockchain` - Chain client, contract bindings, key loading and units
//! - `source` - Loading the transfer list (CSV or JSON)
//! - `batcher` - Carving batches out of the list
//! - `controller` - Single-attempt state machine and batch size adaptation
//! - `driver` - Run loop tying attempts, audit rows and checkpoints together
//! - `storage` - CSV audit logs and the redb checkpoint store

pub mod batcher;
pub mod blockchain;
pub mod config;
pub mod controller;
pub mod driver;
pub mod error;
pub mod models;
pub mod source;
pub mod storage;

#[cfg(test)]
mod testing;

pub use driver::Distributor;
pub use error::{DistributionError, DistributionResult};
