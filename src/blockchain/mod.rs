// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EVM integration for multi-send distributions.
//!
//! This module provides functionality for:
//! - Estimating and broadcasting `multiSendToken` calls
//! - Polling for transaction receipts
//! - Reading ERC-20 metadata, balances and allowances
//! - Loading the sender key and scaling token amounts

pub mod client;
pub mod erc20;
pub mod multisend;
pub mod signing;
pub mod types;
pub mod units;

pub use client::{create_signer, ChainError, MultiSendChain, MultiSendClient};
pub use types::*;
pub use units::{format_amount, parse_amount, parse_gwei};
