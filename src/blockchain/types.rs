// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain types and constants.

use alloy::primitives::{Address, U256};

/// EVM network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Immutable zkEVM mainnet configuration.
pub const IMMUTABLE_MAINNET: NetworkConfig = NetworkConfig {
    name: "Immutable zkEVM",
    chain_id: 13371,
    rpc_url: "https://rpc.immutable.com",
    explorer_url: "https://explorer.immutable.com",
};

/// Immutable zkEVM testnet configuration.
pub const IMMUTABLE_TESTNET: NetworkConfig = NetworkConfig {
    name: "Immutable zkEVM Testnet",
    chain_id: 13473,
    rpc_url: "https://rpc.testnet.immutable.com",
    explorer_url: "https://explorer.testnet.immutable.com",
};

/// Resolve a network by its short name (`testnet` or `mainnet`).
pub fn network_by_name(raw: &str) -> Option<NetworkConfig> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "testnet" | "immutable-testnet" => Some(IMMUTABLE_TESTNET),
        "mainnet" | "immutable" | "immutable-mainnet" => Some(IMMUTABLE_MAINNET),
        _ => None,
    }
}

/// Fixed EIP-1559 fee settings applied to every submission of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSettings {
    /// Max priority fee per gas (tip), in wei
    pub max_priority_fee_per_gas: u128,
    /// Max fee per gas, in wei
    pub max_fee_per_gas: u128,
}

impl FeeSettings {
    /// 15 gwei tip, 50 gwei cap.
    pub const DEFAULT: FeeSettings = FeeSettings {
        max_priority_fee_per_gas: 15_000_000_000,
        max_fee_per_gas: 50_000_000_000,
    };
}

impl Default for FeeSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Arguments of one `multiSendToken` call.
///
/// Built once per attempt; the same value is estimated and then sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSendCall {
    /// ERC-20 token being distributed
    pub token: Address,
    /// Recipients, in batch order
    pub recipients: Vec<Address>,
    /// Amounts in the token's smallest unit, parallel to `recipients`
    pub amounts: Vec<U256>,
}

impl MultiSendCall {
    /// Number of transfers carried by the call.
    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    /// Whether the call carries no transfers.
    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Sum of all amounts in the call.
    pub fn total_amount(&self) -> U256 {
        self.amounts
            .iter()
            .fold(U256::ZERO, |acc, amount| acc.saturating_add(*amount))
    }
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}
