// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain client for multi-send distributions.
//!
//! [`MultiSendChain`] is the seam between the batch controller and the
//! network: one read (`estimate_gas`), one write (`send_transaction`) and a
//! blocking wait (`wait_for_confirmation`) per attempt. [`MultiSendClient`]
//! implements it over an alloy HTTP provider that signs with the sender key.

use std::time::Duration;

use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};
use async_trait::async_trait;

use super::erc20::Erc20Contract;
use super::multisend::encode_multi_send;
use super::types::{FeeSettings, MultiSendCall, NetworkConfig, TxReceipt};

/// Default interval between receipt polls.
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Chain operations needed to distribute one batch.
#[async_trait]
pub trait MultiSendChain: Send + Sync {
    /// Estimate the gas of a `multiSendToken` call from the sender.
    async fn estimate_gas(&self, call: &MultiSendCall) -> Result<u64, ChainError>;

    /// Broadcast the call and return the transaction hash.
    async fn send_transaction(
        &self,
        call: &MultiSendCall,
        gas_limit: u64,
        fees: FeeSettings,
    ) -> Result<String, ChainError>;

    /// Block until the transaction has a receipt.
    ///
    /// Callers bound this with their own timeout.
    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TxReceipt, ChainError>;
}

/// Multi-send client bound to one sender, contract and network.
pub struct MultiSendClient {
    /// Network configuration
    network: NetworkConfig,
    /// Alloy HTTP provider with the sender wallet
    provider: DynProvider,
    /// Address of the signing account
    sender: Address,
    /// Multi-send contract address
    multi_send: Address,
    /// Delay between receipt polls
    poll_interval: Duration,
}

impl MultiSendClient {
    /// Create a new client that signs with `signer`.
    ///
    /// `rpc_url` overrides the network's default endpoint when set.
    pub fn new(
        network: NetworkConfig,
        rpc_url: Option<&str>,
        signer: PrivateKeySigner,
        multi_send: Address,
    ) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .unwrap_or(network.rpc_url)
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            network,
            provider,
            sender,
            multi_send,
            poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        })
    }

    /// Override the receipt polling interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Address of the signing account.
    pub fn sender(&self) -> Address {
        self.sender
    }

    /// Multi-send contract address.
    pub fn multi_send_address(&self) -> Address {
        self.multi_send
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// ERC-20 wrapper for `token` on the same provider.
    pub fn token(&self, token: Address) -> Erc20Contract<DynProvider> {
        Erc20Contract::new(&self.provider, token)
    }

    /// Fail when the endpoint serves a different chain than configured.
    pub async fn verify_chain_id(&self) -> Result<(), ChainError> {
        let chain_id = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::RpcError(e.to_string()))?;

        if chain_id != self.network.chain_id {
            return Err(ChainError::RpcError(format!(
                "endpoint reports chain id {chain_id}, expected {} ({})",
                self.network.chain_id, self.network.name
            )));
        }
        Ok(())
    }

    /// Build the unsigned request for a call.
    fn request(&self, call: &MultiSendCall) -> TransactionRequest {
        TransactionRequest::default()
            .from(self.sender)
            .to(self.multi_send)
            .input(encode_multi_send(call).into())
    }
}

#[async_trait]
impl MultiSendChain for MultiSendClient {
    async fn estimate_gas(&self, call: &MultiSendCall) -> Result<u64, ChainError> {
        self.provider
            .estimate_gas(self.request(call))
            .await
            .map_err(|e| ChainError::RpcError(format!("Gas estimation failed: {e}")))
    }

    async fn send_transaction(
        &self,
        call: &MultiSendCall,
        gas_limit: u64,
        fees: FeeSettings,
    ) -> Result<String, ChainError> {
        let tx = self
            .request(call)
            .gas_limit(gas_limit)
            .max_fee_per_gas(fees.max_fee_per_gas)
            .max_priority_fee_per_gas(fees.max_priority_fee_per_gas);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::TransactionFailed(format!("Failed to send: {e}")))?;

        Ok(format!("{:?}", pending.tx_hash()))
    }

    async fn wait_for_confirmation(&self, tx_hash: &str) -> Result<TxReceipt, ChainError> {
        let hash: TxHash = tx_hash
            .parse()
            .map_err(|e| ChainError::InvalidTxHash(format!("{tx_hash}: {e}")))?;

        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    return Ok(TxReceipt {
                        tx_hash: tx_hash.to_string(),
                        block_number: receipt.block_number.unwrap_or(0),
                        gas_used: receipt.gas_used,
                        success: receipt.status(),
                    });
                }
                Ok(None) => {}
                // The transaction is already broadcast; keep polling rather
                // than reporting a failure that would re-send its transfers.
                Err(e) => {
                    tracing::warn!(tx_hash, error = %e, "Receipt poll failed, will retry");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Create a signer from a private key (hex string, `0x` prefix optional).
pub fn create_signer(private_key_hex: &str) -> Result<PrivateKeySigner, ChainError> {
    let trimmed = private_key_hex.trim();
    let key_bytes = alloy::hex::decode(trimmed.strip_prefix("0x").unwrap_or(trimmed))
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ChainError::InvalidPrivateKey(e.to_string()))
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid transaction hash: {0}")]
    InvalidTxHash(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("RPC error: {0}")]
    RpcError(String),

    #[error("Contract error: {0}")]
    ContractError(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
