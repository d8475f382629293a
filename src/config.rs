// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the validated configuration of a
//! distribution run. Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NETWORK` | `testnet` or `mainnet` (Immutable zkEVM) | `testnet` |
//! | `RPC_URL` | Override of the network RPC endpoint | Network default |
//! | `PRIVATE_KEY` | Sender key as hex | One key source required |
//! | `SENDER_KEY_FILE` | Sender key as SEC1/PKCS#8 PEM file | One key source required |
//! | `MULTI_SEND_ADDRESS` | Multi-send contract address | Required |
//! | `TOKEN_ADDRESS` | ERC-20 token address | Required |
//! | `TOKEN_DECIMALS` | Decimals used to scale amounts | Queried from the token |
//! | `TRANSFERS_PATH` | Transfer list (`.csv` or `.json`) | `wallets_to_transfer.csv` |
//! | `OUTPUT_DIR` | Directory for audit logs and checkpoint | `.` |
//! | `INITIAL_BATCH_SIZE` | Transfers per batch at start | `1500` |
//! | `MIN_BATCH_SIZE` | Smallest batch size worth retrying | `10` |
//! | `MAX_PRIORITY_FEE_GWEI` | EIP-1559 priority fee | `15` |
//! | `MAX_FEE_GWEI` | EIP-1559 max fee | `50` |
//! | `GAS_LIMIT_BUFFER_PERCENT` | Extra gas on top of the estimate | `0` |
//! | `CONFIRMATION_TIMEOUT_SECS` | Wait for a receipt before giving up | `300` |
//! | `RECEIPT_POLL_INTERVAL_MS` | Delay between receipt polls | `2000` |
//! | `RESUME` | Continue from the stored checkpoint | `false` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

use crate::blockchain::{network_by_name, parse_gwei, FeeSettings, NetworkConfig};
use crate::controller::{DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_MIN_BATCH_SIZE};
use crate::error::{DistributionError, DistributionResult};

/// Network name, `testnet` or `mainnet`.
pub const NETWORK_ENV: &str = "NETWORK";

/// Optional RPC endpoint replacing the network default.
pub const RPC_URL_ENV: &str = "RPC_URL";

/// Sender private key as hex, `0x` prefix optional.
///
/// Mutually exclusive with [`SENDER_KEY_FILE_ENV`].
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Path to a PEM-encoded sender key.
pub const SENDER_KEY_FILE_ENV: &str = "SENDER_KEY_FILE";

pub const MULTI_SEND_ADDRESS_ENV: &str = "MULTI_SEND_ADDRESS";
pub const TOKEN_ADDRESS_ENV: &str = "TOKEN_ADDRESS";

/// Token decimals. When unset the token contract is asked.
pub const TOKEN_DECIMALS_ENV: &str = "TOKEN_DECIMALS";

pub const TRANSFERS_PATH_ENV: &str = "TRANSFERS_PATH";

/// Directory holding `distribution_log.csv`, `batch_log.csv` and the
/// checkpoint database.
pub const OUTPUT_DIR_ENV: &str = "OUTPUT_DIR";

pub const INITIAL_BATCH_SIZE_ENV: &str = "INITIAL_BATCH_SIZE";
pub const MIN_BATCH_SIZE_ENV: &str = "MIN_BATCH_SIZE";
pub const MAX_PRIORITY_FEE_GWEI_ENV: &str = "MAX_PRIORITY_FEE_GWEI";
pub const MAX_FEE_GWEI_ENV: &str = "MAX_FEE_GWEI";
pub const GAS_LIMIT_BUFFER_PERCENT_ENV: &str = "GAS_LIMIT_BUFFER_PERCENT";
pub const CONFIRMATION_TIMEOUT_SECS_ENV: &str = "CONFIRMATION_TIMEOUT_SECS";
pub const RECEIPT_POLL_INTERVAL_MS_ENV: &str = "RECEIPT_POLL_INTERVAL_MS";

/// `true`/`1`/`yes` to continue from the checkpoint of the same input.
pub const RESUME_ENV: &str = "RESUME";

/// Logging format, `json` or `pretty`.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_NETWORK: &str = "testnet";
pub const DEFAULT_TRANSFERS_PATH: &str = "wallets_to_transfer.csv";
pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_INITIAL_BATCH_SIZE: usize = 1500;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2000;

/// Where the sender key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum SenderKey {
    Hex(String),
    PemFile(PathBuf),
}

impl fmt::Debug for SenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hex(_) => f.write_str("Hex(<redacted>)"),
            Self::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

/// Validated configuration of one distribution run.
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    pub network: NetworkConfig,
    pub rpc_url: Option<String>,
    pub sender_key: SenderKey,
    pub multi_send_address: Address,
    pub token_address: Address,
    pub token_decimals: Option<u8>,
    pub transfers_path: PathBuf,
    pub output_dir: PathBuf,
    pub initial_batch_size: usize,
    pub min_batch_size: usize,
    pub fees: FeeSettings,
    pub gas_limit_buffer_percent: u64,
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub resume: bool,
}

impl DistributorConfig {
    /// Load from the process environment.
    pub fn from_env() -> DistributionResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DistributionResult<Self> {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let network_name = var(NETWORK_ENV).unwrap_or_else(|| DEFAULT_NETWORK.to_string());
        let network = network_by_name(&network_name).ok_or_else(|| {
            invalid(
                NETWORK_ENV,
                &network_name,
                "expected `testnet` or `mainnet`",
            )
        })?;

        let sender_key = match (var(PRIVATE_KEY_ENV), var(SENDER_KEY_FILE_ENV)) {
            (Some(hex), None) => SenderKey::Hex(hex),
            (None, Some(path)) => SenderKey::PemFile(PathBuf::from(path)),
            (None, None) => {
                return Err(DistributionError::Config(format!(
                    "one of {PRIVATE_KEY_ENV} or {SENDER_KEY_FILE_ENV} must be set"
                )))
            }
            (Some(_), Some(_)) => {
                return Err(DistributionError::Config(format!(
                    "{PRIVATE_KEY_ENV} and {SENDER_KEY_FILE_ENV} are mutually exclusive"
                )))
            }
        };

        let fees = FeeSettings {
            max_priority_fee_per_gas: gwei(&var, MAX_PRIORITY_FEE_GWEI_ENV)?
                .unwrap_or(FeeSettings::DEFAULT.max_priority_fee_per_gas),
            max_fee_per_gas: gwei(&var, MAX_FEE_GWEI_ENV)?
                .unwrap_or(FeeSettings::DEFAULT.max_fee_per_gas),
        };

        let config = Self {
            network,
            rpc_url: var(RPC_URL_ENV),
            sender_key,
            multi_send_address: required_address(&var, MULTI_SEND_ADDRESS_ENV)?,
            token_address: required_address(&var, TOKEN_ADDRESS_ENV)?,
            token_decimals: parsed(&var, TOKEN_DECIMALS_ENV)?,
            transfers_path: PathBuf::from(
                var(TRANSFERS_PATH_ENV).unwrap_or_else(|| DEFAULT_TRANSFERS_PATH.to_string()),
            ),
            output_dir: PathBuf::from(
                var(OUTPUT_DIR_ENV).unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            ),
            initial_batch_size: parsed(&var, INITIAL_BATCH_SIZE_ENV)?
                .unwrap_or(DEFAULT_INITIAL_BATCH_SIZE),
            min_batch_size: parsed(&var, MIN_BATCH_SIZE_ENV)?.unwrap_or(DEFAULT_MIN_BATCH_SIZE),
            fees,
            gas_limit_buffer_percent: parsed(&var, GAS_LIMIT_BUFFER_PERCENT_ENV)?.unwrap_or(0),
            confirmation_timeout: parsed(&var, CONFIRMATION_TIMEOUT_SECS_ENV)?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT),
            receipt_poll_interval: Duration::from_millis(
                parsed(&var, RECEIPT_POLL_INTERVAL_MS_ENV)?
                    .unwrap_or(DEFAULT_RECEIPT_POLL_INTERVAL_MS),
            ),
            resume: flag(&var, RESUME_ENV)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> DistributionResult<()> {
        if self.min_batch_size == 0 {
            return Err(DistributionError::Config(format!(
                "{MIN_BATCH_SIZE_ENV} must be at least 1"
            )));
        }
        if self.initial_batch_size < self.min_batch_size {
            return Err(DistributionError::Config(format!(
                "{INITIAL_BATCH_SIZE_ENV} ({}) is below {MIN_BATCH_SIZE_ENV} ({})",
                self.initial_batch_size, self.min_batch_size
            )));
        }
        if self.fees.max_priority_fee_per_gas > self.fees.max_fee_per_gas {
            return Err(DistributionError::Config(format!(
                "{MAX_PRIORITY_FEE_GWEI_ENV} exceeds {MAX_FEE_GWEI_ENV}"
            )));
        }
        if self.confirmation_timeout.is_zero() {
            return Err(DistributionError::Config(format!(
                "{CONFIRMATION_TIMEOUT_SECS_ENV} must be positive"
            )));
        }
        if self.receipt_poll_interval.is_zero() {
            return Err(DistributionError::Config(format!(
                "{RECEIPT_POLL_INTERVAL_MS_ENV} must be positive"
            )));
        }
        if self.rpc_url.as_deref().is_some_and(|u| url::Url::parse(u).is_err()) {
            return Err(DistributionError::Config(format!(
                "{RPC_URL_ENV} is not a valid URL"
            )));
        }
        Ok(())
    }
}

fn invalid(name: &str, value: &str, reason: impl fmt::Display) -> DistributionError {
    DistributionError::Config(format!("{name}={value:?}: {reason}"))
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> DistributionResult<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    var(name)
        .map(|value| value.parse::<T>().map_err(|e| invalid(name, &value, e)))
        .transpose()
}

fn required_address(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> DistributionResult<Address> {
    parsed(var, name)?.ok_or_else(|| DistributionError::Config(format!("{name} is required")))
}

fn gwei(var: &impl Fn(&str) -> Option<String>, name: &str) -> DistributionResult<Option<u128>> {
    var(name)
        .map(|value| parse_gwei(&value).map_err(|e| invalid(name, &value, e)))
        .transpose()
}

fn flag(var: &impl Fn(&str) -> Option<String>, name: &str) -> DistributionResult<bool> {
    let Some(value) = var(name) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(invalid(name, &value, "expected true or false")),
    }
}
