// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::env;
use std::process::ExitCode;

use alloy::primitives::U256;
use alloy::providers::DynProvider;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

use multisend_distributor::blockchain::erc20::Erc20Contract;
use multisend_distributor::blockchain::signing::signer_from_pem_file;
use multisend_distributor::blockchain::{create_signer, format_amount, MultiSendClient};
use multisend_distributor::config::{DistributorConfig, SenderKey, LOG_FORMAT_ENV};
use multisend_distributor::controller::{BatchController, ControllerSettings};
use multisend_distributor::driver::{starting_state, watch_stop_signals};
use multisend_distributor::models::{RunReport, RunStatus, TransferRecord};
use multisend_distributor::source::{FileSource, TransferSource};
use multisend_distributor::storage::checkpoint::run_key;
use multisend_distributor::storage::{CheckpointStore, CsvAuditLog, OutputPaths};
use multisend_distributor::{DistributionError, DistributionResult, Distributor};

/// Exit code for a run stopped by Ctrl-C.
const EXIT_STOPPED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(report) => {
            tracing::info!(
                status = ?report.status,
                cursor = report.cursor,
                total_records = report.total_records,
                attempts = report.attempts,
                succeeded_batches = report.succeeded_batches,
                failed_attempts = report.failed_attempts,
                final_batch_size = report.final_batch_size,
                total_gas_used = report.total_gas_used,
                "Run finished"
            );
            match report.status {
                RunStatus::Completed => ExitCode::SUCCESS,
                RunStatus::Stopped => ExitCode::from(EXIT_STOPPED),
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Distribution failed");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let json = env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn run() -> DistributionResult<RunReport> {
    let config = DistributorConfig::from_env()?;

    let signer = match &config.sender_key {
        SenderKey::Hex(hex) => create_signer(hex)?,
        SenderKey::PemFile(path) => signer_from_pem_file(path)?,
    };
    let client = MultiSendClient::new(
        config.network.clone(),
        config.rpc_url.as_deref(),
        signer,
        config.multi_send_address,
    )?
    .with_poll_interval(config.receipt_poll_interval);

    // Never send on a chain other than the configured one
    client.verify_chain_id().await?;
    tracing::info!(
        network = client.network().name,
        chain_id = client.network().chain_id,
        explorer = client.network().explorer_url,
        sender = %client.sender(),
        multi_send = %client.multi_send_address(),
        token = %config.token_address,
        "Chain client ready"
    );

    let token = client.token(config.token_address);
    let decimals = match config.token_decimals {
        Some(decimals) => decimals,
        None => token.decimals().await?,
    };

    let transfers = FileSource::new(&config.transfers_path, decimals).load_transfers()?;
    preflight(&client, &token, &transfers, decimals).await;

    let paths = OutputPaths::new(&config.output_dir);
    let audit = CsvAuditLog::open(&paths).map_err(DistributionError::AuditWriteFailed)?;
    let checkpoints =
        CheckpointStore::open(&paths.checkpoint_db()).map_err(DistributionError::AuditWriteFailed)?;
    let key = run_key(&config.transfers_path);
    let state = starting_state(
        &checkpoints,
        &key,
        config.resume,
        config.initial_batch_size,
        transfers.len(),
    )?;

    let settings = ControllerSettings {
        token: config.token_address,
        fees: config.fees,
        gas_limit_buffer_percent: config.gas_limit_buffer_percent,
        confirmation_timeout: config.confirmation_timeout,
        min_batch_size: config.min_batch_size,
    };
    let mut distributor = Distributor::new(BatchController::new(client, settings), audit)
        .with_checkpoint(checkpoints, key);
    tracing::info!(
        run_id = %distributor.run_id(),
        output_dir = %paths.root().display(),
        "Audit logs opened"
    );

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match watch_stop_signals(tokio::signal::ctrl_c, signal).await {
            Ok(()) => {
                tracing::error!("Second Ctrl-C, exiting without waiting for confirmation");
                std::process::exit(i32::from(EXIT_STOPPED));
            }
            Err(e) => tracing::warn!(error = %e, "Ctrl-C handler unavailable"),
        }
    });

    distributor.run(&transfers, state, &shutdown).await
}

/// Log totals against balance and allowance. Never fails the run.
async fn preflight(
    client: &MultiSendClient,
    token: &Erc20Contract<DynProvider>,
    transfers: &[TransferRecord],
    decimals: u8,
) {
    let total = transfers
        .iter()
        .fold(U256::ZERO, |acc, r| acc.saturating_add(r.base_units));
    let symbol = token.symbol().await.unwrap_or_else(|_| "tokens".to_string());
    tracing::info!(
        recipients = transfers.len(),
        total = %format_amount(total, decimals),
        symbol = %symbol,
        "Distribution total"
    );

    let sender = client.sender();
    check_funds("balance", token.balance_of(sender).await, total, decimals);
    check_funds(
        "allowance",
        token.allowance(sender, client.multi_send_address()).await,
        total,
        decimals,
    );
}

fn check_funds(
    what: &str,
    available: Result<U256, impl std::fmt::Display>,
    total: U256,
    decimals: u8,
) {
    match available {
        Ok(available) if available < total => tracing::warn!(
            available = %format_amount(available, decimals),
            required = %format_amount(total, decimals),
            "Sender {what} is below the distribution total"
        ),
        Ok(available) => tracing::info!(
            available = %format_amount(available, decimals),
            "Sender {what} covers the distribution total"
        ),
        Err(e) => tracing::warn!(error = %e, "Could not read sender {what}"),
    }
}
