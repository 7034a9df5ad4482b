//! Entry points the GUI runs as background jobs: sending an airdrop with the
//! configured wallet, and reading token details for the form.

use crate::chain::{ChainError, EthersGateway, TokenDetails, TokenReader};
use crate::config::Config;
use crate::operation_log;
use crate::orchestrator::{
    self, AirdropRequest, ErrorKind, SubmissionError, SubmissionOutcome, SubmissionPhase, TransferOrchestrator,
};
use crate::utils;
use crate::wallet::{self, ConnectedWallet};
use anyhow::{anyhow, Result};
use ethers::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

/// Send an airdrop through the configured wallet.
///
/// The request is validated before the wallet is opened, so input errors
/// never reach the device. Confirmed and failed on-chain attempts are
/// appended to the operation log.
pub async fn send_airdrop(
    config: &Config,
    request: AirdropRequest,
    progress: UnboundedSender<SubmissionPhase>,
) -> Result<SubmissionOutcome, SubmissionError> {
    // Once the orchestrator runs it publishes every phase itself
    let result = match open_wallet(config, &request).await {
        Ok((provider, ConnectedWallet::Ledger(ledger))) => submit_with(provider, ledger, &request, progress).await,
        Ok((provider, ConnectedWallet::Local(local))) => submit_with(provider, local, &request, progress).await,
        Err(e) => {
            warn!("Airdrop not started: {}", e);
            let _ = progress.send(SubmissionPhase::Failed {
                kind: e.kind(),
                message: e.to_string(),
            });
            Err(e)
        }
    };
    record(config.chain_id, &request, &result);
    result
}

async fn open_wallet(
    config: &Config,
    request: &AirdropRequest,
) -> Result<(Provider<Http>, ConnectedWallet), SubmissionError> {
    orchestrator::validate(request)?;

    let provider = config
        .get_provider()
        .await
        .map_err(|e| ChainError::Rpc(e.to_string()))?;
    let signer = wallet::connect(config.wallet, config.chain_id)
        .await
        .map_err(|e| ChainError::Wallet(e.to_string()))?;
    info!("Submitting airdrop from {:?} on chain {}", signer.address(), config.chain_id);
    Ok(((*provider).clone(), signer))
}

async fn submit_with<S: Signer + 'static>(
    provider: Provider<Http>,
    signer: S,
    request: &AirdropRequest,
    progress: UnboundedSender<SubmissionPhase>,
) -> Result<SubmissionOutcome, SubmissionError> {
    let gateway = EthersGateway::with_signer(provider, signer);
    TransferOrchestrator::new(&gateway)
        .with_progress(progress)
        .submit(request)
        .await
}

fn record(chain_id: u64, request: &AirdropRequest, result: &Result<SubmissionOutcome, SubmissionError>) {
    let logged = match result {
        Ok(outcome) => operation_log::append_log("airdrop", chain_id, describe_outcome(outcome)),
        Err(e) if e.kind() != ErrorKind::Input => operation_log::append_log(
            "airdrop_failed",
            chain_id,
            format!(
                "Mode: {}\nToken: {}\nContract: {:?}\nError: {}",
                request.mode.display_name(),
                request.token_address.trim(),
                request.contract,
                e
            ),
        ),
        Err(_) => return,
    };
    if let Err(e) = logged {
        warn!("Failed to write operation log: {}", e);
    }
}

/// Operation log body for a confirmed airdrop
pub fn describe_outcome(outcome: &SubmissionOutcome) -> String {
    let approval = match &outcome.approval {
        Some(inclusion) => format!("{:?} (block {:?})", inclusion.tx_hash, inclusion.block_number),
        None => "not needed".to_string(),
    };
    format!(
        "TSender airdrop confirmed ({})\nToken: {:?}\nContract: {:?}\nRecipients: {}\nTotal (smallest units): {}\nApproval: {}\nTx hash: {:?}\nBlock: {:?}\nGas used: {}",
        outcome.mode.display_name(),
        outcome.token,
        outcome.contract,
        outcome.recipient_count,
        outcome.total,
        approval,
        outcome.transfer.tx_hash,
        outcome.transfer.block_number,
        outcome.transfer.gas_used
    )
}

/// Read name, decimals and the owner's balance of `token`. No wallet needed.
pub async fn fetch_token_details(config: &Config, token: &str, owner: Address) -> Result<TokenDetails> {
    let token = token
        .trim()
        .parse::<Address>()
        .map_err(|_| anyhow!("'{}' is not a valid token address", token.trim()))?;
    let provider = config.get_provider().await?;
    let reader = EthersGateway::new(provider, owner);
    let details = reader.token_details(token, owner).await?;
    info!(
        "Token {:?}: {} ({} decimals), balance {}",
        token,
        details.name,
        details.decimals,
        utils::format_token_amount(details.balance, details.decimals)
    );
    Ok(details)
}
