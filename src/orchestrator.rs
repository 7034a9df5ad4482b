//! Sequencing of a single airdrop submission.
//!
//! ```text
//! Idle -> Validating -> CheckingAllowance -+-> (allowance >= total) ----------------------------+
//!                                          |                                                    v
//!                                          +-> Approving -> WaitingForApproval -> Transferring -> WaitingForTransfer -> Confirmed
//! ```
//!
//! Any step may end in `Failed`. Nothing is retried: the user re-submits.
//! The transfer is never sent before the approval it depends on is included.

use crate::amounts::{self, AmountError, AmountList, RecipientError};
use crate::chain::{AirdropCall, ChainError, ChainGateway, Inclusion, TokenReader};
use crate::contracts::{self, AirdropMode, ContractOverride};
use crate::draft::FormDraft;
use ethers::types::{Address, TxHash, U256};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{error, info, warn};

/// How a failure is presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or missing input; shown in a blocking dialog, nothing was sent
    Input,
    /// The wallet declined or could not sign
    Wallet,
    /// RPC failure or on-chain revert
    Chain,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Token address is required.")]
    MissingTokenAddress,
    #[error("Token address '{0}' is not a valid address.")]
    InvalidTokenAddress(String),
    #[error("T-Sender contract address is not available for this chain.")]
    ContractUnavailable { chain_id: u64, mode: AirdropMode },
    #[error("At least one recipient is required.")]
    NoRecipients,
    #[error("{recipients} recipients but {amounts} amounts; every recipient needs exactly one amount.")]
    LengthMismatch { recipients: usize, amounts: usize },
    #[error(transparent)]
    Amounts(#[from] AmountError),
    #[error(transparent)]
    Recipients(#[from] RecipientError),
    #[error(transparent)]
    Chain(#[from] ChainError),
}

impl SubmissionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SubmissionError::Chain(ChainError::Wallet(_)) => ErrorKind::Wallet,
            SubmissionError::Chain(_) => ErrorKind::Chain,
            _ => ErrorKind::Input,
        }
    }
}

/// Raw form values plus the contract resolved for the active chain and mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropRequest {
    pub token_address: String,
    pub recipients: String,
    pub amounts: String,
    pub chain_id: u64,
    pub mode: AirdropMode,
    pub contract: Option<Address>,
}

impl AirdropRequest {
    pub fn from_draft(
        draft: &FormDraft,
        chain_id: u64,
        mode: AirdropMode,
        overrides: &HashMap<u64, ContractOverride>,
    ) -> Self {
        Self {
            token_address: draft.token_address.clone(),
            recipients: draft.recipients.clone(),
            amounts: draft.amounts.clone(),
            chain_id,
            mode,
            contract: contracts::resolve_tsender_address(chain_id, mode, overrides),
        }
    }
}

/// A request that passed validation and can be sent as-is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAirdrop {
    pub contract: Address,
    pub mode: AirdropMode,
    pub call: AirdropCall,
}

/// Check the request without touching the network.
pub fn validate(request: &AirdropRequest) -> Result<ValidatedAirdrop, SubmissionError> {
    let token_raw = request.token_address.trim();
    if token_raw.is_empty() {
        return Err(SubmissionError::MissingTokenAddress);
    }

    let contract = request.contract.ok_or(SubmissionError::ContractUnavailable {
        chain_id: request.chain_id,
        mode: request.mode,
    })?;

    let token = token_raw
        .parse::<Address>()
        .map_err(|_| SubmissionError::InvalidTokenAddress(token_raw.to_string()))?;

    let recipients = amounts::parse_recipients(&request.recipients)?;
    let amount_list = AmountList::parse(&request.amounts)?;

    if recipients.is_empty() {
        return Err(SubmissionError::NoRecipients);
    }
    if recipients.len() != amount_list.len() {
        return Err(SubmissionError::LengthMismatch {
            recipients: recipients.len(),
            amounts: amount_list.len(),
        });
    }

    let total = amount_list.total();
    Ok(ValidatedAirdrop {
        contract,
        mode: request.mode,
        call: AirdropCall {
            token,
            recipients,
            amounts: amount_list.into_vec(),
            total,
        },
    })
}

/// Read how much the request's contract may currently move from `owner`.
///
/// Short-circuits with an input error, without querying, when the token or
/// the contract is missing.
pub async fn check_allowance<R: TokenReader>(
    reader: &R,
    request: &AirdropRequest,
    owner: Address,
) -> Result<U256, SubmissionError> {
    let token_raw = request.token_address.trim();
    if token_raw.is_empty() {
        return Err(SubmissionError::MissingTokenAddress);
    }
    let spender = request.contract.ok_or(SubmissionError::ContractUnavailable {
        chain_id: request.chain_id,
        mode: request.mode,
    })?;
    let token = token_raw
        .parse::<Address>()
        .map_err(|_| SubmissionError::InvalidTokenAddress(token_raw.to_string()))?;

    Ok(reader.allowance(token, owner, spender).await?)
}

/// Transactions needed for an airdrop given the current allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPlan {
    TransferOnly,
    ApproveThenTransfer,
}

pub fn plan_for(allowance: U256, total: U256) -> TransferPlan {
    if allowance < total {
        TransferPlan::ApproveThenTransfer
    } else {
        TransferPlan::TransferOnly
    }
}

/// Progress of a submission, published as it happens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    CheckingAllowance,
    /// Approval is waiting for the user's signature
    Approving,
    WaitingForApproval(TxHash),
    /// Airdrop is waiting for the user's signature
    Transferring,
    WaitingForTransfer(TxHash),
    Confirmed(SubmissionOutcome),
    Failed { kind: ErrorKind, message: String },
}

impl SubmissionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionPhase::Confirmed(_) | SubmissionPhase::Failed { .. })
    }

    pub fn is_awaiting_signature(&self) -> bool {
        matches!(self, SubmissionPhase::Approving | SubmissionPhase::Transferring)
    }

    pub fn is_waiting_for_inclusion(&self) -> bool {
        matches!(
            self,
            SubmissionPhase::WaitingForApproval(_) | SubmissionPhase::WaitingForTransfer(_)
        )
    }
}

/// Result of a confirmed airdrop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub contract: Address,
    pub mode: AirdropMode,
    pub token: Address,
    pub recipient_count: usize,
    pub total: U256,
    pub approval: Option<Inclusion>,
    pub transfer: Inclusion,
}

pub struct TransferOrchestrator<'a, G> {
    gateway: &'a G,
    progress: Option<UnboundedSender<SubmissionPhase>>,
}

impl<'a, G: ChainGateway> TransferOrchestrator<'a, G> {
    pub fn new(gateway: &'a G) -> Self {
        Self {
            gateway,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: UnboundedSender<SubmissionPhase>) -> Self {
        self.progress = Some(progress);
        self
    }

    fn publish(&self, phase: SubmissionPhase) {
        if let Some(tx) = &self.progress {
            // Receiver gone means nobody is watching any more
            let _ = tx.send(phase);
        }
    }

    /// Run one submission to a terminal state.
    pub async fn submit(&self, request: &AirdropRequest) -> Result<SubmissionOutcome, SubmissionError> {
        let result = self.run(request).await;
        match &result {
            Ok(outcome) => self.publish(SubmissionPhase::Confirmed(outcome.clone())),
            Err(e) => {
                match e.kind() {
                    ErrorKind::Input => warn!("Airdrop rejected: {}", e),
                    ErrorKind::Wallet | ErrorKind::Chain => error!("Airdrop failed: {:?}", e),
                }
                self.publish(SubmissionPhase::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                });
            }
        }
        result
    }

    async fn run(&self, request: &AirdropRequest) -> Result<SubmissionOutcome, SubmissionError> {
        self.publish(SubmissionPhase::Validating);
        let validated = validate(request)?;
        let ValidatedAirdrop { contract, mode, call } = validated;

        self.publish(SubmissionPhase::CheckingAllowance);
        let owner = self.gateway.owner();
        let allowance = check_allowance(self.gateway, request, owner).await?;
        let plan = plan_for(allowance, call.total);
        info!(
            "Airdrop of {} to {} recipients via {:?} ({}): allowance {}, plan {:?}",
            call.total,
            call.recipients.len(),
            contract,
            mode.contract_kind(),
            allowance,
            plan
        );

        let approval = match plan {
            TransferPlan::ApproveThenTransfer => {
                self.publish(SubmissionPhase::Approving);
                let approval_hash = self.gateway.approve(call.token, contract, call.total).await?;
                self.publish(SubmissionPhase::WaitingForApproval(approval_hash));
                let inclusion = self.gateway.wait_for_inclusion(approval_hash).await?;
                info!("Approval confirmed: {:?} in block {:?}", approval_hash, inclusion.block_number);
                Some(inclusion)
            }
            TransferPlan::TransferOnly => None,
        };

        self.publish(SubmissionPhase::Transferring);
        let transfer_hash = self.gateway.airdrop(contract, &call).await?;
        self.publish(SubmissionPhase::WaitingForTransfer(transfer_hash));
        let transfer = self.gateway.wait_for_inclusion(transfer_hash).await?;
        info!("Airdrop confirmed: {:?} in block {:?}", transfer_hash, transfer.block_number);

        Ok(SubmissionOutcome {
            contract,
            mode,
            token: call.token,
            recipient_count: call.recipients.len(),
            total: call.total,
            approval,
            transfer,
        })
    }
}
