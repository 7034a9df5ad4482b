//! Typed boundary between the airdrop logic and the blockchain.
//!
//! [`TokenReader`] covers the read-only token queries (metadata, balance,
//! allowance); [`ChainGateway`] adds the two writes an airdrop needs and the
//! wait for inclusion. [`EthersGateway`] implements both over any ethers-rs
//! middleware: a plain provider for reads, a `SignerMiddleware` for writes.

use crate::contracts::{IERC20, TSender};
use crate::wallet;
use ethers::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Interval between receipt polls while waiting for inclusion
const RECEIPT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    /// Signing failed or was declined in the wallet
    #[error("wallet error: {0}")]
    Wallet(String),
    /// Transaction was included but reverted
    #[error("transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: TxHash },
    /// Provider or contract call failure
    #[error("rpc error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// Sort an ethers error into wallet or RPC failure by its message
    pub fn classify<E: std::fmt::Display>(e: E) -> Self {
        let msg = e.to_string();
        if wallet::is_wallet_error(&msg) {
            ChainError::Wallet(msg)
        } else {
            ChainError::Rpc(msg)
        }
    }
}

/// Token metadata shown next to the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDetails {
    pub decimals: u8,
    pub name: String,
    pub balance: U256,
}

impl TokenDetails {
    /// Whether the owner can cover `total`. An empty airdrop never blocks.
    pub fn has_enough_tokens(&self, total: U256) -> bool {
        total.is_zero() || self.balance >= total
    }
}

/// Inclusion data for a confirmed transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inclusion {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Arguments of `airdropERC20(token, recipients, amounts, totalAmount)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropCall {
    pub token: Address,
    pub recipients: Vec<Address>,
    pub amounts: Vec<U256>,
    pub total: U256,
}

#[allow(async_fn_in_trait)]
pub trait TokenReader {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ChainError>;

    async fn token_details(&self, token: Address, owner: Address) -> Result<TokenDetails, ChainError>;
}

#[allow(async_fn_in_trait)]
pub trait ChainGateway: TokenReader {
    /// Account the wallet signs for
    fn owner(&self) -> Address;

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash, ChainError>;

    async fn airdrop(&self, contract: Address, call: &AirdropCall) -> Result<TxHash, ChainError>;

    /// Block until the transaction is included. There is no timeout.
    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<Inclusion, ChainError>;
}

/// ethers-rs backed gateway
pub struct EthersGateway<M> {
    client: Arc<M>,
    owner: Address,
}

impl<M: Middleware + 'static> EthersGateway<M> {
    pub fn new(client: Arc<M>, owner: Address) -> Self {
        Self { client, owner }
    }
}

impl<S: Signer + 'static> EthersGateway<SignerMiddleware<Provider<Http>, S>> {
    /// Gateway that signs with `signer` and broadcasts through `provider`
    pub fn with_signer(provider: Provider<Http>, signer: S) -> Self {
        let owner = signer.address();
        let client = SignerMiddleware::new(provider, signer);
        Self::new(Arc::new(client), owner)
    }
}

impl<M: Middleware + 'static> TokenReader for EthersGateway<M> {
    async fn allowance(&self, token: Address, owner: Address, spender: Address) -> Result<U256, ChainError> {
        let erc20 = IERC20::new(token, self.client.clone());
        let allowance = erc20
            .allowance(owner, spender)
            .call()
            .await
            .map_err(ChainError::classify)?;
        debug!("Allowance of {:?} for {:?} on {:?}: {}", owner, spender, token, allowance);
        Ok(allowance)
    }

    async fn token_details(&self, token: Address, owner: Address) -> Result<TokenDetails, ChainError> {
        let erc20 = IERC20::new(token, self.client.clone());
        let decimals_call = erc20.decimals();
        let name_call = erc20.name();
        let balance_call = erc20.balance_of(owner);
        let (decimals, name, balance) = tokio::try_join!(
            decimals_call.call(),
            name_call.call(),
            balance_call.call(),
        )
        .map_err(ChainError::classify)?;
        Ok(TokenDetails { decimals, name, balance })
    }
}

impl<M: Middleware + 'static> ChainGateway for EthersGateway<M> {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<TxHash, ChainError> {
        let erc20 = IERC20::new(token, self.client.clone());
        let call = erc20.approve(spender, amount).from(self.owner);
        let pending = call.send().await.map_err(ChainError::classify)?;
        let tx_hash = pending.tx_hash();
        info!("Approval sent: {:?} ({} for {:?})", tx_hash, amount, spender);
        Ok(tx_hash)
    }

    async fn airdrop(&self, contract: Address, call: &AirdropCall) -> Result<TxHash, ChainError> {
        let tsender = TSender::new(contract, self.client.clone());
        let tx = tsender
            .airdrop_erc20(
                call.token,
                call.recipients.clone(),
                call.amounts.clone(),
                call.total,
            )
            .from(self.owner);
        let pending = tx.send().await.map_err(ChainError::classify)?;
        let tx_hash = pending.tx_hash();
        info!(
            "Airdrop sent: {:?} ({} recipients, total {})",
            tx_hash,
            call.recipients.len(),
            call.total
        );
        Ok(tx_hash)
    }

    async fn wait_for_inclusion(&self, tx_hash: TxHash) -> Result<Inclusion, ChainError> {
        loop {
            let receipt = self
                .client
                .get_transaction_receipt(tx_hash)
                .await
                .map_err(ChainError::classify)?;

            if let Some(receipt) = receipt {
                if receipt.status == Some(U64::zero()) {
                    return Err(ChainError::Reverted { tx_hash });
                }
                return Ok(Inclusion {
                    tx_hash,
                    block_number: receipt.block_number.map(|n| n.as_u64()),
                    gas_used: receipt.gas_used.map(|g| g.as_u64()).unwrap_or(0),
                });
            }

            tokio::time::sleep(Duration::from_millis(RECEIPT_POLL_INTERVAL_MS)).await;
        }
    }
}
