//! Wallet connection: a Ledger hardware wallet through ethers-rs native
//! support, or a local private key (handy against anvil).
//!
//! Signing itself happens inside the wallet; this module only opens the
//! connection, reports its status and turns device errors into messages a
//! user can act on.

use crate::ledger_lock;
use anyhow::{anyhow, Result};
use ethers::prelude::*;
use ethers::signers::{HDPath, Ledger};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Env var holding the hex private key when `TSENDER_WALLET=private-key`
pub const PRIVATE_KEY_ENV_VAR: &str = "TSENDER_PRIVATE_KEY";

/// Maximum number of connection attempts for transient HID errors
const MAX_RETRY_ATTEMPTS: usize = 5;

/// Base delay between retries in milliseconds (multiplied by attempt number)
const RETRY_BASE_DELAY_MS: u64 = 300;

/// How the application reaches the user's wallet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletConnector {
    /// Ledger Live derivation path m/44'/60'/{account_index}'/0/0
    Ledger { account_index: u32 },
    /// Key read from `TSENDER_PRIVATE_KEY`
    PrivateKey,
}

impl WalletConnector {
    pub fn display_name(&self) -> String {
        match self {
            WalletConnector::Ledger { account_index } => format!("Ledger (account {})", account_index),
            WalletConnector::PrivateKey => "Private key".to_string(),
        }
    }
}

impl FromStr for WalletConnector {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "ledger" => Ok(WalletConnector::Ledger { account_index: 0 }),
            "private-key" | "private_key" | "key" => Ok(WalletConnector::PrivateKey),
            other => {
                let index = other
                    .strip_prefix("ledger:")
                    .ok_or_else(|| anyhow!("Unknown wallet connector '{}'", s))?;
                let account_index = index
                    .trim()
                    .parse::<u32>()
                    .map_err(|_| anyhow!("Invalid Ledger account index '{}'", index))?;
                Ok(WalletConnector::Ledger { account_index })
            }
        }
    }
}

/// Connection state shown in the header
#[derive(Debug, Clone, PartialEq)]
pub enum WalletStatus {
    Disconnected,
    Connecting,
    Connected { address: Address },
    Locked,
    Error(String),
}

impl WalletStatus {
    pub fn address(&self) -> Option<Address> {
        match self {
            WalletStatus::Connected { address } => Some(*address),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WalletStatus::Connected { .. })
    }
}

impl fmt::Display for WalletStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletStatus::Disconnected => write!(f, "Not connected"),
            WalletStatus::Connecting => write!(f, "Connecting..."),
            WalletStatus::Connected { address } => write!(f, "{}", short_address(address)),
            WalletStatus::Locked => write!(f, "Wallet locked"),
            WalletStatus::Error(e) => write!(f, "Error: {}", e),
        }
    }
}

/// `0x1234…abcd` form of an address
pub fn short_address(address: &Address) -> String {
    let full = format!("{:?}", address);
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}

/// An open wallet, ready to sign for one chain
pub enum ConnectedWallet {
    Ledger(Ledger),
    Local(LocalWallet),
}

impl ConnectedWallet {
    pub fn address(&self) -> Address {
        match self {
            ConnectedWallet::Ledger(ledger) => ledger.address(),
            ConnectedWallet::Local(wallet) => wallet.address(),
        }
    }
}

/// Open the configured wallet for `chain_id`.
pub async fn connect(connector: WalletConnector, chain_id: u64) -> Result<ConnectedWallet> {
    match connector {
        WalletConnector::Ledger { account_index } => {
            connect_ledger(account_index, chain_id).await.map(ConnectedWallet::Ledger)
        }
        WalletConnector::PrivateKey => load_private_key(chain_id).map(ConnectedWallet::Local),
    }
}

/// Connect to the wallet and report its status for the header
pub async fn check_status(connector: WalletConnector, chain_id: u64) -> WalletStatus {
    match connect(connector, chain_id).await {
        Ok(wallet) => WalletStatus::Connected { address: wallet.address() },
        Err(e) => {
            let err_str = e.to_string();
            if is_locked_error(&err_str) {
                WalletStatus::Locked
            } else if is_disconnected_error(&err_str) {
                WalletStatus::Disconnected
            } else {
                WalletStatus::Error(err_str.chars().take(60).collect())
            }
        }
    }
}

fn load_private_key(chain_id: u64) -> Result<LocalWallet> {
    let key = env::var(PRIVATE_KEY_ENV_VAR)
        .map_err(|_| anyhow!("{} is not set", PRIVATE_KEY_ENV_VAR))?;
    let wallet = key
        .trim()
        .trim_start_matches("0x")
        .parse::<LocalWallet>()
        .map_err(|e| anyhow!("Invalid private key in {}: {}", PRIVATE_KEY_ENV_VAR, e))?;
    info!("Loaded local wallet {:?}", wallet.address());
    Ok(wallet.with_chain_id(chain_id))
}

fn ledger_hd_path(account_index: u32) -> HDPath {
    HDPath::LedgerLive(account_index as usize)
}

/// Connect to the Ledger, retrying transient HID errors. Nothing is signed
/// here, so retrying cannot duplicate a transaction.
async fn connect_ledger(account_index: u32, chain_id: u64) -> Result<Ledger> {
    for attempt in 1..=MAX_RETRY_ATTEMPTS {
        let lock = ledger_lock::ledger_lock().lock().await;

        info!(
            "Connecting to Ledger account {} for chain {} (attempt {}/{})",
            account_index, chain_id, attempt, MAX_RETRY_ATTEMPTS
        );

        match Ledger::new(ledger_hd_path(account_index), chain_id).await {
            Ok(ledger) => {
                info!("Ledger connected: {:?}", ledger.address());
                return Ok(ledger);
            }
            Err(e) => {
                let err_str = e.to_string();
                if is_locked_error(&err_str) || is_disconnected_error(&err_str) {
                    return Err(map_wallet_error(e));
                }
                if attempt < MAX_RETRY_ATTEMPTS {
                    warn!("Ledger error (attempt {}): {}, retrying...", attempt, err_str);
                    drop(lock);
                    sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * attempt as u64)).await;
                    continue;
                }
                return Err(map_wallet_error(e));
            }
        }
    }

    Err(anyhow!("Failed to connect to Ledger after {} attempts", MAX_RETRY_ATTEMPTS))
}

/// Check if an error indicates the device is locked or the app not open
pub fn is_locked_error(err_str: &str) -> bool {
    let lower = err_str.to_lowercase();
    lower.contains("locked")
        || lower.contains("6983")
        || lower.contains("6985")
        || lower.contains("not open")
}

/// Check if an error indicates the device is not connected
pub fn is_disconnected_error(err_str: &str) -> bool {
    let lower = err_str.to_lowercase();
    lower.contains("device not found")
        || lower.contains("no device")
        || lower.contains("not connected")
}

/// Check if an error came from the wallet rather than the chain: the user
/// declined, or the device could not be reached.
pub fn is_wallet_error(err_str: &str) -> bool {
    let lower = err_str.to_lowercase();
    lower.contains("denied")
        || lower.contains("rejected")
        || lower.contains("ledger")
        || lower.contains("apdu")
        || lower.contains("hidapi")
        || lower.contains("signer")
        || is_locked_error(&lower)
        || is_disconnected_error(&lower)
}

/// Map wallet errors to user-friendly messages
fn map_wallet_error<E: fmt::Display>(e: E) -> anyhow::Error {
    let err_str = e.to_string();
    error!("Wallet error: {}", err_str);

    let lower = err_str.to_lowercase();
    if is_disconnected_error(&lower) || lower.contains("hidapi") {
        anyhow!("Ledger device not found. Please ensure it's connected and unlocked.")
    } else if is_locked_error(&lower) {
        anyhow!("Ledger is locked or Ethereum app is not open.")
    } else if lower.contains("denied") || lower.contains("rejected") {
        anyhow!("Request was rejected on the Ledger device.")
    } else if lower.contains("busy") {
        anyhow!("Ledger device is busy. Please wait and try again.")
    } else {
        anyhow!("Ledger error: {}", err_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== WalletConnector parsing tests ====================

    #[test]
    fn test_parse_connector_ledger_default_account() {
        let connector: WalletConnector = "ledger".parse().unwrap();
        assert_eq!(connector, WalletConnector::Ledger { account_index: 0 });
    }

    #[test]
    fn test_parse_connector_ledger_with_account() {
        let connector: WalletConnector = " Ledger:3 ".parse().unwrap();
        assert_eq!(connector, WalletConnector::Ledger { account_index: 3 });
    }

    #[test]
    fn test_parse_connector_private_key_aliases() {
        for raw in ["private-key", "private_key", "KEY"] {
            let connector: WalletConnector = raw.parse().unwrap();
            assert_eq!(connector, WalletConnector::PrivateKey);
        }
    }

    #[test]
    fn test_parse_connector_invalid() {
        assert!("metamask".parse::<WalletConnector>().is_err());
        assert!("ledger:abc".parse::<WalletConnector>().is_err());
        assert!("".parse::<WalletConnector>().is_err());
    }

    // ==================== error classification tests ====================

    #[test]
    fn test_is_locked_error() {
        assert!(is_locked_error("Device is locked"));
        assert!(is_locked_error("Error 6983"));
        assert!(is_locked_error("App not open"));
        assert!(!is_locked_error("device not found"));
    }

    #[test]
    fn test_is_disconnected_error() {
        assert!(is_disconnected_error("Device not found"));
        assert!(is_disconnected_error("hidapi: no device found"));
        assert!(!is_disconnected_error("locked"));
    }

    #[test]
    fn test_is_wallet_error() {
        assert!(is_wallet_error("LedgerError: APDU 6985"));
        assert!(is_wallet_error("User rejected the request"));
        assert!(is_wallet_error("Request denied"));
        assert!(!is_wallet_error("(code: -32000, message: nonce too low)"));
        assert!(!is_wallet_error("error sending request for url"));
    }

    // ==================== WalletStatus tests ====================

    #[test]
    fn test_wallet_status_address() {
        let address = Address::from_low_u64_be(7);
        let status = WalletStatus::Connected { address };
        assert!(status.is_connected());
        assert_eq!(status.address(), Some(address));
        assert!(WalletStatus::Locked.address().is_none());
    }

    #[test]
    fn test_short_address() {
        let address: Address = "0x742d35cc6634c0532925a3b844bc454e4438f44e".parse().unwrap();
        assert_eq!(short_address(&address), "0x742d…f44e");
    }

    #[test]
    fn test_private_key_wallet_uses_chain_id() {
        // anvil account #0
        std::env::set_var(
            PRIVATE_KEY_ENV_VAR,
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        );
        let wallet = load_private_key(31337).unwrap();
        assert_eq!(wallet.chain_id(), 31337);
        assert_eq!(
            wallet.address(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".parse::<Address>().unwrap()
        );
    }
}
