use crate::wallet::WalletConnector;
use anyhow::Result;
use ethers::providers::{Http, Provider};
use std::env;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Required: selects how the app connects to the user's wallet
pub const WALLET_ENV_VAR: &str = "TSENDER_WALLET";

/// Optional: overrides the RPC endpoint of the selected chain
pub const RPC_URL_ENV_VAR: &str = "TSENDER_RPC_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("TSENDER_WALLET is not defined. Please set it in your .env file (ledger, ledger:<index> or private-key)")]
    MissingWallet,
    #[error("TSENDER_WALLET has an unsupported value '{0}' (expected ledger, ledger:<index> or private-key)")]
    InvalidWallet(String),
}

/// Network category for grouping in the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkCategory {
    Mainnet,
    Testnet,
    Local,
}

/// A network the wallet may connect to. `explorer` is the block explorer
/// base URL, absent for local chains.
#[derive(Clone, Debug)]
pub struct EvmNetwork {
    pub label: &'static str,
    pub chain_id: u64,
    pub default_rpc: &'static str,
    pub explorer: Option<&'static str>,
    pub category: NetworkCategory,
}

const fn mainnet(label: &'static str, chain_id: u64, default_rpc: &'static str, explorer: &'static str) -> EvmNetwork {
    EvmNetwork {
        label,
        chain_id,
        default_rpc,
        explorer: Some(explorer),
        category: NetworkCategory::Mainnet,
    }
}

pub const NETWORKS: &[EvmNetwork] = &[
    mainnet("Ethereum", 1, "https://ethereum-rpc.publicnode.com", "https://etherscan.io"),
    mainnet("Optimism", 10, "https://mainnet.optimism.io", "https://optimistic.etherscan.io"),
    mainnet("Arbitrum One", 42161, "https://arb1.arbitrum.io/rpc", "https://arbiscan.io"),
    mainnet("Base", 8453, "https://mainnet.base.org", "https://basescan.org"),
    mainnet("zkSync Era", 324, "https://mainnet.era.zksync.io", "https://explorer.zksync.io"),
    EvmNetwork {
        label: "Sepolia",
        chain_id: 11155111,
        default_rpc: "https://ethereum-sepolia-rpc.publicnode.com",
        explorer: Some("https://sepolia.etherscan.io"),
        category: NetworkCategory::Testnet,
    },
    EvmNetwork {
        label: "Anvil",
        chain_id: 31337,
        default_rpc: "http://127.0.0.1:8545",
        explorer: None,
        category: NetworkCategory::Local,
    },
];

pub fn find_network_by_chain_id(chain_id: u64) -> Option<&'static EvmNetwork> {
    NETWORKS.iter().find(|n| n.chain_id == chain_id)
}

pub fn get_block_explorer_url(chain_id: u64) -> Option<&'static str> {
    find_network_by_chain_id(chain_id).and_then(|n| n.explorer)
}

/// Get the full URL to view a transaction on the block explorer
pub fn get_tx_explorer_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    get_block_explorer_url(chain_id).map(|base| format!("{}/tx/{}", base, tx_hash))
}

/// Get the full URL to view an address on the block explorer
pub fn get_address_explorer_url(chain_id: u64, address: &str) -> Option<String> {
    get_block_explorer_url(chain_id).map(|base| format!("{}/address/{}", base, address))
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub wallet: WalletConnector,
    // Overrides for RPCs that are not in NETWORKS
    pub label_override: Option<String>,
}

impl Config {
    pub fn new(rpc_url: String, chain_id: u64, wallet: WalletConnector) -> Self {
        Self {
            rpc_url,
            chain_id,
            wallet,
            label_override: None,
        }
    }

    pub fn from_network(network: &EvmNetwork, wallet: WalletConnector) -> Self {
        Self::new(network.default_rpc.to_string(), network.chain_id, wallet)
    }

    /// Build the startup config from the environment.
    ///
    /// The wallet connector is mandatory: the application refuses to start
    /// without it. The chain defaults to Sepolia and is later replaced by the
    /// user's saved selection.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw = env::var(WALLET_ENV_VAR).map_err(|_| ConfigError::MissingWallet)?;
        let wallet = raw
            .parse::<WalletConnector>()
            .map_err(|_| ConfigError::InvalidWallet(raw.clone()))?;

        let mut config = Self::with_wallet(wallet);
        if let Some(rpc) = env::var(RPC_URL_ENV_VAR).ok().filter(|v| !v.trim().is_empty()) {
            config.rpc_url = rpc.trim().to_string();
        }
        Ok(config)
    }

    /// Default network (Sepolia) with the given wallet
    pub fn with_wallet(wallet: WalletConnector) -> Self {
        match find_network_by_chain_id(11155111) {
            Some(sepolia) => Self::from_network(sepolia, wallet),
            None => Self::new("https://rpc.sepolia.org".to_string(), 11155111, wallet),
        }
    }

    pub fn network_label(&self) -> &str {
        if let Some(ref label) = self.label_override {
            label.as_str()
        } else {
            find_network_by_chain_id(self.chain_id)
                .map(|n| n.label)
                .unwrap_or("Unknown")
        }
    }

    pub async fn get_provider(&self) -> Result<Arc<Provider<Http>>> {
        let url = Url::parse(&self.rpc_url)?;
        let provider = Provider::<Http>::try_from(url.as_str())?;
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== find_network_by_chain_id tests ====================

    #[test]
    fn test_find_network_by_chain_id_ethereum() {
        let network = find_network_by_chain_id(1);
        assert!(network.is_some());
        let network = network.unwrap();
        assert_eq!(network.label, "Ethereum");
        assert_eq!(network.explorer, Some("https://etherscan.io"));
    }

    #[test]
    fn test_find_network_by_chain_id_anvil() {
        let network = find_network_by_chain_id(31337).unwrap();
        assert_eq!(network.category, NetworkCategory::Local);
    }

    #[test]
    fn test_find_network_by_chain_id_not_found() {
        assert!(find_network_by_chain_id(999999).is_none());
    }

    // ==================== explorer URL tests ====================

    #[test]
    fn test_get_tx_explorer_url_known_chain() {
        let url = get_tx_explorer_url(11155111, "0xabc").unwrap();
        assert_eq!(url, "https://sepolia.etherscan.io/tx/0xabc");
    }

    #[test]
    fn test_get_address_explorer_url_known_chain() {
        let url = get_address_explorer_url(8453, "0xdef").unwrap();
        assert_eq!(url, "https://basescan.org/address/0xdef");
    }

    #[test]
    fn test_every_non_local_network_has_an_explorer() {
        for network in NETWORKS {
            assert_eq!(network.explorer.is_none(), network.category == NetworkCategory::Local, "{}", network.label);
        }
    }

    #[test]
    fn test_explorer_url_local_chain_is_none() {
        assert!(get_tx_explorer_url(31337, "0xabc").is_none());
    }

    // ==================== Config tests ====================

    #[test]
    fn test_config_with_wallet_defaults_to_sepolia() {
        let config = Config::with_wallet(WalletConnector::PrivateKey);
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.network_label(), "Sepolia");
    }

    #[test]
    fn test_config_network_label_override() {
        let mut config = Config::new("http://localhost:8545".to_string(), 999999, WalletConnector::PrivateKey);
        assert_eq!(config.network_label(), "Unknown");
        config.label_override = Some("Devnet".to_string());
        assert_eq!(config.network_label(), "Devnet");
    }

    #[test]
    fn test_config_from_network() {
        let network = find_network_by_chain_id(42161).unwrap();
        let config = Config::from_network(network, WalletConnector::Ledger { account_index: 2 });
        assert_eq!(config.chain_id, 42161);
        assert_eq!(config.rpc_url, "https://arb1.arbitrum.io/rpc");
        assert_eq!(config.wallet, WalletConnector::Ledger { account_index: 2 });
    }

    #[test]
    fn test_config_error_messages_name_the_variable() {
        assert!(ConfigError::MissingWallet.to_string().contains(WALLET_ENV_VAR));
        assert!(ConfigError::InvalidWallet("x".into()).to_string().contains("'x'"));
    }
}
