//! Contract bindings and the per-chain TSender deployment table.
//!
//! Each chain may host two deployments: the default TSender contract, which
//! validates its inputs on-chain, and a "no check" variant that skips those
//! checks for lower gas. Which one is used depends on the [`AirdropMode`].

use ethers::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

abigen!(
    IERC20,
    r#"[
        function decimals() external view returns (uint8)
        function name() external view returns (string)
        function balanceOf(address account) external view returns (uint256)
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
    ]"#,
);

abigen!(
    TSender,
    r#"[
        function airdropERC20(address tokenAddress, address[] recipients, uint256[] amounts, uint256 totalAmount) external
    ]"#,
);

/// Which TSender deployment an airdrop goes through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirdropMode {
    /// Contract validates recipients and amounts on-chain
    #[default]
    Safe,
    /// Gas-optimised contract without on-chain input validation
    Unsafe,
}

impl AirdropMode {
    pub fn is_unsafe(&self) -> bool {
        matches!(self, AirdropMode::Unsafe)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AirdropMode::Safe => "Safe Mode",
            AirdropMode::Unsafe => "Unsafe Mode",
        }
    }

    /// Label used for the deployment in messages and the operation log
    pub fn contract_kind(&self) -> &'static str {
        match self {
            AirdropMode::Safe => "tsender",
            AirdropMode::Unsafe => "no_check",
        }
    }
}

/// Known deployments for one chain
#[derive(Clone, Copy, Debug)]
pub struct TSenderDeployment {
    pub chain_id: u64,
    pub tsender: &'static str,
    pub no_check: Option<&'static str>,
}

impl TSenderDeployment {
    const fn new(chain_id: u64, tsender: &'static str, no_check: Option<&'static str>) -> Self {
        Self {
            chain_id,
            tsender,
            no_check,
        }
    }

    pub fn address_for(&self, mode: AirdropMode) -> Option<&'static str> {
        match mode {
            AirdropMode::Safe => Some(self.tsender),
            AirdropMode::Unsafe => self.no_check,
        }
    }
}

pub const TSENDER_DEPLOYMENTS: &[TSenderDeployment] = &[
    TSenderDeployment::new(1, "0x3aD9F29AB266E4828450B33df7a9B9D7355Cd821", None),
    TSenderDeployment::new(10, "0xAaF523DF9455cC7B6ca5637D01624BC00a5e9fAa", None),
    TSenderDeployment::new(42161, "0xA2b5aEDF7EEF6469AB9cBD99DE24a6881702Eb19", None),
    TSenderDeployment::new(8453, "0x31801c3e09708549c1b2c9E1CFbF001399a1B9fa", None),
    TSenderDeployment::new(324, "0x7e645Ea4386deb2E9e510D805461aA12db83fb5E", None),
    TSenderDeployment::new(
        11155111,
        "0xa27c5C77DA713f410F9b15d4B0c52CAe597a973a",
        Some("0xa27c5C77DA713f410F9b15d4B0c52CAe597a973a"),
    ),
    // Default deployment addresses of the first two contracts created by anvil's first account
    TSenderDeployment::new(
        31337,
        "0x5FbDB2315678afecb367f032d93F642f64180aa3",
        Some("0xe7f1725E7734CE288F8367e1Bb143E90bb3F0512"),
    ),
];

/// User-supplied deployment addresses for one chain. Either entry may be left
/// unset to fall back to the built-in table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractOverride {
    #[serde(default)]
    pub tsender: Option<String>,
    #[serde(default)]
    pub no_check: Option<String>,
}

impl ContractOverride {
    fn address_for(&self, mode: AirdropMode) -> Option<&str> {
        let raw = match mode {
            AirdropMode::Safe => self.tsender.as_deref(),
            AirdropMode::Unsafe => self.no_check.as_deref(),
        };
        raw.map(str::trim).filter(|s| !s.is_empty())
    }
}

pub fn find_deployment(chain_id: u64) -> Option<&'static TSenderDeployment> {
    TSENDER_DEPLOYMENTS.iter().find(|d| d.chain_id == chain_id)
}

/// Resolve the TSender contract for a chain and mode.
///
/// A user override wins over the built-in table. Returns `None` when neither
/// provides a parseable address, in which case no airdrop can be sent.
pub fn resolve_tsender_address(
    chain_id: u64,
    mode: AirdropMode,
    overrides: &HashMap<u64, ContractOverride>,
) -> Option<Address> {
    if let Some(raw) = overrides.get(&chain_id).and_then(|o| o.address_for(mode)) {
        match raw.parse::<Address>() {
            Ok(address) => return Some(address),
            Err(_) => warn!(
                "Ignoring invalid {} override '{}' for chain {}",
                mode.contract_kind(),
                raw,
                chain_id
            ),
        }
    }

    find_deployment(chain_id)
        .and_then(|d| d.address_for(mode))
        .and_then(|raw| raw.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> HashMap<u64, ContractOverride> {
        HashMap::new()
    }

    #[test]
    fn test_all_builtin_addresses_parse() {
        for deployment in TSENDER_DEPLOYMENTS {
            assert!(deployment.tsender.parse::<Address>().is_ok(), "chain {}", deployment.chain_id);
            if let Some(no_check) = deployment.no_check {
                assert!(no_check.parse::<Address>().is_ok(), "chain {}", deployment.chain_id);
            }
        }
    }

    #[test]
    fn test_resolve_safe_mode_mainnet() {
        let addr = resolve_tsender_address(1, AirdropMode::Safe, &no_overrides()).unwrap();
        assert_eq!(addr, "0x3aD9F29AB266E4828450B33df7a9B9D7355Cd821".parse::<Address>().unwrap());
    }

    #[test]
    fn test_resolve_unsafe_mode_missing_deployment() {
        assert!(resolve_tsender_address(1, AirdropMode::Unsafe, &no_overrides()).is_none());
    }

    #[test]
    fn test_resolve_unknown_chain() {
        assert!(resolve_tsender_address(999999, AirdropMode::Safe, &no_overrides()).is_none());
    }

    #[test]
    fn test_modes_resolve_to_different_contracts_on_anvil() {
        let safe = resolve_tsender_address(31337, AirdropMode::Safe, &no_overrides()).unwrap();
        let unsafe_ = resolve_tsender_address(31337, AirdropMode::Unsafe, &no_overrides()).unwrap();
        assert_ne!(safe, unsafe_);
    }

    #[test]
    fn test_override_wins_over_table() {
        let mut overrides = no_overrides();
        overrides.insert(
            1,
            ContractOverride {
                tsender: None,
                no_check: Some(" 0x0000000000000000000000000000000000000042 ".to_string()),
            },
        );
        let unsafe_ = resolve_tsender_address(1, AirdropMode::Unsafe, &overrides).unwrap();
        assert_eq!(unsafe_, Address::from_low_u64_be(0x42));
        // Safe entry was not overridden
        let safe = resolve_tsender_address(1, AirdropMode::Safe, &overrides).unwrap();
        assert_eq!(safe, "0x3aD9F29AB266E4828450B33df7a9B9D7355Cd821".parse::<Address>().unwrap());
    }

    #[test]
    fn test_invalid_override_falls_back_to_table() {
        let mut overrides = no_overrides();
        overrides.insert(
            31337,
            ContractOverride {
                tsender: Some("not-an-address".to_string()),
                no_check: None,
            },
        );
        let addr = resolve_tsender_address(31337, AirdropMode::Safe, &overrides).unwrap();
        assert_eq!(addr, "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse::<Address>().unwrap());
    }

    #[test]
    fn test_airdrop_mode_labels() {
        assert_eq!(AirdropMode::default(), AirdropMode::Safe);
        assert!(AirdropMode::Unsafe.is_unsafe());
        assert_eq!(AirdropMode::Safe.contract_kind(), "tsender");
        assert_eq!(AirdropMode::Unsafe.contract_kind(), "no_check");
    }
}
