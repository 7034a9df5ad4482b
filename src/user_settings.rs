use crate::contracts::{AirdropMode, ContractOverride};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "tsender_settings.json";

/// Directory where settings, drafts and the operation log live.
///
/// Falls back to the current directory when the platform has no config dir.
pub fn app_data_dir() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        let app_dir = config_dir.join("tsender");
        if !app_dir.exists() {
            let _ = fs::create_dir_all(&app_dir);
        }
        app_dir
    } else {
        PathBuf::from(".")
    }
}

fn default_ledger_refresh_interval() -> u64 {
    5
}

/// User settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Selected network chain ID
    pub selected_chain_id: u64,
    /// Custom RPC overrides per chain ID
    #[serde(default)]
    pub custom_rpcs: HashMap<u64, String>,
    /// Deployment address overrides per chain ID
    #[serde(default)]
    pub contract_overrides: HashMap<u64, ContractOverride>,
    /// Mode the form was last used in
    #[serde(default)]
    pub last_mode: AirdropMode,
    /// Auto-refresh interval for the wallet status (seconds, 0 disables)
    #[serde(default = "default_ledger_refresh_interval")]
    pub ledger_refresh_interval_secs: u64,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            selected_chain_id: 11155111, // Sepolia by default
            custom_rpcs: HashMap::new(),
            contract_overrides: HashMap::new(),
            last_mode: AirdropMode::Safe,
            ledger_refresh_interval_secs: default_ledger_refresh_interval(),
        }
    }
}

impl UserSettings {
    fn settings_path() -> PathBuf {
        app_data_dir().join(SETTINGS_FILE)
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(settings) => {
                        tracing::info!("Loaded settings from {:?}", path);
                        return settings;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse settings file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read settings file: {}", e);
                }
            }
        }
        tracing::info!("Using default settings");
        Self::default()
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get the settings file path for display
    pub fn settings_path_display() -> String {
        Self::settings_path().display().to_string()
    }

    /// Get custom RPC for a chain, or None if using default
    pub fn get_custom_rpc(&self, chain_id: u64) -> Option<&String> {
        self.custom_rpcs.get(&chain_id).filter(|s| !s.is_empty())
    }

    /// Set custom RPC for a chain (empty string removes the override)
    pub fn set_custom_rpc(&mut self, chain_id: u64, rpc: String) {
        if rpc.trim().is_empty() {
            self.custom_rpcs.remove(&chain_id);
        } else {
            self.custom_rpcs.insert(chain_id, rpc.trim().to_string());
        }
    }

    /// Set one deployment override for a chain (empty string clears it).
    /// The chain entry is dropped once both addresses are cleared.
    pub fn set_contract_override(&mut self, chain_id: u64, mode: AirdropMode, address: String) {
        let trimmed = address.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
        let entry = self.contract_overrides.entry(chain_id).or_default();
        match mode {
            AirdropMode::Safe => entry.tsender = value,
            AirdropMode::Unsafe => entry.no_check = value,
        }
        if entry.tsender.is_none() && entry.no_check.is_none() {
            self.contract_overrides.remove(&chain_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tsender_settings_{}_{}.json", name, std::process::id()))
    }

    // ==================== UserSettings::default tests ====================

    #[test]
    fn test_user_settings_default_values() {
        let settings = UserSettings::default();
        assert_eq!(settings.selected_chain_id, 11155111); // Sepolia
        assert!(settings.custom_rpcs.is_empty());
        assert!(settings.contract_overrides.is_empty());
        assert_eq!(settings.last_mode, AirdropMode::Safe);
        assert_eq!(settings.ledger_refresh_interval_secs, 5);
    }

    // ==================== get_custom_rpc / set_custom_rpc tests ====================

    #[test]
    fn test_set_and_get_custom_rpc() {
        let mut settings = UserSettings::default();
        settings.set_custom_rpc(1, " https://my-node.example ".to_string());
        assert_eq!(settings.get_custom_rpc(1).unwrap(), "https://my-node.example");
        assert!(settings.get_custom_rpc(10).is_none());
    }

    #[test]
    fn test_set_empty_custom_rpc_removes_override() {
        let mut settings = UserSettings::default();
        settings.set_custom_rpc(1, "https://my-node.example".to_string());
        settings.set_custom_rpc(1, "   ".to_string());
        assert!(settings.get_custom_rpc(1).is_none());
        assert!(settings.custom_rpcs.is_empty());
    }

    // ==================== set_contract_override tests ====================

    #[test]
    fn test_set_contract_override_per_mode() {
        let mut settings = UserSettings::default();
        settings.set_contract_override(1, AirdropMode::Unsafe, "0xabc".to_string());
        let entry = settings.contract_overrides.get(&1).unwrap();
        assert_eq!(entry.no_check.as_deref(), Some("0xabc"));
        assert!(entry.tsender.is_none());
    }

    #[test]
    fn test_clearing_both_overrides_removes_chain_entry() {
        let mut settings = UserSettings::default();
        settings.set_contract_override(1, AirdropMode::Safe, "0xabc".to_string());
        settings.set_contract_override(1, AirdropMode::Unsafe, "0xdef".to_string());
        settings.set_contract_override(1, AirdropMode::Safe, "".to_string());
        assert!(settings.contract_overrides.contains_key(&1));
        settings.set_contract_override(1, AirdropMode::Unsafe, " ".to_string());
        assert!(!settings.contract_overrides.contains_key(&1));
    }

    // ==================== serialization tests ====================

    #[test]
    fn test_deserialize_fills_missing_fields_with_defaults() {
        let settings: UserSettings = serde_json::from_str(r#"{"selected_chain_id": 1}"#).unwrap();
        assert_eq!(settings.selected_chain_id, 1);
        assert_eq!(settings.last_mode, AirdropMode::Safe);
        assert_eq!(settings.ledger_refresh_interval_secs, 5);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let path = temp_settings_path("round_trip");
        let mut settings = UserSettings::default();
        settings.selected_chain_id = 31337;
        settings.last_mode = AirdropMode::Unsafe;
        settings.set_custom_rpc(31337, "http://127.0.0.1:8546".to_string());
        settings.set_contract_override(31337, AirdropMode::Safe, "0x01".to_string());

        settings.save_to(&path).unwrap();
        let loaded = UserSettings::load_from(&path);
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_defaults() {
        let path = temp_settings_path("corrupt");
        fs::write(&path, "{ not json").unwrap();
        let loaded = UserSettings::load_from(&path);
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, UserSettings::default());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let loaded = UserSettings::load_from(&temp_settings_path("missing"));
        assert_eq!(loaded, UserSettings::default());
    }
}
