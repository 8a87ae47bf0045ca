//! Configuration for the bridge CLI.

use crate::errors::CliError;
use bridge::{SessionConfig, NATIVE_TOKEN_VIEW};
use primitives::parse_execution_address;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the native endpoint.
pub const NATIVE_ENDPOINT_VAR: &str = "NATIVE_ENDPOINT";
/// Environment variable overriding the execution-layer endpoint.
pub const EVM_RPC_VAR: &str = "EVM_RPC";
/// Environment variable overriding the token-view contract. Empty disables it.
pub const TOKEN_VIEW_VAR: &str = "TOKEN_VIEW_CONTRACT";

/// Configuration for the bridge CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// WebSocket endpoint of the native node
    pub native_endpoint: String,
    /// JSON-RPC endpoint of the execution layer
    pub execution_endpoint: String,
    /// ERC-20 view of the native asset, if any
    pub token_view_contract: Option<String>,
    /// Amount sent by the funding flow, as a decimal string
    pub demo_amount: String,
    /// Secret URI of the signing account
    pub signer_uri: String,
    /// Upper bound on the finality wait, in seconds
    pub finality_timeout_secs: Option<u64>,
    /// Pallet exposing the transfer call
    pub transfer_pallet: String,
    /// Name of the transfer call
    pub transfer_call: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            native_endpoint: "ws://127.0.0.1:9944".to_string(),
            execution_endpoint: "http://127.0.0.1:8545".to_string(),
            token_view_contract: Some(NATIVE_TOKEN_VIEW.to_string()),
            demo_amount: "10".to_string(),
            signer_uri: "//Alice".to_string(),
            finality_timeout_secs: None,
            transfer_pallet: "Revive".to_string(),
            transfer_call: "transfer".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Loads configuration from a JSON file. Absent keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Saves configuration as JSON, creating the parent directory if needed.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CliError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        dir.push("revive-bridge");
        dir.push("config.json");
        dir
    }

    /// Loads `path`, or the default location when it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Applies environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(endpoint) = lookup(NATIVE_ENDPOINT_VAR) {
            self.native_endpoint = endpoint;
        }
        if let Some(endpoint) = lookup(EVM_RPC_VAR) {
            self.execution_endpoint = endpoint;
        }
        if let Some(contract) = lookup(TOKEN_VIEW_VAR) {
            self.token_view_contract = Some(contract).filter(|c| !c.trim().is_empty());
        }
    }

    /// Settings handed to the bridge session.
    pub fn session_config(&self) -> Result<SessionConfig, CliError> {
        let token_view = match &self.token_view_contract {
            Some(contract) => Some(
                parse_execution_address(contract)
                    .map_err(|e| CliError::ConfigError(format!("token_view_contract: {}", e)))?,
            ),
            None => None,
        };

        Ok(SessionConfig {
            transfer_pallet: self.transfer_pallet.clone(),
            transfer_call: self.transfer_call.clone(),
            token_view,
            finality_timeout: self.finality_timeout_secs.map(Duration::from_secs),
        })
    }
}
