// SPDX-License-Identifier: Apache-2.0

//! JSON description of the accounts to import

use std::path::Path;

use ledger_device_base::{DerivationPath, ImportSettings, ProtocolIdentifier};
use serde::{Deserialize, Serialize};

use crate::WalletError;

/// One account to import
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountConfig {
    pub protocol: ProtocolIdentifier,
    /// Defaults to the first account of the protocol
    #[serde(
        rename = "derivationPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub derivation_path: Option<DerivationPath>,
    #[serde(default)]
    pub display: bool,
}

impl AccountConfig {
    /// First account of `protocol`
    pub fn new(protocol: ProtocolIdentifier) -> Self {
        AccountConfig {
            protocol,
            derivation_path: None,
            display: false,
        }
    }

    /// Settings handed to the device app
    pub fn settings(&self) -> ImportSettings {
        let mut settings = crate::default_settings(self.protocol);
        if let Some(path) = &self.derivation_path {
            settings = settings.with_derivation_path(path.clone());
        }
        if self.display {
            settings = settings.with_display();
        }
        settings
    }
}

/// Accounts to import from one device
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportConfig {
    pub accounts: Vec<AccountConfig>,
}

impl ImportConfig {
    /// First account of every supported protocol
    pub fn all_protocols() -> Self {
        ImportConfig {
            accounts: crate::supported_protocols()
                .iter()
                .map(|&protocol| AccountConfig::new(protocol))
                .collect(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, WalletError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self::all_protocols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accounts() {
        let config = ImportConfig::from_json(
            r#"{
                "accounts": [
                    { "protocol": "polkadot", "derivationPath": "0'/0'/4'", "display": true },
                    { "protocol": "eth" }
                ]
            }"#,
        )
        .unwrap();

        let polkadot = &config.accounts[0];
        assert_eq!(polkadot.protocol, ProtocolIdentifier::Polkadot);
        let settings = polkadot.settings();
        assert_eq!(settings.derivation_path.to_string(), "0'/0'/4'");
        assert!(settings.display);

        let eth = &config.accounts[1];
        assert_eq!(eth.protocol, ProtocolIdentifier::Ethereum);
        assert_eq!(eth.derivation_path, None);
        assert_eq!(eth.settings().derivation_path.to_string(), "44'/60'/0'/0/0");
        assert!(!eth.settings().display);
    }

    #[test]
    fn reject_bad_paths_and_protocols() {
        assert!(matches!(
            ImportConfig::from_json(r#"{ "accounts": [ { "protocol": "xtz" } ] }"#),
            Err(WalletError::Config(_))
        ));
        assert!(matches!(
            ImportConfig::from_json(
                r#"{ "accounts": [ { "protocol": "eth", "derivationPath": "44'/x" } ] }"#
            ),
            Err(WalletError::Config(_))
        ));
    }

    #[test]
    fn default_imports_every_protocol() {
        let config = ImportConfig::default();
        assert_eq!(config.accounts.len(), 3);
        assert!(config
            .accounts
            .iter()
            .all(|account| account.derivation_path.is_none() && !account.display));
    }
}
