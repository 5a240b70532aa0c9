// SPDX-License-Identifier: Apache-2.0

//! Protocols importable from a Ledger device
//!
//! [`open_app`] builds the device application of a protocol over a transport
//! shared with every other app opened on the same device.

use std::sync::Arc;

use ledger_device_base::{ImportSettings, LedgerApp, ProtocolIdentifier};
use ledger_eth_app::EthereumApp;
use ledger_substrate_app::{Kusama, KusamaApp, Polkadot, PolkadotApp, SubstrateNetwork};
use ledger_transport::{Exchange, SharedTransport};
use log::debug;
use thiserror::Error;

pub mod config;

pub use config::{AccountConfig, ImportConfig};

const SUPPORTED_PROTOCOLS: [ProtocolIdentifier; 3] = [
    ProtocolIdentifier::Kusama,
    ProtocolIdentifier::Polkadot,
    ProtocolIdentifier::Ethereum,
];

#[derive(Debug, Error)]
pub enum WalletError {
    /// No Ledger app for this protocol
    #[error("protocol `{0}` cannot be imported from a Ledger device")]
    UnsupportedProtocol(String),
    /// Configuration file could not be read
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration is not valid JSON for [`ImportConfig`]
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Protocols with a Ledger app
pub fn supported_protocols() -> &'static [ProtocolIdentifier] {
    &SUPPORTED_PROTOCOLS
}

/// Whether accounts of the protocol named `identifier` can be imported
pub fn is_supported(identifier: &str) -> bool {
    parse_protocol(identifier).is_ok()
}

/// Look up a protocol by its identifier (`"kusama"`, `"polkadot"`, `"eth"`)
pub fn parse_protocol(identifier: &str) -> Result<ProtocolIdentifier, WalletError> {
    SUPPORTED_PROTOCOLS
        .iter()
        .copied()
        .find(|protocol| protocol.as_str() == identifier)
        .ok_or_else(|| WalletError::UnsupportedProtocol(identifier.to_string()))
}

/// Account imported when no settings are given
pub fn default_settings(protocol: ProtocolIdentifier) -> ImportSettings {
    match protocol {
        ProtocolIdentifier::Kusama => Kusama::default_settings(),
        ProtocolIdentifier::Polkadot => Polkadot::default_settings(),
        ProtocolIdentifier::Ethereum => EthereumApp::<()>::default_settings(),
    }
}

/// Device application of `protocol` over `transport`
pub fn open_app<E>(
    protocol: ProtocolIdentifier,
    transport: Arc<SharedTransport<E>>,
    settings: Option<ImportSettings>,
) -> Box<dyn LedgerApp<E>>
where
    E: Exchange + Send + Sync + 'static,
    E::Error: std::error::Error + Send,
{
    let settings = settings.unwrap_or_else(|| default_settings(protocol));
    debug!("opening {} app for {}", protocol, settings.derivation_path);

    match protocol {
        ProtocolIdentifier::Kusama => Box::new(KusamaApp::with_settings(transport, settings)),
        ProtocolIdentifier::Polkadot => Box::new(PolkadotApp::with_settings(transport, settings)),
        ProtocolIdentifier::Ethereum => Box::new(EthereumApp::with_settings(transport, settings)),
    }
}

/// Device applications of every account in `config`, sharing `transport`
pub fn open_apps<E>(
    config: &ImportConfig,
    transport: &Arc<SharedTransport<E>>,
) -> Vec<Box<dyn LedgerApp<E>>>
where
    E: Exchange + Send + Sync + 'static,
    E::Error: std::error::Error + Send,
{
    config
        .accounts
        .iter()
        .map(|account| open_app(account.protocol, transport.clone(), Some(account.settings())))
        .collect()
}
