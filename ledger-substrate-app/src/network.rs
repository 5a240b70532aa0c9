// SPDX-License-Identifier: Apache-2.0

//! Networks served by a Substrate Ledger app

use ledger_device_base::{
    App, DerivationPath, ImportSettings, PathError, PathSegment, ProtocolIdentifier,
};

use crate::instructions::{cla, length};

/// A Substrate relay chain with its own Ledger app
pub trait SubstrateNetwork: App + Send + Sync + 'static {
    /// Protocol of the accounts
    const PROTOCOL: ProtocolIdentifier;
    /// SLIP-44 coin type
    const COIN_TYPE: u32;
    /// Name of the app on the device
    const NAME: &'static str;

    /// `44'/coin_type'`, fixed by the device app
    fn path_prefix() -> DerivationPath {
        let prefix = vec![
            PathSegment {
                index: length::BIP44_PURPOSE,
                hardened: true,
            },
            PathSegment {
                index: Self::COIN_TYPE,
                hardened: true,
            },
        ];
        path_from(prefix)
    }

    /// Full path of an account given relative to [`SubstrateNetwork::path_prefix`]
    fn full_path(account_path: &DerivationPath) -> Result<DerivationPath, PathError> {
        Self::path_prefix().join(account_path)
    }

    /// First account: `0'/0'/0'`
    fn default_settings() -> ImportSettings {
        let first = PathSegment {
            index: 0,
            hardened: true,
        };
        ImportSettings::new(path_from(vec![first; 3]))
    }
}

fn path_from(segments: Vec<PathSegment>) -> DerivationPath {
    match DerivationPath::new(segments) {
        Ok(path) => path,
        Err(err) => unreachable!("constant path is valid: {}", err),
    }
}

/// Kusama app marker
#[derive(Debug, Clone, Copy)]
pub struct Kusama;

impl App for Kusama {
    const CLA: u8 = cla::KUSAMA;
}

impl SubstrateNetwork for Kusama {
    const PROTOCOL: ProtocolIdentifier = ProtocolIdentifier::Kusama;
    const COIN_TYPE: u32 = 434;
    const NAME: &'static str = "Kusama";
}

/// Polkadot app marker
#[derive(Debug, Clone, Copy)]
pub struct Polkadot;

impl App for Polkadot {
    const CLA: u8 = cla::POLKADOT;
}

impl SubstrateNetwork for Polkadot {
    const PROTOCOL: ProtocolIdentifier = ProtocolIdentifier::Polkadot;
    const COIN_TYPE: u32 = 354;
    const NAME: &'static str = "Polkadot";
}
