// SPDX-License-Identifier: Apache-2.0

//! Core data types for Ethereum application

use ledger_device_base::{DerivationPath, PathSegment};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::instructions::length;

/// Standard Ethereum derivation path: m/44'/60'/account'/0/address_index
pub fn ethereum_standard_path(account: u32, address_index: u32) -> DerivationPath {
    let hardened = |index| PathSegment {
        index,
        hardened: true,
    };
    let plain = |index| PathSegment {
        index,
        hardened: false,
    };

    let segments = vec![
        hardened(44),
        hardened(60),
        hardened(account),
        plain(0),
        plain(address_index),
    ];

    match DerivationPath::new(segments) {
        Ok(path) => path,
        Err(err) => unreachable!("five segment path is valid: {}", err),
    }
}

/// Ethereum account address, `0x` followed by 40 hex digits
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthAddress {
    pub address: String,
}

impl EthAddress {
    /// The 20 address bytes
    pub fn to_bytes(&self) -> Result<[u8; 20], hex::FromHexError> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&self.address[2..], &mut bytes)?;
        Ok(bytes)
    }
}

impl FromStr for EthAddress {
    type Err = String;

    fn from_str(address: &str) -> Result<Self, Self::Err> {
        match address.strip_prefix("0x") {
            Some(digits) if digits.len() == 40 => Ok(EthAddress {
                address: address.to_string(),
            }),
            Some(digits) => Err(format!("expected 40 hex digits, got {}", digits.len())),
            None => Err(format!("{} lacks the 0x prefix", address)),
        }
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Answer of GET ETH PUBLIC ADDRESS
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyInfo {
    /// Uncompressed secp256k1 key
    pub public_key: Vec<u8>,
    pub address: EthAddress,
    /// Present when the chain code was requested
    pub chain_code: Option<Vec<u8>>,
}

/// Recoverable secp256k1 signature
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub v: u8,
    pub r: [u8; length::SIGNATURE_COMPONENT_SIZE],
    pub s: [u8; length::SIGNATURE_COMPONENT_SIZE],
}

impl Signature {
    /// Split a `v || r || s` answer
    pub fn from_vrs(data: &[u8]) -> Option<Self> {
        let (&v, rest) = data.split_first()?;
        if rest.len() != 2 * length::SIGNATURE_COMPONENT_SIZE {
            return None;
        }

        let (r, s) = rest.split_at(length::SIGNATURE_COMPONENT_SIZE);
        Some(Signature {
            v,
            r: r.try_into().ok()?,
            s: s.try_into().ok()?,
        })
    }

    /// Back to the device layout: `v || r || s`
    pub fn to_vrs_bytes(&self) -> Vec<u8> {
        [&[self.v][..], &self.r[..], &self.s[..]].concat()
    }
}

/// Answer of GET APP CONFIGURATION
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfiguration {
    pub flags: ConfigFlags,
    pub version: AppVersion,
}

/// Configuration byte of the Ethereum app
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigFlags(pub u8);

impl ConfigFlags {
    /// Arbitrary data signature enabled by user
    pub const ARBITRARY_DATA_SIGNATURE: u8 = 0x01;
    /// ERC 20 token information needs to be provided externally
    pub const ERC20_EXTERNAL_INFO: u8 = 0x02;
    pub const TRANSACTION_CHECK_ENABLED: u8 = 0x10;
    pub const TRANSACTION_CHECK_OPT_IN: u8 = 0x20;

    fn has(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn arbitrary_data_signature(self) -> bool {
        self.has(Self::ARBITRARY_DATA_SIGNATURE)
    }

    pub fn erc20_external_info(self) -> bool {
        self.has(Self::ERC20_EXTERNAL_INFO)
    }

    pub fn transaction_check_enabled(self) -> bool {
        self.has(Self::TRANSACTION_CHECK_ENABLED)
    }

    pub fn transaction_check_opt_in(self) -> bool {
        self.has(Self::TRANSACTION_CHECK_OPT_IN)
    }
}

/// `major.minor.patch` of the Ethereum app
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parameters for GET ETH PUBLIC ADDRESS command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetAddressParams {
    /// BIP32 derivation path
    pub path: DerivationPath,
    /// Whether to display address on device and require confirmation
    pub display: bool,
    /// Whether to return chain code
    pub return_chain_code: bool,
    /// Optional chain ID for validation
    pub chain_id: Option<u64>,
}

impl GetAddressParams {
    /// Create new parameters for getting an address
    pub fn new(path: DerivationPath) -> Self {
        GetAddressParams {
            path,
            display: false,
            return_chain_code: false,
            chain_id: None,
        }
    }

    /// Enable display and confirmation on device
    pub fn with_display(mut self) -> Self {
        self.display = true;
        self
    }

    /// Enable chain code return
    pub fn with_chain_code(mut self) -> Self {
        self.return_chain_code = true;
        self
    }

    /// Set chain ID for validation
    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }
}

/// Parameters for SIGN ETH TRANSACTION command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignTransactionParams {
    /// BIP32 derivation path
    pub path: DerivationPath,
    /// RLP-encoded transaction data
    pub transaction_data: Vec<u8>,
}

impl SignTransactionParams {
    /// Create new parameters for signing a transaction
    pub fn new(path: DerivationPath, transaction_data: Vec<u8>) -> Self {
        SignTransactionParams {
            path,
            transaction_data,
        }
    }
}
