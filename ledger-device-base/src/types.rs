// SPDX-License-Identifier: Apache-2.0

//! Domain values exchanged between callers and device applications

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::path::DerivationPath;

/// Protocols that can be imported from a Ledger device
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum ProtocolIdentifier {
    /// Kusama relay chain
    #[serde(rename = "kusama")]
    Kusama,
    /// Polkadot relay chain
    #[serde(rename = "polkadot")]
    Polkadot,
    /// Ethereum mainnet and EVM chains
    #[serde(rename = "eth")]
    Ethereum,
}

impl ProtocolIdentifier {
    /// Identifier as used by wallets and in serialised values
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolIdentifier::Kusama => "kusama",
            ProtocolIdentifier::Polkadot => "polkadot",
            ProtocolIdentifier::Ethereum => "eth",
        }
    }
}

impl fmt::Display for ProtocolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account imported from a device
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct WalletDescriptor {
    /// Protocol the account belongs to
    pub protocol: ProtocolIdentifier,
    /// Public key as returned by the device
    #[serde(rename = "publicKey", with = "hex::serde")]
    pub public_key: Vec<u8>,
    /// Address derived by the device
    pub address: String,
    /// Full derivation path of the account
    #[serde(rename = "derivationPath")]
    pub derivation_path: DerivationPath,
    /// Chain code, when the device returned one
    #[serde(rename = "chainCode", skip_serializing_if = "Option::is_none", default)]
    pub chain_code: Option<HexBytes>,
}

/// Byte buffer serialised as hex
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct HexBytes(#[serde(with = "hex::serde")] pub Vec<u8>);

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        HexBytes(bytes)
    }
}

/// Unsigned Substrate extrinsic
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubstrateTransaction {
    /// SCALE encoded signing payload
    #[serde(with = "hex::serde")]
    pub payload: Vec<u8>,
}

/// Unsigned Ethereum transaction
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EthereumTransaction {
    /// RLP encoded transaction
    #[serde(with = "hex::serde")]
    pub rlp: Vec<u8>,
}

/// Transaction handed to a device application for signing
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "protocol")]
pub enum UnsignedTransaction {
    /// Kusama extrinsic
    #[serde(rename = "kusama")]
    Kusama(SubstrateTransaction),
    /// Polkadot extrinsic
    #[serde(rename = "polkadot")]
    Polkadot(SubstrateTransaction),
    /// Ethereum transaction
    #[serde(rename = "eth")]
    Ethereum(EthereumTransaction),
}

impl UnsignedTransaction {
    /// Protocol the transaction belongs to
    pub fn protocol(&self) -> ProtocolIdentifier {
        match self {
            UnsignedTransaction::Kusama(_) => ProtocolIdentifier::Kusama,
            UnsignedTransaction::Polkadot(_) => ProtocolIdentifier::Polkadot,
            UnsignedTransaction::Ethereum(_) => ProtocolIdentifier::Ethereum,
        }
    }

    /// Bytes the device signs
    pub fn signing_payload(&self) -> &[u8] {
        match self {
            UnsignedTransaction::Kusama(tx) | UnsignedTransaction::Polkadot(tx) => &tx.payload,
            UnsignedTransaction::Ethereum(tx) => &tx.rlp,
        }
    }
}

/// Device signature combined with the transaction it signs
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignedTransaction {
    /// The transaction as handed to the device
    pub transaction: UnsignedTransaction,
    /// Signature produced by the device
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl SignedTransaction {
    /// Protocol the transaction belongs to
    pub fn protocol(&self) -> ProtocolIdentifier {
        self.transaction.protocol()
    }
}

/// Which account `import_wallet` asks the device for
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportSettings {
    /// Derivation path sent to the device
    #[serde(rename = "derivationPath")]
    pub derivation_path: DerivationPath,
    /// Whether the device displays the address and asks for confirmation
    #[serde(default)]
    pub display: bool,
}

impl ImportSettings {
    /// Import the account at `derivation_path` without confirmation
    pub fn new(derivation_path: DerivationPath) -> Self {
        ImportSettings {
            derivation_path,
            display: false,
        }
    }

    /// Use another derivation path
    pub fn with_derivation_path(mut self, derivation_path: DerivationPath) -> Self {
        self.derivation_path = derivation_path;
        self
    }

    /// Enable display and confirmation on device
    pub fn with_display(mut self) -> Self {
        self.display = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// App Version
pub struct Version {
    /// Application Mode
    #[serde(rename(serialize = "testMode"))]
    pub mode: u8,
    /// Version Major
    pub major: u16,
    /// Version Minor
    pub minor: u16,
    /// Version Patch
    pub patch: u16,
    /// Device is locked
    pub locked: bool,
    /// Target ID
    pub target_id: [u8; 4],
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// App Device Info
pub struct DeviceInfo {
    /// Target ID
    #[serde(rename(serialize = "targetId"))]
    pub target_id: [u8; 4],
    /// Secure Element Version
    #[serde(rename(serialize = "seVersion"))]
    pub se_version: String,
    /// Device Flag
    pub flag: Vec<u8>,
    /// MCU Version
    #[serde(rename(serialize = "mcuVersion"))]
    pub mcu_version: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
/// Currently running app
pub struct AppInfo {
    /// Name of the application
    #[serde(rename(serialize = "appName"))]
    pub app_name: String,
    /// App version
    #[serde(rename(serialize = "appVersion"))]
    pub app_version: String,
    /// Flag length
    #[serde(rename(serialize = "flagLen"))]
    pub flag_len: u8,
    /// Flag value
    #[serde(rename(serialize = "flagsValue"))]
    pub flags_value: u8,
    /// Flag Recovery
    #[serde(rename(serialize = "flagsRecovery"))]
    pub flag_recovery: bool,
    /// Flag Signed MCU code
    #[serde(rename(serialize = "flagsSignedMCUCode"))]
    pub flag_signed_mcu_code: bool,
    /// Flag Onboarded
    #[serde(rename(serialize = "flagsOnboarded"))]
    pub flag_onboarded: bool,
    /// Flag Pin Validated
    #[serde(rename(serialize = "flagsPINValidated"))]
    pub flag_pin_validated: bool,
}
