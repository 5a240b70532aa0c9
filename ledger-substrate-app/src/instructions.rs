// SPDX-License-Identifier: Apache-2.0

//! APDU instruction constants for the Substrate applications

/// APDU class of each network app
pub mod cla {
    /// Kusama app
    pub const KUSAMA: u8 = 0x99;
    /// Polkadot app
    pub const POLKADOT: u8 = 0x90;
}

/// APDU instruction codes
pub mod ins {
    /// GET VERSION
    pub const GET_VERSION: u8 = 0x00;
    /// GET ADDRESS (ed25519)
    pub const GET_ADDRESS: u8 = 0x01;
    /// SIGN (ed25519)
    pub const SIGN: u8 = 0x02;
}

/// P1 parameter constants for GET ADDRESS
pub mod p1_get_address {
    /// Return address without confirmation
    pub const RETURN_ADDRESS: u8 = 0x00;
    /// Display address and confirm before returning
    pub const DISPLAY_AND_CONFIRM: u8 = 0x01;
}

/// P2 parameter constants
pub mod p2 {
    /// ed25519 signature scheme
    pub const ED25519: u8 = 0x00;
}

/// Data length constants
pub mod length {
    /// ed25519 public key
    pub const PUBLIC_KEY_SIZE: usize = 32;
    /// ed25519 signature
    pub const SIGNATURE_SIZE: usize = 64;
    /// BIP-44 purpose
    pub const BIP44_PURPOSE: u32 = 44;
}
