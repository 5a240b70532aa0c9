// SPDX-License-Identifier: Apache-2.0

//! APDU instruction constants for Ethereum application

/// APDU instruction codes for Ethereum application
pub mod ins {
    /// GET ETH PUBLIC ADDRESS
    pub const GET_ETH_PUBLIC_ADDRESS: u8 = 0x02;
    /// SIGN ETH TRANSACTION
    pub const SIGN_ETH_TRANSACTION: u8 = 0x04;
    /// GET APP CONFIGURATION
    pub const GET_APP_CONFIGURATION: u8 = 0x06;
}

/// P1 parameter constants for GET ETH PUBLIC ADDRESS
pub mod p1_get_address {
    /// Return address without confirmation
    pub const RETURN_ADDRESS: u8 = 0x00;
    /// Display address and confirm before returning
    pub const DISPLAY_AND_CONFIRM: u8 = 0x01;
}

/// P2 parameter constants for GET ETH PUBLIC ADDRESS
pub mod p2_get_address {
    /// Do not return the chain code
    pub const NO_CHAIN_CODE: u8 = 0x00;
    /// Return the chain code
    pub const RETURN_CHAIN_CODE: u8 = 0x01;
}

/// P1 parameter constants for SIGN ETH TRANSACTION
pub mod p1_sign_transaction {
    /// First transaction data block
    pub const FIRST_DATA_BLOCK: u8 = 0x00;
    /// Subsequent transaction data block
    pub const SUBSEQUENT_DATA_BLOCK: u8 = 0x80;
}

/// P2 parameter constants for SIGN ETH TRANSACTION
pub mod p2_sign_transaction {
    /// Process and start flow
    pub const PROCESS_AND_START: u8 = 0x00;
    /// Store only
    pub const STORE_ONLY: u8 = 0x01;
    /// Start flow
    pub const START_FLOW: u8 = 0x02;
}

/// Data length constants
pub mod length {
    /// Maximum BIP 32 derivation path depth
    pub const MAX_BIP32_PATH_DEPTH: usize = 10;
    /// Size of each BIP 32 derivation index
    pub const BIP32_INDEX_SIZE: usize = 4;
    /// Size of chain ID
    pub const CHAIN_ID_SIZE: usize = 8;
    /// Size of an uncompressed secp256k1 public key
    pub const PUBLIC_KEY_SIZE: usize = 65;
    /// Size of chain code
    pub const CHAIN_CODE_SIZE: usize = 32;
    /// Size of signature component (r or s)
    pub const SIGNATURE_COMPONENT_SIZE: usize = 32;
    /// Size of a `v || r || s` signature
    pub const SIGNATURE_SIZE: usize = 1 + 2 * SIGNATURE_COMPONENT_SIZE;
    /// Maximum message chunk size for chunked operations
    pub const MAX_MESSAGE_CHUNK_SIZE: usize = 255;
}
