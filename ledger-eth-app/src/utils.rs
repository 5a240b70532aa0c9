// SPDX-License-Identifier: Apache-2.0

//! Utility functions for Ethereum application

use ledger_device_base::path::HARDENED_OFFSET;
use ledger_device_base::reader::{utf8, AnswerReader};
use ledger_device_base::DerivationPath;

use crate::errors::{EthAppError, EthAppResult};
use crate::instructions::length;
use crate::types::EthAddress;

const PURPOSE_BIP44: u32 = 44 | HARDENED_OFFSET;
const COIN_TYPE_ETH: u32 = 60 | HARDENED_OFFSET;

/// Encode BIP32 path for APDU command: depth byte, then each index big-endian
pub fn encode_bip32_path(path: &DerivationPath) -> Vec<u8> {
    let indices = path.bip32_indices();
    let mut encoded = Vec::with_capacity(1 + indices.len() * length::BIP32_INDEX_SIZE);

    encoded.push(indices.len() as u8);
    for index in indices {
        encoded.extend_from_slice(&index.to_be_bytes());
    }

    encoded
}

/// Validate BIP32 path for Ethereum usage
pub fn validate_bip32_path<E: std::error::Error>(path: &DerivationPath) -> EthAppResult<(), E> {
    if path.depth() > length::MAX_BIP32_PATH_DEPTH {
        return Err(EthAppError::InvalidBip32Path(format!(
            "Path too deep: {} (max {})",
            path.depth(),
            length::MAX_BIP32_PATH_DEPTH
        )));
    }

    // m/44'/60'/account' requires a hardened account
    if let [PURPOSE_BIP44, COIN_TYPE_ETH, account, ..] = path.bip32_indices()[..] {
        if account & HARDENED_OFFSET == 0 {
            return Err(EthAppError::InvalidBip32Path(
                "Account index should be hardened for Ethereum".to_string(),
            ));
        }
    }

    Ok(())
}

/// Encode chain ID for APDU command (8 bytes big-endian)
pub fn encode_chain_id(chain_id: u64) -> Vec<u8> {
    chain_id.to_be_bytes().to_vec()
}

/// Validate Ethereum address format
pub fn validate_ethereum_address<E: std::error::Error>(address: &str) -> EthAppResult<(), E> {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return Err(EthAppError::InvalidAddress(
            "Address must start with 0x".to_string(),
        ));
    };

    if address.len() != 42 {
        return Err(EthAppError::InvalidAddress(format!(
            "Address must be 42 characters long, got {}",
            address.len()
        )));
    }

    if let Some((i, c)) = hex_part.chars().enumerate().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(EthAppError::InvalidAddress(format!(
            "Invalid character '{}' at position {}",
            c,
            i + 2
        )));
    }

    Ok(())
}

/// Parse ASCII-encoded address from device response
pub fn parse_device_address<E: std::error::Error>(
    reader: &mut AnswerReader<'_>,
) -> EthAppResult<EthAddress, E> {
    let mut address = utf8(reader.read_length_prefixed("address")?)?;

    // Older app versions omit the 0x prefix
    if address.len() == 40 && !address.starts_with("0x") {
        address = format!("0x{}", address);
    }

    validate_ethereum_address(&address)?;
    address.parse().map_err(EthAppError::InvalidAddress)
}

/// Parse public key from device response
pub fn parse_device_public_key<E: std::error::Error>(
    reader: &mut AnswerReader<'_>,
) -> EthAppResult<Vec<u8>, E> {
    let public_key = reader.read_length_prefixed("public key")?;

    if public_key.len() != length::PUBLIC_KEY_SIZE {
        return Err(EthAppError::InvalidResponseData(format!(
            "Invalid public key length: {} (expected {})",
            public_key.len(),
            length::PUBLIC_KEY_SIZE
        )));
    }

    Ok(public_key.to_vec())
}

/// Parse optional chain code from device response
pub fn parse_device_chain_code<E: std::error::Error>(
    reader: &mut AnswerReader<'_>,
) -> EthAppResult<Option<Vec<u8>>, E> {
    if reader.is_empty() {
        return Ok(None);
    }

    let chain_code = reader.read_bytes(length::CHAIN_CODE_SIZE, "chain code")?;
    Ok(Some(chain_code.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    type Error = std::io::Error;

    #[test]
    fn test_encode_bip32_path() {
        let path: DerivationPath = "44'/60'/0'/0/0".parse().unwrap();
        let encoded = encode_bip32_path(&path);

        assert_eq!(encoded.len(), 21);
        assert_eq!(encoded[0], 5);
        assert_eq!(&encoded[1..5], &0x8000002Cu32.to_be_bytes());
        assert_eq!(&encoded[5..9], &0x8000003Cu32.to_be_bytes());
        assert_eq!(&encoded[17..21], &0u32.to_be_bytes());
    }

    #[test]
    fn test_validate_bip32_path() {
        let standard: DerivationPath = "44'/60'/0'/0/0".parse().unwrap();
        assert!(validate_bip32_path::<Error>(&standard).is_ok());

        let soft_account: DerivationPath = "44'/60'/0/0/0".parse().unwrap();
        assert!(matches!(
            validate_bip32_path::<Error>(&soft_account),
            Err(EthAppError::InvalidBip32Path(_))
        ));

        let other_coin: DerivationPath = "44'/1'/0/0".parse().unwrap();
        assert!(validate_bip32_path::<Error>(&other_coin).is_ok());
    }

    #[test]
    fn test_validate_ethereum_address() {
        assert!(validate_ethereum_address::<Error>("0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B90").is_ok());
        assert!(validate_ethereum_address::<Error>("742d35Cc6535C244B8c80A79d5d22efeAdBA5B90").is_err());
        assert!(validate_ethereum_address::<Error>("0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B9").is_err());
        assert!(validate_ethereum_address::<Error>("0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B9X").is_err());
    }

    #[test]
    fn test_parse_device_address_adds_prefix() {
        let mut data = vec![40];
        data.extend(b"742d35Cc6535C244B8c80A79d5d22efeAdBA5B90");

        let mut reader = AnswerReader::new(&data);
        let address = parse_device_address::<Error>(&mut reader).unwrap();

        assert_eq!(address.address, "0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B90");
        assert!(reader.is_empty());
    }

    #[test]
    fn test_parse_device_address_with_prefix() {
        let mut data = vec![42];
        data.extend(b"0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B90");

        let mut reader = AnswerReader::new(&data);
        let address = parse_device_address::<Error>(&mut reader).unwrap();

        assert_eq!(address.address, "0x742d35Cc6535C244B8c80A79d5d22efeAdBA5B90");
        assert_eq!(reader.offset(), 43);
    }

    #[test]
    fn test_parse_device_public_key_wrong_length() {
        let mut data = vec![33];
        data.extend(vec![0x02; 33]);

        let mut reader = AnswerReader::new(&data);
        assert!(matches!(
            parse_device_public_key::<Error>(&mut reader),
            Err(EthAppError::InvalidResponseData(_))
        ));
    }

    #[test]
    fn test_parse_device_chain_code() {
        let mut reader = AnswerReader::new(&[]);
        assert_eq!(parse_device_chain_code::<Error>(&mut reader).unwrap(), None);

        let data = [0xAB; 31];
        let mut reader = AnswerReader::new(&data);
        assert!(parse_device_chain_code::<Error>(&mut reader).is_err());
    }
}
