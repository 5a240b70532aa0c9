// SPDX-License-Identifier: Apache-2.0

//! GET ADDRESS command implementation

use async_trait::async_trait;
use ledger_device_base::reader::{utf8, AnswerReader};
use ledger_device_base::{create_payload, AppExt, DerivationPath, LedgerAppError, LedgerAppResult};
use ledger_transport::{APDUCommand, Exchange};
use log::debug;

use crate::instructions::{ins, length, p1_get_address, p2};
use crate::network::SubstrateNetwork;

/// Public key and SS58 address returned by the device
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstrateAddress {
    /// ed25519 public key
    pub public_key: [u8; length::PUBLIC_KEY_SIZE],
    /// SS58 encoded address
    pub ss58: String,
}

/// Frame an account path as the device expects it: one byte per segment
/// behind a length byte.
pub fn encode_account_path<E: std::error::Error>(
    path: &DerivationPath,
) -> LedgerAppResult<Vec<u8>, E> {
    let buffer = path
        .to_buffer()
        .map_err(LedgerAppError::InvalidDerivationPath)?;
    Ok(create_payload(Some(&buffer)))
}

#[async_trait]
pub trait GetAddress<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Get the public key and address of the account at `path`
    async fn get_address(
        transport: &E,
        path: &DerivationPath,
        display: bool,
    ) -> LedgerAppResult<SubstrateAddress, E::Error>;
}

#[async_trait]
impl<N, E> GetAddress<E> for N
where
    N: SubstrateNetwork,
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    async fn get_address(
        transport: &E,
        path: &DerivationPath,
        display: bool,
    ) -> LedgerAppResult<SubstrateAddress, E::Error> {
        let data = encode_account_path(path)?;

        let p1 = if display {
            p1_get_address::DISPLAY_AND_CONFIRM
        } else {
            p1_get_address::RETURN_ADDRESS
        };

        let command = APDUCommand {
            cla: N::CLA,
            ins: ins::GET_ADDRESS,
            p1,
            p2: p2::ED25519,
            data,
        };

        debug!("{}: get address {}", N::NAME, path);
        let response = transport.exchange(&command).await?;
        <N as AppExt<E>>::handle_response_error(&response)?;

        parse_get_address_response(response.data())
    }
}

/// Parse GET ADDRESS response data: public key followed by the ASCII address
fn parse_get_address_response<E: std::error::Error>(
    data: &[u8],
) -> LedgerAppResult<SubstrateAddress, E> {
    let mut reader = AnswerReader::new(data);

    let mut public_key = [0u8; length::PUBLIC_KEY_SIZE];
    public_key.copy_from_slice(
        reader
            .read_bytes(length::PUBLIC_KEY_SIZE, "public key")
            .map_err(|_: LedgerAppError<E>| LedgerAppError::InvalidPK)?,
    );

    let ss58 = utf8(reader.read_rest())?;
    if ss58.is_empty() {
        return Err(LedgerAppError::InvalidResponseData(
            "Missing SS58 address".to_string(),
        ));
    }

    Ok(SubstrateAddress { public_key, ss58 })
}
