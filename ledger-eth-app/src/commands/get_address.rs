// SPDX-License-Identifier: Apache-2.0

//! GET ETH PUBLIC ADDRESS command implementation

use async_trait::async_trait;
use ledger_device_base::reader::AnswerReader;
use ledger_device_base::{App, AppExt};
use ledger_transport::{APDUCommand, Exchange};
use log::debug;

use crate::errors::{EthAppError, EthAppResult};
use crate::instructions::{ins, p1_get_address, p2_get_address};
use crate::types::{GetAddressParams, PublicKeyInfo};
use crate::utils::{
    encode_bip32_path, encode_chain_id, parse_device_address, parse_device_chain_code,
    parse_device_public_key, validate_bip32_path,
};
use crate::EthApp;

#[async_trait]
pub trait GetAddress<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Get Ethereum public address for the given BIP 32 path
    async fn get_address(
        transport: &E,
        params: GetAddressParams,
    ) -> EthAppResult<PublicKeyInfo, E::Error>;
}

#[async_trait]
impl<E> GetAddress<E> for EthApp
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    async fn get_address(
        transport: &E,
        params: GetAddressParams,
    ) -> EthAppResult<PublicKeyInfo, E::Error> {
        validate_bip32_path(&params.path)?;

        let mut data = encode_bip32_path(&params.path);
        if let Some(chain_id) = params.chain_id {
            data.extend_from_slice(&encode_chain_id(chain_id));
        }

        let p1 = if params.display {
            p1_get_address::DISPLAY_AND_CONFIRM
        } else {
            p1_get_address::RETURN_ADDRESS
        };

        let p2 = if params.return_chain_code {
            p2_get_address::RETURN_CHAIN_CODE
        } else {
            p2_get_address::NO_CHAIN_CODE
        };

        let command = APDUCommand {
            cla: Self::CLA,
            ins: ins::GET_ETH_PUBLIC_ADDRESS,
            p1,
            p2,
            data,
        };

        debug!("eth: get address {} (display: {})", params.path, params.display);

        let response = transport
            .exchange(&command)
            .await
            .map_err(|e| EthAppError::Transport(e.into()))?;
        <EthApp as AppExt<E>>::handle_response_error(&response)?;

        parse_get_address_response::<E::Error>(response.data(), params.return_chain_code)
    }
}

/// Parse GET ETH PUBLIC ADDRESS response data
fn parse_get_address_response<E: std::error::Error>(
    data: &[u8],
    return_chain_code: bool,
) -> EthAppResult<PublicKeyInfo, E> {
    let mut reader = AnswerReader::new(data);

    let public_key = parse_device_public_key(&mut reader)?;
    let address = parse_device_address(&mut reader)?;
    let chain_code = if return_chain_code {
        parse_device_chain_code(&mut reader)?
    } else {
        None
    };

    Ok(PublicKeyInfo {
        public_key,
        address,
        chain_code,
    })
}
