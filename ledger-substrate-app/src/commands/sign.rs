// SPDX-License-Identifier: Apache-2.0

//! SIGN command implementation

use async_trait::async_trait;
use ledger_device_base::{
    AppExt, ChunkPayloadType, DerivationPath, LedgerAppError, LedgerAppResult,
};
use ledger_transport::{APDUCommand, Exchange};
use log::debug;

use crate::commands::get_address::encode_account_path;
use crate::instructions::{ins, length, p2};
use crate::network::SubstrateNetwork;

/// Signature scheme tag prepended by newer app versions
const SCHEME_ED25519: u8 = 0x00;

#[async_trait]
pub trait Sign<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Sign a SCALE encoded payload with the account at `path`
    async fn sign(
        transport: &E,
        path: &DerivationPath,
        payload: &[u8],
    ) -> LedgerAppResult<[u8; length::SIGNATURE_SIZE], E::Error>;
}

#[async_trait]
impl<N, E> Sign<E> for N
where
    N: SubstrateNetwork,
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    async fn sign(
        transport: &E,
        path: &DerivationPath,
        payload: &[u8],
    ) -> LedgerAppResult<[u8; length::SIGNATURE_SIZE], E::Error> {
        let init = APDUCommand {
            cla: N::CLA,
            ins: ins::SIGN,
            p1: ChunkPayloadType::Init as u8,
            p2: p2::ED25519,
            data: encode_account_path(path)?,
        };

        debug!("{}: sign {} bytes with {}", N::NAME, payload.len(), path);
        let response = <N as AppExt<E>>::send_chunks(transport, init, payload).await?;
        <N as AppExt<E>>::handle_response_error_signature(&response)?;

        parse_signature_response(response.data())
    }
}

/// Parse the signature returned after the last chunk
fn parse_signature_response<E: std::error::Error>(
    data: &[u8],
) -> LedgerAppResult<[u8; length::SIGNATURE_SIZE], E> {
    let signature = match data {
        [SCHEME_ED25519, rest @ ..] if rest.len() == length::SIGNATURE_SIZE => rest,
        _ if data.len() == length::SIGNATURE_SIZE => data,
        _ => return Err(LedgerAppError::InvalidSignature),
    };

    let mut array = [0u8; length::SIGNATURE_SIZE];
    array.copy_from_slice(signature);
    Ok(array)
}
