// SPDX-License-Identifier: Apache-2.0

//! Device application contract for Ledger devices
//!
//! Every on-device application a host talks to (one per supported currency)
//! is represented by a type implementing [`LedgerApp`]: check that the app is
//! available, import an account, sign a transaction. The shared request
//! framing lives in [`payload`]; [`AppExt`] adds the generic queries every
//! Ledger app answers (version, app info, device info) and chunked streaming.

use std::sync::Arc;

use async_trait::async_trait;
use ledger_transport::{APDUAnswer, APDUCommand, APDUErrorCode, Exchange, SharedTransport};
use log::debug;

pub mod errors;
pub mod path;
pub mod payload;
pub mod reader;
pub mod types;

pub use errors::*;
pub use path::{DerivationPath, PathError, PathSegment};
pub use payload::{create_payload, derivation_path_to_buffer};
pub use types::*;

use reader::{utf8, AnswerReader};

// Ledger generic (non app-specific) APDU constants
const INS_GET_VERSION: u8 = 0x00;
const CLA_APP_INFO: u8 = 0xb0;
const INS_APP_INFO: u8 = 0x01;
const CLA_DEVICE_INFO: u8 = 0xe0;
const INS_DEVICE_INFO: u8 = 0x01;

/// Size of the chunks streamed by [`AppExt::send_chunks`]
pub const USER_MESSAGE_CHUNK_SIZE: usize = 250;

/// `P1` values of a chunked command
pub enum ChunkPayloadType {
    /// First chunk
    Init = 0x00,
    /// Append chunk
    Add = 0x01,
    /// Last chunk
    Last = 0x02,
}

/// Defines what we can consider an "App"
pub trait App {
    /// App's APDU CLA, the identifier of the on-device application
    const CLA: u8;
}

/// Contract every per-currency device application implements.
///
/// Implementations only borrow their transport. Each operation holds the
/// [`SharedTransport`] guard for its whole request sequence, so apps sharing a
/// transport can be driven concurrently without interleaving their APDUs.
#[async_trait]
pub trait LedgerApp<E>: Send + Sync
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error + Send,
{
    /// Identifier (APDU class) of the on-device application
    fn app_identifier(&self) -> u8;

    /// Protocol of the accounts this app imports
    fn protocol(&self) -> ProtocolIdentifier;

    /// Transport shared with other apps
    fn transport(&self) -> &Arc<SharedTransport<E>>;

    /// Whether the on-device application is open and ready.
    ///
    /// Resolves to `false` when the app is absent, not open or the device is
    /// locked; fails only when the transport itself fails or the device
    /// answers with malformed data.
    async fn is_available(&self) -> LedgerAppResult<bool, E::Error>;

    /// Ask the device for the public key and address of the configured account
    async fn import_wallet(&self) -> LedgerAppResult<WalletDescriptor, E::Error>;

    /// Ask the device to sign `transaction`
    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> LedgerAppResult<SignedTransaction, E::Error>;
}

#[async_trait]
pub trait AppExt<E>: App
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Check APDU status word. Ok on 0x9000, otherwise map to SDK errors.
    fn handle_response_error(
        response: &APDUAnswer<E::AnswerType>,
    ) -> Result<(), LedgerAppError<E::Error>> {
        match response.error_code() {
            Ok(APDUErrorCode::NoError) => Ok(()),
            Ok(err) => Err(LedgerAppError::from_apdu_error(err)),
            Err(err) => Err(LedgerAppError::Unknown(err)),
        }
    }

    /// Same as `handle_response_error`, but also requires non-empty payload (signature).
    fn handle_response_error_signature(
        response: &APDUAnswer<E::AnswerType>,
    ) -> Result<(), LedgerAppError<E::Error>> {
        match response.error_code() {
            Ok(APDUErrorCode::NoError) if response.data().is_empty() => {
                Err(LedgerAppError::NoSignature)
            }
            _ => Self::handle_response_error(response),
        }
    }

    /// Query device info (target_id, SE/MCU versions, flags) via BOLOS CLA/INS.
    async fn get_device_info(transport: &E) -> Result<DeviceInfo, LedgerAppError<E::Error>> {
        let command = APDUCommand {
            cla: CLA_DEVICE_INFO,
            ins: INS_DEVICE_INFO,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
        };

        let response = transport.exchange(&command).await?;
        Self::handle_response_error(&response)?;

        let mut reader = AnswerReader::new(response.data());

        let mut target_id = [0u8; 4];
        target_id.copy_from_slice(reader.read_bytes(4, "target id")?);
        let se_version = utf8(reader.read_length_prefixed("SE version")?)?;
        let flag = reader.read_length_prefixed("flags")?.to_vec();

        // MCU version may carry a trailing NUL
        let mut mcu_version = reader.read_length_prefixed("MCU version")?;
        if let [head @ .., 0] = mcu_version {
            mcu_version = head;
        }
        let mcu_version = utf8(mcu_version)?;

        Ok(DeviceInfo {
            target_id,
            se_version,
            flag,
            mcu_version,
        })
    }

    /// Query current app info (name, version, flags) from the device.
    async fn get_app_info(transport: &E) -> Result<AppInfo, LedgerAppError<E::Error>> {
        let command = APDUCommand {
            cla: CLA_APP_INFO,
            ins: INS_APP_INFO,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
        };

        let response = transport.exchange(&command).await?;
        Self::handle_response_error(&response)?;

        let mut reader = AnswerReader::new(response.data());

        if reader.read_u8("format id")? != 1 {
            return Err(LedgerAppError::InvalidFormatID);
        }

        let app_name = utf8(reader.read_length_prefixed("app name")?)?;
        let app_version = utf8(reader.read_length_prefixed("app version")?)?;
        let flag_len = reader.read_u8("flags length")?;
        let flags_value = reader.read_u8("flags")?;

        Ok(AppInfo {
            app_name,
            app_version,
            flag_len,
            flags_value,
            flag_recovery: (flags_value & 1) != 0,
            flag_signed_mcu_code: (flags_value & 2) != 0,
            flag_onboarded: (flags_value & 4) != 0,
            flag_pin_validated: (flags_value & 128) != 0,
        })
    }

    /// Query application version using the implementing app's CLA.
    async fn get_version(transport: &E) -> Result<Version, LedgerAppError<E::Error>> {
        let command = APDUCommand {
            cla: Self::CLA,
            ins: INS_GET_VERSION,
            p1: 0x00,
            p2: 0x00,
            data: Vec::new(),
        };

        let response = transport.exchange(&command).await?;
        Self::handle_response_error(&response)?;

        parse_version(response.data())
    }

    /// Send a long message in chunks using Init/Add/Last framing on p1.
    async fn send_chunks<I: std::ops::Deref<Target = [u8]> + Send + Sync>(
        transport: &E,
        command: APDUCommand<I>,
        message: &[u8],
    ) -> Result<APDUAnswer<E::AnswerType>, LedgerAppError<E::Error>> {
        let chunks = message.chunks(USER_MESSAGE_CHUNK_SIZE);
        match chunks.len() {
            0 => return Err(LedgerAppError::InvalidEmptyMessage),
            n if n > 255 => return Err(LedgerAppError::InvalidMessageSize),
            _ => (),
        }

        if command.p1 != ChunkPayloadType::Init as u8 {
            return Err(LedgerAppError::InvalidChunkPayloadType);
        }

        let mut response = transport.exchange(&command).await?;
        Self::handle_response_error(&response)?;

        let last_chunk_index = chunks.len() - 1;
        for (packet_idx, chunk) in chunks.enumerate() {
            let p1 = if packet_idx == last_chunk_index {
                ChunkPayloadType::Last as u8
            } else {
                ChunkPayloadType::Add as u8
            };

            debug!(
                "cla {:#04x} ins {:#04x}: chunk {}/{} ({} bytes)",
                command.cla,
                command.ins,
                packet_idx + 1,
                last_chunk_index + 1,
                chunk.len()
            );

            let chunk_command = APDUCommand {
                cla: command.cla,
                ins: command.ins,
                p1,
                p2: command.p2,
                data: chunk.to_vec(),
            };

            response = transport.exchange(&chunk_command).await?;
            Self::handle_response_error(&response)?;
        }

        Ok(response)
    }
}

impl<T, E> AppExt<E> for T
where
    T: App,
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
}

/// Parse the answer of the generic GET VERSION instruction
fn parse_version<E: std::error::Error>(data: &[u8]) -> Result<Version, LedgerAppError<E>> {
    let wide = |hi: u8, lo: u8| u16::from_be_bytes([hi, lo]);

    let version = match *data {
        // single byte version numbers
        [mode, major, minor, patch] => Version {
            mode,
            major: major as u16,
            minor: minor as u16,
            patch: patch as u16,
            locked: false,
            target_id: [0, 0, 0, 0],
        },
        // double byte version numbers
        [mode, major_hi, major_lo, minor_hi, minor_lo, patch_hi, patch_lo] => Version {
            mode,
            major: wide(major_hi, major_lo),
            minor: wide(minor_hi, minor_lo),
            patch: wide(patch_hi, patch_lo),
            locked: false,
            target_id: [0, 0, 0, 0],
        },
        // single byte version numbers + lock + target id
        [mode, major, minor, patch, locked, t0, t1, t2, t3] => Version {
            mode,
            major: major as u16,
            minor: minor as u16,
            patch: patch as u16,
            locked: locked != 0,
            target_id: [t0, t1, t2, t3],
        },
        // double byte version numbers + lock + target id
        [mode, major_hi, major_lo, minor_hi, minor_lo, patch_hi, patch_lo, locked, t0, t1, t2, t3] => {
            Version {
                mode,
                major: wide(major_hi, major_lo),
                minor: wide(minor_hi, minor_lo),
                patch: wide(patch_hi, patch_lo),
                locked: locked != 0,
                target_id: [t0, t1, t2, t3],
            }
        }
        _ => return Err(LedgerAppError::InvalidVersion),
    };

    Ok(version)
}
