// SPDX-License-Identifier: Apache-2.0

//! APDU command and answer types
//!
//! An APDU command is serialised as `CLA INS P1 P2 Lc data`, where `Lc` is a
//! single length byte. The device answers with an optional body followed by a
//! big-endian status word (`0x9000` on success).

#![no_std]
#![deny(missing_docs)]

extern crate no_std_compat as std;
use std::prelude::v1::*;

use core::ops::Deref;

use arrayref::array_ref;
use snafu::prelude::*;

/// Status word returned by the device on success
pub const SW_SUCCESS: u16 = 0x9000;

/// Largest body an APDU command can carry (single byte `Lc`)
pub const MAX_APDU_DATA_LEN: usize = 255;

#[derive(Debug, Clone)]
/// An APDU command sent to the device
pub struct APDUCommand<B> {
    /// APDU class, identifies the on-device application
    pub cla: u8,
    /// APDU instruction
    pub ins: u8,
    /// First instruction parameter
    pub p1: u8,
    /// Second instruction parameter
    pub p2: u8,
    /// Command body
    pub data: B,
}

impl<B> APDUCommand<B>
where
    B: Deref<Target = [u8]>,
{
    /// Serialise the command into the device wire format.
    ///
    /// Panics if the body exceeds [`MAX_APDU_DATA_LEN`].
    pub fn serialize(&self) -> Vec<u8> {
        assert!(
            self.data.len() <= MAX_APDU_DATA_LEN,
            "APDU body of {} bytes exceeds {} bytes",
            self.data.len(),
            MAX_APDU_DATA_LEN
        );

        let mut v = Vec::with_capacity(5 + self.data.len());
        v.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2, self.data.len() as u8]);
        v.extend_from_slice(&self.data);
        v
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// An APDU answer received from the device
pub struct APDUAnswer<B> {
    data: B,
    retcode: u16,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
/// Error interpreting bytes as an APDU answer
pub enum APDUAnswerError {
    #[snafu(display("answer too short (< 2 bytes)"))]
    /// Passed APDU answer was less than the minimum 2 bytes required for the return code
    TooShort,
}

impl<B> APDUAnswer<B>
where
    B: Deref<Target = [u8]>,
{
    /// Attempt to interpret the given slice as an APDU answer
    pub fn from_answer(answer: B) -> Result<Self, APDUAnswerError> {
        ensure!(answer.len() >= 2, TooShortSnafu);
        let retcode = u16::from_be_bytes(*array_ref!(answer, answer.len() - 2, 2));

        Ok(APDUAnswer {
            data: answer,
            retcode,
        })
    }

    /// Build an answer from a body and a status word
    pub fn from_parts(body: &[u8], retcode: u16) -> APDUAnswer<Vec<u8>> {
        let mut data = Vec::with_capacity(body.len() + 2);
        data.extend_from_slice(body);
        data.extend_from_slice(&retcode.to_be_bytes());
        APDUAnswer { data, retcode }
    }

    #[inline(always)]
    /// Answer body, without the status word
    pub fn data(&self) -> &[u8] {
        &self.data[..self.data.len() - 2]
    }

    #[inline(always)]
    /// Raw answer, including the status word
    pub fn apdu_data(&self) -> &[u8] {
        &self.data[..]
    }

    #[inline(always)]
    /// Raw status word
    pub fn retcode(&self) -> u16 {
        self.retcode
    }

    /// Known error code for the status word, or the raw word if unknown
    pub fn error_code(&self) -> Result<APDUErrorCode, u16> {
        self.retcode.try_into().map_err(|_| self.retcode)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
/// Common status words returned by Ledger firmware and applications
pub enum APDUErrorCode {
    /// success
    NoError = 0x9000,
    /// device is locked
    DeviceLocked = 0x5515,
    /// requested application is not open
    AppNotOpen = 0x6511,
    /// execution error
    ExecutionError = 0x6400,
    /// wrong buffer length
    WrongLength = 0x6700,
    /// empty buffer
    EmptyBuffer = 0x6982,
    /// output buffer too small
    OutputBufferTooSmall = 0x6983,
    /// data is invalid
    DataInvalid = 0x6984,
    /// conditions not satisfied, the user rejected the request
    ConditionsNotSatisfied = 0x6985,
    /// command not allowed
    CommandNotAllowed = 0x6986,
    /// bad key handle
    BadKeyHandle = 0x6A80,
    /// invalid P1 or P2
    InvalidP1P2 = 0x6B00,
    /// instruction not supported
    InsNotSupported = 0x6D00,
    /// class not supported
    ClaNotSupported = 0x6E00,
    /// unknown
    Unknown = 0x6F00,
    /// signature verification failed
    SignVerifyError = 0x6F01,
}

impl TryFrom<u16> for APDUErrorCode {
    type Error = ();

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let this = match value {
            0x9000 => Self::NoError,
            0x5515 => Self::DeviceLocked,
            0x6511 => Self::AppNotOpen,
            0x6400 => Self::ExecutionError,
            0x6700 => Self::WrongLength,
            0x6982 => Self::EmptyBuffer,
            0x6983 => Self::OutputBufferTooSmall,
            0x6984 => Self::DataInvalid,
            0x6985 => Self::ConditionsNotSatisfied,
            0x6986 => Self::CommandNotAllowed,
            0x6A80 => Self::BadKeyHandle,
            0x6B00 => Self::InvalidP1P2,
            0x6D00 => Self::InsNotSupported,
            0x6E00 => Self::ClaNotSupported,
            0x6F00 => Self::Unknown,
            0x6F01 => Self::SignVerifyError,
            _ => return Err(()),
        };

        Ok(this)
    }
}

impl APDUErrorCode {
    /// Human readable description of the status word
    pub fn description(&self) -> String {
        match self {
            APDUErrorCode::NoError => "[APDU_CODE_OK] No errors",
            APDUErrorCode::DeviceLocked => "[APDU_CODE_LOCKED] Device is locked",
            APDUErrorCode::AppNotOpen => "[APDU_CODE_APP_NOT_OPEN] Application is not open",
            APDUErrorCode::ExecutionError => "[APDU_CODE_EXECUTION_ERROR] Execution Error",
            APDUErrorCode::WrongLength => "[APDU_CODE_WRONG_LENGTH] Wrong buffer length",
            APDUErrorCode::EmptyBuffer => "[APDU_CODE_EMPTY_BUFFER] Empty buffer",
            APDUErrorCode::OutputBufferTooSmall => {
                "[APDU_CODE_OUTPUT_BUFFER_TOO_SMALL] Output buffer too small"
            }
            APDUErrorCode::DataInvalid => "[APDU_CODE_DATA_INVALID] Data is invalid",
            APDUErrorCode::ConditionsNotSatisfied => {
                "[APDU_CODE_CONDITIONS_NOT_SATISFIED] Conditions not satisfied"
            }
            APDUErrorCode::CommandNotAllowed => {
                "[APDU_CODE_COMMAND_NOT_ALLOWED] Command not allowed"
            }
            APDUErrorCode::BadKeyHandle => "[APDU_CODE_BAD_KEY_HANDLE] Bad key handle",
            APDUErrorCode::InvalidP1P2 => "[APDU_CODE_INVALIDP1P2] Invalid P1 or P2",
            APDUErrorCode::InsNotSupported => {
                "[APDU_CODE_INS_NOT_SUPPORTED] Instruction not supported"
            }
            APDUErrorCode::ClaNotSupported => "[APDU_CODE_CLA_NOT_SUPPORTED] CLA not supported",
            APDUErrorCode::Unknown => "[APDU_CODE_UNKNOWN] Unknown",
            APDUErrorCode::SignVerifyError => "[APDU_CODE_SIGN_VERIFY_ERROR] Sign verify error",
        }
        .to_string()
    }
}
