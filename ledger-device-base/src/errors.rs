// SPDX-License-Identifier: Apache-2.0

//! Error types shared by every device application

use ledger_transport::APDUErrorCode;
use thiserror::Error;

use crate::path::PathError;
use crate::types::ProtocolIdentifier;

/// How a failed device operation should be presented to the user
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The application is not open, or the device is locked: "open the app on your device"
    Unavailable,
    /// The user declined on the device
    UserRejected,
    /// The caller passed a request that cannot be encoded or signed by this app
    MalformedInput,
    /// The channel to the device failed: "reconnect your device"
    TransportFault,
    /// The device refused the request with a status word
    Device,
    /// The device answered with data that does not follow the wire format
    InvalidResponse,
}

/// Errors returned by device applications
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LedgerAppError<E: std::error::Error> {
    /// Invalid version error
    #[error("This version is not supported")]
    InvalidVersion,
    /// The message cannot be empty
    #[error("message cannot be empty")]
    InvalidEmptyMessage,
    /// The size of the message to sign is invalid
    #[error("message size is invalid (too big)")]
    InvalidMessageSize,
    /// Public key is invalid
    #[error("received an invalid PK")]
    InvalidPK,
    /// No signature has been returned
    #[error("received no signature back")]
    NoSignature,
    /// The signature is not valid
    #[error("received an invalid signature")]
    InvalidSignature,
    /// The derivation path cannot be used by this app
    #[error("invalid derivation path: {0}")]
    InvalidDerivationPath(PathError),
    /// The first chunk of a chunked command was not an init chunk
    #[error("invalid chunk payload type")]
    InvalidChunkPayloadType,
    /// Transport specific error
    #[error("Transport | {0}")]
    TransportError(#[from] E),
    /// Answer contained invalid UTF-8
    #[error("Utf8 conversion error")]
    Utf8,
    /// Response format ID not recognized
    #[error("response format ID not recognized")]
    InvalidFormatID,
    /// Answer body does not follow the expected layout
    #[error("invalid response data: {0}")]
    InvalidResponseData(String),
    /// The user rejected the request on the device
    #[error("operation rejected on device")]
    UserRejected,
    /// The device is locked
    #[error("device is locked")]
    DeviceLocked,
    /// The requested application is not open on the device
    #[error("application is not open on device")]
    AppNotOpen,
    /// Transaction belongs to another protocol
    #[error("{found} transaction cannot be signed by the {expected} app")]
    UnsupportedTransaction {
        /// Protocol of the app asked to sign
        expected: ProtocolIdentifier,
        /// Protocol of the transaction
        found: ProtocolIdentifier,
    },
    /// Transaction cannot be sent to the device
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),
    /// Application specific error
    #[error("App Error: | {0} {1}")]
    AppSpecific(u16, String),
    /// Unknown error has occurred
    #[error("Unknown error: {0}")]
    Unknown(u16),
}

impl<E: std::error::Error> LedgerAppError<E> {
    /// Map a non-success status word to the matching error
    pub fn from_apdu_error(code: APDUErrorCode) -> Self {
        match code {
            APDUErrorCode::ConditionsNotSatisfied => LedgerAppError::UserRejected,
            APDUErrorCode::DeviceLocked => LedgerAppError::DeviceLocked,
            APDUErrorCode::AppNotOpen
            | APDUErrorCode::ClaNotSupported
            | APDUErrorCode::InsNotSupported => LedgerAppError::AppNotOpen,
            err => LedgerAppError::AppSpecific(err as _, err.description()),
        }
    }

    /// Classify the error for presentation
    pub fn kind(&self) -> FailureKind {
        match self {
            LedgerAppError::TransportError(_) => FailureKind::TransportFault,
            LedgerAppError::UserRejected => FailureKind::UserRejected,
            LedgerAppError::DeviceLocked | LedgerAppError::AppNotOpen => FailureKind::Unavailable,
            LedgerAppError::InvalidEmptyMessage
            | LedgerAppError::InvalidMessageSize
            | LedgerAppError::InvalidDerivationPath(_)
            | LedgerAppError::InvalidChunkPayloadType
            | LedgerAppError::UnsupportedTransaction { .. }
            | LedgerAppError::InvalidTransaction(_) => FailureKind::MalformedInput,
            LedgerAppError::AppSpecific(..) | LedgerAppError::Unknown(_) => FailureKind::Device,
            LedgerAppError::InvalidVersion
            | LedgerAppError::InvalidPK
            | LedgerAppError::NoSignature
            | LedgerAppError::InvalidSignature
            | LedgerAppError::Utf8
            | LedgerAppError::InvalidFormatID
            | LedgerAppError::InvalidResponseData(_) => FailureKind::InvalidResponse,
        }
    }

    /// Check if error is due to user rejection
    pub fn is_user_rejected(&self) -> bool {
        self.kind() == FailureKind::UserRejected
    }

    /// Check if error is due to transport/communication issues
    pub fn is_transport_error(&self) -> bool {
        self.kind() == FailureKind::TransportFault
    }

    /// Check if the app is not reachable although the transport is healthy
    pub fn is_unavailable(&self) -> bool {
        self.kind() == FailureKind::Unavailable
    }

    /// Check if error is due to invalid input parameters
    pub fn is_invalid_input(&self) -> bool {
        self.kind() == FailureKind::MalformedInput
    }

    /// Turn "app not reachable" into `Ok(false)`, keep every other error
    pub fn into_availability(self) -> Result<bool, Self> {
        if self.is_unavailable() {
            Ok(false)
        } else {
            Err(self)
        }
    }
}

/// Result type alias for device application operations
pub type LedgerAppResult<T, E> = Result<T, LedgerAppError<E>>;
