// SPDX-License-Identifier: Apache-2.0

//! Error types for Ethereum application

use ledger_device_base::{LedgerAppError, PathError};
use thiserror::Error;

/// Ethereum application specific errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EthAppError<E: std::error::Error> {
    /// Error from the underlying transport/device
    #[error("Transport error: {0}")]
    Transport(#[from] LedgerAppError<E>),

    /// Invalid BIP32 derivation path
    #[error("Invalid BIP32 path: {0}")]
    InvalidBip32Path(String),

    /// Invalid Ethereum address format
    #[error("Invalid Ethereum address: {0}")]
    InvalidAddress(String),

    /// Invalid signature format
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid transaction format
    #[error("Invalid transaction format: {0}")]
    InvalidTransaction(String),

    /// Invalid response data from device
    #[error("Invalid response data: {0}")]
    InvalidResponseData(String),
}

impl<E: std::error::Error> EthAppError<E> {
    /// Check if error is due to user rejection
    pub fn is_user_rejected(&self) -> bool {
        matches!(self, EthAppError::Transport(e) if e.is_user_rejected())
    }

    /// Check if error is due to transport/communication issues
    pub fn is_transport_error(&self) -> bool {
        matches!(self, EthAppError::Transport(e) if e.is_transport_error())
    }

    /// Check if error is due to invalid input parameters
    pub fn is_invalid_input(&self) -> bool {
        match self {
            EthAppError::Transport(e) => e.is_invalid_input(),
            EthAppError::InvalidBip32Path(_) | EthAppError::InvalidTransaction(_) => true,
            _ => false,
        }
    }

    /// Express the error in the vocabulary shared by every device app
    pub fn into_app_error(self) -> LedgerAppError<E> {
        match self {
            EthAppError::Transport(e) => e,
            EthAppError::InvalidBip32Path(msg) => {
                LedgerAppError::InvalidDerivationPath(PathError::Unsupported(msg))
            }
            EthAppError::InvalidTransaction(msg) => LedgerAppError::InvalidTransaction(msg),
            EthAppError::InvalidSignature(_) => LedgerAppError::InvalidSignature,
            EthAppError::InvalidAddress(msg) | EthAppError::InvalidResponseData(msg) => {
                LedgerAppError::InvalidResponseData(msg)
            }
        }
    }
}

/// Result type alias for Ethereum application operations
pub type EthAppResult<T, E> = Result<T, EthAppError<E>>;
