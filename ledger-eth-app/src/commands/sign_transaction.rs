// SPDX-License-Identifier: Apache-2.0

//! SIGN ETH TRANSACTION command implementation

use async_trait::async_trait;
use ledger_device_base::{App, AppExt};
use ledger_transport::{APDUCommand, Exchange};
use log::debug;

use crate::errors::{EthAppError, EthAppResult};
use crate::instructions::{ins, length, p1_sign_transaction, p2_sign_transaction};
use crate::types::{SignTransactionParams, Signature};
use crate::utils::{encode_bip32_path, validate_bip32_path};
use crate::EthApp;

/// Transaction processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Process transaction data and start signing flow immediately
    ProcessAndStart,
    /// Store transaction data only, don't start signing flow
    StoreOnly,
    /// Start signing flow using previously stored data
    StartFlow,
}

impl TransactionMode {
    fn to_p2(self) -> u8 {
        match self {
            TransactionMode::ProcessAndStart => p2_sign_transaction::PROCESS_AND_START,
            TransactionMode::StoreOnly => p2_sign_transaction::STORE_ONLY,
            TransactionMode::StartFlow => p2_sign_transaction::START_FLOW,
        }
    }
}

#[async_trait]
pub trait SignTransaction<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    /// Sign an Ethereum transaction using the given BIP 32 path
    async fn sign_transaction(
        transport: &E,
        params: SignTransactionParams,
    ) -> EthAppResult<Signature, E::Error>;

    /// Sign an Ethereum transaction with specific processing mode
    async fn sign_transaction_with_mode(
        transport: &E,
        params: SignTransactionParams,
        mode: TransactionMode,
    ) -> EthAppResult<Option<Signature>, E::Error>;
}

#[async_trait]
impl<E> SignTransaction<E> for EthApp
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error,
{
    async fn sign_transaction(
        transport: &E,
        params: SignTransactionParams,
    ) -> EthAppResult<Signature, E::Error> {
        match Self::sign_transaction_with_mode(transport, params, TransactionMode::ProcessAndStart)
            .await?
        {
            Some(signature) => Ok(signature),
            None => Err(EthAppError::InvalidResponseData(
                "Expected signature but got none".to_string(),
            )),
        }
    }

    async fn sign_transaction_with_mode(
        transport: &E,
        params: SignTransactionParams,
        mode: TransactionMode,
    ) -> EthAppResult<Option<Signature>, E::Error> {
        validate_bip32_path(&params.path)?;

        if mode == TransactionMode::StartFlow {
            let command = APDUCommand {
                cla: Self::CLA,
                ins: ins::SIGN_ETH_TRANSACTION,
                p1: p1_sign_transaction::FIRST_DATA_BLOCK,
                p2: mode.to_p2(),
                data: Vec::new(),
            };

            let response = transport
                .exchange(&command)
                .await
                .map_err(|e| EthAppError::Transport(e.into()))?;
            <EthApp as AppExt<E>>::handle_response_error_signature(&response)?;

            return parse_signature_response::<E::Error>(response.data()).map(Some);
        }

        if params.transaction_data.is_empty() {
            return Err(EthAppError::InvalidTransaction(
                "Transaction data cannot be empty".to_string(),
            ));
        }

        let blocks = split_transaction(&params)?;
        let last_block = blocks.len() - 1;
        let mut signature = None;

        for (i, data) in blocks.into_iter().enumerate() {
            let p1 = if i == 0 {
                p1_sign_transaction::FIRST_DATA_BLOCK
            } else {
                p1_sign_transaction::SUBSEQUENT_DATA_BLOCK
            };

            debug!(
                "eth: transaction block {}/{} ({} bytes)",
                i + 1,
                last_block + 1,
                data.len()
            );

            let command = APDUCommand {
                cla: Self::CLA,
                ins: ins::SIGN_ETH_TRANSACTION,
                p1,
                p2: mode.to_p2(),
                data,
            };

            let response = transport
                .exchange(&command)
                .await
                .map_err(|e| EthAppError::Transport(e.into()))?;

            if i == last_block && mode != TransactionMode::StoreOnly {
                <EthApp as AppExt<E>>::handle_response_error_signature(&response)?;
                signature = Some(parse_signature_response::<E::Error>(response.data())?);
            } else {
                <EthApp as AppExt<E>>::handle_response_error(&response)?;
            }
        }

        Ok(signature)
    }
}

/// Split path and transaction into APDU bodies.
///
/// The first block carries the encoded path followed by as much transaction
/// data as fits; later blocks carry transaction data only.
fn split_transaction<E: std::error::Error>(
    params: &SignTransactionParams,
) -> EthAppResult<Vec<Vec<u8>>, E> {
    let path_data = encode_bip32_path(&params.path);

    if path_data.len() >= length::MAX_MESSAGE_CHUNK_SIZE {
        return Err(EthAppError::InvalidBip32Path(
            "BIP32 path too long for transaction signing".to_string(),
        ));
    }

    let first_size = length::MAX_MESSAGE_CHUNK_SIZE - path_data.len();
    let split = first_size.min(params.transaction_data.len());
    let (head, tail) = params.transaction_data.split_at(split);

    let mut first = path_data;
    first.extend_from_slice(head);

    let mut blocks = vec![first];
    blocks.extend(
        tail.chunks(length::MAX_MESSAGE_CHUNK_SIZE)
            .map(<[u8]>::to_vec),
    );

    Ok(blocks)
}

/// Parse signature response data: `v || r || s`
fn parse_signature_response<E: std::error::Error>(data: &[u8]) -> EthAppResult<Signature, E> {
    Signature::from_vrs(data).ok_or_else(|| {
        EthAppError::InvalidSignature(format!(
            "answer of {} bytes (expected {})",
            data.len(),
            length::SIGNATURE_SIZE
        ))
    })
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use ledger_device_base::LedgerAppError;
    use ledger_transport::mock::{MockExchange, MockExchangeError};

    use super::*;
    use crate::types::ethereum_standard_path;

    type Error = std::io::Error;

    fn signature_answer() -> Vec<u8> {
        let mut data = vec![0x1c];
        data.extend(vec![0xAA; 32]);
        data.extend(vec![0xBB; 32]);
        data
    }

    #[test]
    fn test_transaction_mode_to_p2() {
        assert_eq!(
            TransactionMode::ProcessAndStart.to_p2(),
            p2_sign_transaction::PROCESS_AND_START
        );
        assert_eq!(
            TransactionMode::StoreOnly.to_p2(),
            p2_sign_transaction::STORE_ONLY
        );
        assert_eq!(
            TransactionMode::StartFlow.to_p2(),
            p2_sign_transaction::START_FLOW
        );
    }

    #[test]
    fn test_parse_signature_response() {
        let signature = parse_signature_response::<Error>(&signature_answer()).unwrap();

        assert_eq!(signature.v, 0x1c);
        assert_eq!(signature.r, [0xAA; 32]);
        assert_eq!(signature.s, [0xBB; 32]);
    }

    #[test]
    fn test_parse_signature_response_invalid_length() {
        let result = parse_signature_response::<Error>(&[0x1c; 64]);
        assert!(matches!(
            result.unwrap_err(),
            EthAppError::InvalidSignature(_)
        ));
    }

    #[test]
    fn test_split_transaction() {
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0x42; 600]);
        let blocks = split_transaction::<Error>(&params).unwrap();

        // 21 byte path leaves 234 bytes of the first block for the transaction
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].len(), 255);
        assert_eq!(blocks[0][0], 5);
        assert_eq!(blocks[1].len(), 255);
        assert_eq!(blocks[2].len(), 600 - 234 - 255);
    }

    #[test]
    fn test_split_short_transaction() {
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0xf8, 0x6c]);
        let blocks = split_transaction::<Error>(&params).unwrap();

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].len(), 23);
    }

    #[test]
    fn test_sign_transaction_streams_blocks() {
        let mock = MockExchange::new()
            .with_answer(&[], 0x9000)
            .with_answer(&signature_answer(), 0x9000);
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0x42; 300]);

        let signature = block_on(EthApp::sign_transaction(&mock, params)).unwrap();
        assert_eq!(signature.v, 0x1c);

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(&requests[0][..5], &[0xE0, 0x04, 0x00, 0x00, 255]);
        assert_eq!(&requests[1][..5], &[0xE0, 0x04, 0x80, 0x00, 66]);
    }

    #[test]
    fn test_sign_transaction_store_only() {
        let mock = MockExchange::new().with_answer(&[], 0x9000);
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0x42; 10]);

        let result = block_on(EthApp::sign_transaction_with_mode(
            &mock,
            params,
            TransactionMode::StoreOnly,
        ));
        assert_eq!(result.unwrap(), None);
        assert_eq!(mock.requests()[0][3], p2_sign_transaction::STORE_ONLY);
    }

    #[test]
    fn test_sign_empty_transaction() {
        let mock = MockExchange::new();
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), Vec::new());

        let result = block_on(EthApp::sign_transaction(&mock, params));
        assert!(matches!(result, Err(EthAppError::InvalidTransaction(_))));
        assert!(mock.requests().is_empty());
    }

    #[test]
    fn test_sign_transaction_rejected() {
        let mock = MockExchange::new().with_answer(&[], 0x6985);
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0x42; 10]);

        let err = block_on(EthApp::sign_transaction(&mock, params)).unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[test]
    fn test_sign_transaction_disconnect() {
        let mock = MockExchange::new().with_error(MockExchangeError::Disconnected);
        let params = SignTransactionParams::new(ethereum_standard_path(0, 0), vec![0x42; 10]);

        let err = block_on(EthApp::sign_transaction(&mock, params)).unwrap_err();
        assert_eq!(
            err,
            EthAppError::Transport(LedgerAppError::TransportError(
                MockExchangeError::Disconnected
            ))
        );
    }
}
