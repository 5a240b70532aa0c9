// SPDX-License-Identifier: Apache-2.0

//! Ledger Kusama and Polkadot applications
//!
//! Both apps speak the same protocol and differ only in their APDU class and
//! coin type. Account paths are sent relative to `44'/coin_type'` (the app
//! fixes purpose and coin type itself), framed as one byte per segment behind
//! a length byte. The firmware hardens every segment, so the stripped
//! hardened markers carry no information on this wire.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use ledger_device_base::{
    AppExt, ImportSettings, LedgerApp, LedgerAppError, LedgerAppResult, ProtocolIdentifier,
    SignedTransaction, UnsignedTransaction, WalletDescriptor, USER_MESSAGE_CHUNK_SIZE,
};
use ledger_transport::{Exchange, SharedTransport};
use log::{debug, info};

pub mod commands;
pub mod instructions;
pub mod network;

pub use commands::*;
pub use network::{Kusama, Polkadot, SubstrateNetwork};

/// Largest payload `send_chunks` can stream: 255 chunks
const MAX_SIGNING_PAYLOAD_LEN: usize = 255 * USER_MESSAGE_CHUNK_SIZE;

/// Ledger app of a Substrate network
pub struct SubstrateApp<N, E> {
    transport: Arc<SharedTransport<E>>,
    settings: ImportSettings,
    _network: PhantomData<fn() -> N>,
}

/// Kusama Ledger app
pub type KusamaApp<E> = SubstrateApp<Kusama, E>;

/// Polkadot Ledger app
pub type PolkadotApp<E> = SubstrateApp<Polkadot, E>;

impl<N: SubstrateNetwork, E> SubstrateApp<N, E> {
    /// Create an app importing the first account
    pub fn new(transport: Arc<SharedTransport<E>>) -> Self {
        Self::with_settings(transport, N::default_settings())
    }

    /// Create an app importing the account described by `settings`.
    ///
    /// The derivation path is relative to `44'/coin_type'`.
    pub fn with_settings(transport: Arc<SharedTransport<E>>, settings: ImportSettings) -> Self {
        Self {
            transport,
            settings,
            _network: PhantomData,
        }
    }

    /// Settings used by `import_wallet` and `sign_transaction`
    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }
}

impl<N: SubstrateNetwork, E> std::fmt::Debug for SubstrateApp<N, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubstrateApp")
            .field("network", &N::NAME)
            .field("settings", &self.settings)
            .finish()
    }
}

#[async_trait]
impl<N, E> LedgerApp<E> for SubstrateApp<N, E>
where
    N: SubstrateNetwork,
    E: Exchange + Send + Sync,
    E::Error: std::error::Error + Send,
{
    fn app_identifier(&self) -> u8 {
        N::CLA
    }

    fn protocol(&self) -> ProtocolIdentifier {
        N::PROTOCOL
    }

    fn transport(&self) -> &Arc<SharedTransport<E>> {
        &self.transport
    }

    async fn is_available(&self) -> LedgerAppResult<bool, E::Error> {
        let transport = self.transport.lock().await;

        match N::get_version(&transport).await {
            Ok(version) => {
                debug!("{} app {} (locked: {})", N::NAME, version, version.locked);
                Ok(!version.locked)
            }
            Err(err) => err.into_availability(),
        }
    }

    async fn import_wallet(&self) -> LedgerAppResult<WalletDescriptor, E::Error> {
        let account_path = &self.settings.derivation_path;
        let derivation_path =
            N::full_path(account_path).map_err(LedgerAppError::InvalidDerivationPath)?;

        let transport = self.transport.lock().await;
        let address = N::get_address(&transport, account_path, self.settings.display).await?;
        info!("{}: imported {} at {}", N::NAME, address.ss58, derivation_path);

        Ok(WalletDescriptor {
            protocol: N::PROTOCOL,
            public_key: address.public_key.to_vec(),
            address: address.ss58,
            derivation_path,
            chain_code: None,
        })
    }

    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> LedgerAppResult<SignedTransaction, E::Error> {
        if transaction.protocol() != N::PROTOCOL {
            return Err(LedgerAppError::UnsupportedTransaction {
                expected: N::PROTOCOL,
                found: transaction.protocol(),
            });
        }

        let payload = transaction.signing_payload();
        if payload.is_empty() {
            return Err(LedgerAppError::InvalidTransaction(
                "Signing payload cannot be empty".to_string(),
            ));
        }
        if payload.len() > MAX_SIGNING_PAYLOAD_LEN {
            return Err(LedgerAppError::InvalidTransaction(format!(
                "Signing payload of {} bytes exceeds {} bytes",
                payload.len(),
                MAX_SIGNING_PAYLOAD_LEN
            )));
        }

        let transport = self.transport.lock().await;
        let signature = N::sign(&transport, &self.settings.derivation_path, payload).await?;

        Ok(SignedTransaction {
            transaction: transaction.clone(),
            signature: signature.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use ledger_device_base::{EthereumTransaction, FailureKind, SubstrateTransaction};
    use ledger_transport::mock::{MockExchange, MockExchangeError};

    use super::*;

    const SS58: &str = "FmK43tjzFGT9F68Sj9EvW6rwBQUAVuA9wNQaYxGLvfcCAxS";

    fn shared(mock: MockExchange) -> Arc<SharedTransport<MockExchange>> {
        Arc::new(SharedTransport::new(mock))
    }

    fn kusama_tx(payload: Vec<u8>) -> UnsignedTransaction {
        UnsignedTransaction::Kusama(SubstrateTransaction { payload })
    }

    #[test]
    fn app_identifiers() {
        let transport = shared(MockExchange::new());

        assert_eq!(KusamaApp::new(transport.clone()).app_identifier(), 0x99);
        assert_eq!(PolkadotApp::new(transport.clone()).app_identifier(), 0x90);
        assert_eq!(
            PolkadotApp::new(transport).protocol(),
            ProtocolIdentifier::Polkadot
        );
    }

    #[test]
    fn available_when_version_answers() {
        let transport = shared(MockExchange::new().with_answer(&[0, 2, 0, 1], 0x9000));
        let app = KusamaApp::new(transport);

        assert!(block_on(app.is_available()).unwrap());
    }

    #[test]
    fn unavailable_when_locked() {
        let transport = shared(
            MockExchange::new().with_answer(&[0, 2, 0, 1, 1, 0x33, 0, 0, 4], 0x9000),
        );
        let app = KusamaApp::new(transport);

        assert!(!block_on(app.is_available()).unwrap());
    }

    #[test]
    fn unavailable_when_app_not_open() {
        for status_word in [0x6E00, 0x6511, 0x6D00, 0x5515] {
            let transport = shared(MockExchange::new().with_answer(&[], status_word));
            let app = PolkadotApp::new(transport);

            assert!(!block_on(app.is_available()).unwrap());
        }
    }

    #[test]
    fn availability_check_propagates_disconnect() {
        let transport = shared(MockExchange::new().with_error(MockExchangeError::Disconnected));
        let app = KusamaApp::new(transport);

        let err = block_on(app.is_available()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::TransportFault);
    }

    #[test]
    fn import_wallet_builds_descriptor() {
        let mut answer = vec![0x8d; 32];
        answer.extend_from_slice(SS58.as_bytes());
        let transport = shared(MockExchange::new().with_answer(&answer, 0x9000));

        let settings = ImportSettings::new("1'/0'/2'".parse().unwrap()).with_display();
        let app = KusamaApp::with_settings(transport.clone(), settings);

        let wallet = block_on(app.import_wallet()).unwrap();

        assert_eq!(wallet.protocol, ProtocolIdentifier::Kusama);
        assert_eq!(wallet.public_key, vec![0x8d; 32]);
        assert_eq!(wallet.address, SS58);
        assert_eq!(wallet.derivation_path.to_string(), "44'/434'/1'/0'/2'");
        assert_eq!(
            transport.inner().requests(),
            vec![vec![0x99, 0x01, 0x01, 0x00, 4, 3, 1, 0, 2]]
        );
    }

    #[test]
    fn import_wallet_user_rejected() {
        let transport = shared(MockExchange::new().with_answer(&[], 0x6985));
        let app = KusamaApp::new(transport);

        let err = block_on(app.import_wallet()).unwrap_err();
        assert!(err.is_user_rejected());
    }

    #[test]
    fn import_wallet_propagates_timeout() {
        let transport = shared(MockExchange::new().with_error(MockExchangeError::Timeout));
        let app = PolkadotApp::new(transport);

        let err = block_on(app.import_wallet()).unwrap_err();
        assert_eq!(
            err,
            LedgerAppError::TransportError(MockExchangeError::Timeout)
        );
    }

    #[test]
    fn sign_transaction_combines_signature() {
        // init + one last chunk
        let transport = shared(
            MockExchange::new()
                .with_answer(&[], 0x9000)
                .with_answer(&[0x42; 64], 0x9000),
        );
        let app = KusamaApp::new(transport.clone());
        let tx = kusama_tx(vec![0x04; 16]);

        let signed = block_on(app.sign_transaction(&tx)).unwrap();

        assert_eq!(signed.transaction, tx);
        assert_eq!(signed.signature, vec![0x42; 64]);
        assert_eq!(signed.protocol(), ProtocolIdentifier::Kusama);

        let p1s: Vec<u8> = transport
            .inner()
            .requests()
            .iter()
            .map(|request| request[2])
            .collect();
        assert_eq!(p1s, vec![0x00, 0x02]);
        assert_eq!(transport.inner().remaining(), 0);
    }

    #[test]
    fn sign_transaction_streams_multiple_chunks() {
        let transport = shared(
            MockExchange::new()
                .with_answer(&[], 0x9000)
                .with_answer(&[], 0x9000)
                .with_answer(&[0x43; 64], 0x9000),
        );
        let app = KusamaApp::new(transport.clone());

        let signed = block_on(app.sign_transaction(&kusama_tx(vec![0x04; 300]))).unwrap();
        assert_eq!(signed.signature, vec![0x43; 64]);

        let requests = transport.inner().requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(&requests[1][..5], &[0x99, 0x02, 0x01, 0x00, 250]);
        assert_eq!(&requests[2][..5], &[0x99, 0x02, 0x02, 0x00, 50]);
        assert_eq!(transport.inner().remaining(), 0);
    }

    #[test]
    fn sign_transaction_rejects_other_protocols() {
        let transport = shared(MockExchange::new());
        let app = PolkadotApp::new(transport.clone());

        let eth = UnsignedTransaction::Ethereum(EthereumTransaction { rlp: vec![0xf8] });
        let err = block_on(app.sign_transaction(&eth)).unwrap_err();
        assert!(err.is_invalid_input());

        let err = block_on(app.sign_transaction(&kusama_tx(vec![1]))).unwrap_err();
        assert!(matches!(
            err,
            LedgerAppError::UnsupportedTransaction {
                expected: ProtocolIdentifier::Polkadot,
                found: ProtocolIdentifier::Kusama,
            }
        ));
        assert!(transport.inner().requests().is_empty());
    }

    #[test]
    fn sign_transaction_rejects_empty_payload() {
        let transport = shared(MockExchange::new());
        let app = KusamaApp::new(transport);

        let err = block_on(app.sign_transaction(&kusama_tx(Vec::new()))).unwrap_err();
        assert!(matches!(err, LedgerAppError::InvalidTransaction(_)));
    }

    #[test]
    fn sign_transaction_rejects_oversized_payload() {
        let transport = shared(MockExchange::new());
        let app = KusamaApp::new(transport.clone());

        let tx = kusama_tx(vec![0u8; 256 * 250]);
        let err = block_on(app.sign_transaction(&tx)).unwrap_err();

        assert!(matches!(err, LedgerAppError::InvalidTransaction(_)));
        assert_eq!(err.kind(), FailureKind::MalformedInput);
        assert!(transport.inner().requests().is_empty());
    }

    #[test]
    fn sign_transaction_disconnect_is_transport_fault() {
        let transport = shared(
            MockExchange::new()
                .with_answer(&[], 0x9000)
                .with_error(MockExchangeError::Disconnected),
        );
        let app = KusamaApp::new(transport);

        let err = block_on(app.sign_transaction(&kusama_tx(vec![1, 2, 3]))).unwrap_err();
        assert!(err.is_transport_error());
    }

    #[test]
    fn concurrent_signing_on_shared_transport_is_serialized() {
        // two apps, one transport: init + 2 chunks each
        let mock = MockExchange::new();
        for signature in [[0x0A; 64], [0x0B; 64]] {
            mock.push_answer(&[], 0x9000);
            mock.push_answer(&[], 0x9000);
            mock.push_answer(&signature, 0x9000);
        }
        let transport = shared(mock);

        let kusama = KusamaApp::new(transport.clone());
        let polkadot = PolkadotApp::new(transport.clone());
        let kusama_tx = kusama_tx(vec![0x01; 300]);
        let polkadot_tx = UnsignedTransaction::Polkadot(SubstrateTransaction {
            payload: vec![0x02; 300],
        });

        let (first, second) = block_on(async {
            futures::join!(
                kusama.sign_transaction(&kusama_tx),
                polkadot.sign_transaction(&polkadot_tx)
            )
        });

        assert_eq!(first.unwrap().signature, vec![0x0A; 64]);
        assert_eq!(second.unwrap().signature, vec![0x0B; 64]);

        let classes: Vec<u8> = transport
            .inner()
            .requests()
            .iter()
            .map(|request| request[0])
            .collect();
        assert_eq!(classes, vec![0x99, 0x99, 0x99, 0x90, 0x90, 0x90]);
        assert_eq!(transport.inner().remaining(), 0);
    }
}
