// SPDX-License-Identifier: Apache-2.0

//! Ledger Ethereum Application SDK
//!
//! Raw commands of the Ethereum app ([`GetAddress`], [`GetConfiguration`],
//! [`SignTransaction`]) are implemented on the [`EthApp`] marker and take any
//! transport. [`EthereumApp`] binds them to a shared transport and an account
//! and implements [`LedgerApp`].
//!
//! Unlike the Substrate apps, the Ethereum app takes full BIP-32 paths:
//! a depth byte followed by each index as a big-endian `u32` with the
//! hardened bit set.

use std::sync::Arc;

use async_trait::async_trait;
use ledger_device_base::{
    App, ImportSettings, LedgerApp, LedgerAppError, LedgerAppResult, ProtocolIdentifier,
    SignedTransaction, UnsignedTransaction, WalletDescriptor,
};
use ledger_transport::{Exchange, SharedTransport};
use log::{debug, info};

pub mod commands;
pub mod errors;
pub mod instructions;
pub mod types;
pub mod utils;

pub use commands::*;
pub use errors::*;
pub use types::*;

/// Ethereum app marker implementing `App` trait CLA.
#[derive(Debug, Clone)]
pub struct EthApp;

impl App for EthApp {
    /// CLA for Ethereum app on Ledger (0xE0)
    const CLA: u8 = 0xE0;
}

/// Ethereum application client bound to a shared transport
#[derive(Debug)]
pub struct EthereumApp<E> {
    transport: Arc<SharedTransport<E>>,
    settings: ImportSettings,
}

impl<E> EthereumApp<E> {
    /// Create a client importing the first account, `44'/60'/0'/0/0`
    pub fn new(transport: Arc<SharedTransport<E>>) -> Self {
        Self::with_settings(transport, Self::default_settings())
    }

    /// Create a client importing the account described by `settings`
    pub fn with_settings(transport: Arc<SharedTransport<E>>, settings: ImportSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Settings importing the first account of the standard Ethereum path
    pub fn default_settings() -> ImportSettings {
        ImportSettings::new(ethereum_standard_path(0, 0))
    }

    /// Settings used by `import_wallet` and `sign_transaction`
    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }
}

impl<E> EthereumApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error + Send,
{
    /// Get Ethereum public address for the given BIP 32 path
    pub async fn get_address(
        &self,
        params: GetAddressParams,
    ) -> EthAppResult<PublicKeyInfo, E::Error> {
        let transport = self.transport.lock().await;
        EthApp::get_address(&transport, params).await
    }

    /// Get Ethereum application configuration
    pub async fn get_configuration(&self) -> EthAppResult<AppConfiguration, E::Error> {
        let transport = self.transport.lock().await;
        EthApp::get_configuration(&transport).await
    }

    /// Sign an RLP-encoded transaction with the configured account
    pub async fn sign_rlp_transaction(&self, rlp: &[u8]) -> EthAppResult<Signature, E::Error> {
        let params = SignTransactionParams::new(self.settings.derivation_path.clone(), rlp.to_vec());

        let transport = self.transport.lock().await;
        EthApp::sign_transaction(&transport, params).await
    }

    /// Sign an Ethereum transaction with specific processing mode
    ///
    /// Returns `None` for [`TransactionMode::StoreOnly`].
    pub async fn sign_transaction_with_mode(
        &self,
        params: SignTransactionParams,
        mode: TransactionMode,
    ) -> EthAppResult<Option<Signature>, E::Error> {
        let transport = self.transport.lock().await;
        EthApp::sign_transaction_with_mode(&transport, params, mode).await
    }
}

#[async_trait]
impl<E> LedgerApp<E> for EthereumApp<E>
where
    E: Exchange + Send + Sync,
    E::Error: std::error::Error + Send,
{
    fn app_identifier(&self) -> u8 {
        EthApp::CLA
    }

    fn protocol(&self) -> ProtocolIdentifier {
        ProtocolIdentifier::Ethereum
    }

    fn transport(&self) -> &Arc<SharedTransport<E>> {
        &self.transport
    }

    async fn is_available(&self) -> LedgerAppResult<bool, E::Error> {
        match self.get_configuration().await {
            Ok(config) => {
                debug!("eth app {}", config.version);
                Ok(true)
            }
            Err(err) => err.into_app_error().into_availability(),
        }
    }

    async fn import_wallet(&self) -> LedgerAppResult<WalletDescriptor, E::Error> {
        let mut params = GetAddressParams::new(self.settings.derivation_path.clone())
            .with_chain_code();
        if self.settings.display {
            params = params.with_display();
        }

        let info = self
            .get_address(params)
            .await
            .map_err(EthAppError::into_app_error)?;
        info!("eth: imported {} at {}", info.address, self.settings.derivation_path);

        Ok(WalletDescriptor {
            protocol: ProtocolIdentifier::Ethereum,
            public_key: info.public_key,
            address: info.address.address,
            derivation_path: self.settings.derivation_path.clone(),
            chain_code: info.chain_code.map(Into::into),
        })
    }

    async fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
    ) -> LedgerAppResult<SignedTransaction, E::Error> {
        let UnsignedTransaction::Ethereum(tx) = transaction else {
            return Err(LedgerAppError::UnsupportedTransaction {
                expected: ProtocolIdentifier::Ethereum,
                found: transaction.protocol(),
            });
        };

        let signature = self
            .sign_rlp_transaction(&tx.rlp)
            .await
            .map_err(EthAppError::into_app_error)?;

        Ok(SignedTransaction {
            transaction: transaction.clone(),
            signature: signature.to_vrs_bytes(),
        })
    }
}
