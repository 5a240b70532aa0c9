// SPDX-License-Identifier: Apache-2.0

//! Single-flight access to a transport shared by several device applications

use std::ops::Deref;

use async_trait::async_trait;
use futures::lock::{Mutex, MutexGuard};
use ledger_apdu::{APDUAnswer, APDUCommand};
use log::trace;

use crate::Exchange;

/// A transport shared between device applications.
///
/// Device applications never talk to the wrapped exchange directly: they take a
/// [`TransportGuard`] with [`SharedTransport::lock`] and keep it for the whole
/// request sequence of one operation. A second operation waits until the guard
/// is dropped, so multi-APDU flows (chunked signing) never interleave.
///
/// The device applications only borrow the transport; opening and closing the
/// underlying connection stays with whoever built it.
#[derive(Debug)]
pub struct SharedTransport<E> {
    exchange: E,
    in_flight: Mutex<()>,
}

impl<E> SharedTransport<E> {
    /// Wrap an exchange
    pub fn new(exchange: E) -> Self {
        Self {
            exchange,
            in_flight: Mutex::new(()),
        }
    }

    /// Wait until no other operation is in flight and take the transport
    pub async fn lock(&self) -> TransportGuard<'_, E> {
        let permit = self.in_flight.lock().await;
        trace!("transport acquired");

        TransportGuard {
            exchange: &self.exchange,
            _permit: permit,
        }
    }

    /// Take the transport if no operation is in flight
    pub fn try_lock(&self) -> Option<TransportGuard<'_, E>> {
        self.in_flight.try_lock().map(|permit| TransportGuard {
            exchange: &self.exchange,
            _permit: permit,
        })
    }

    /// The wrapped exchange.
    ///
    /// Calling it directly bypasses the single-flight guard.
    pub fn inner(&self) -> &E {
        &self.exchange
    }

    /// Unwrap the exchange
    pub fn into_inner(self) -> E {
        self.exchange
    }
}

/// Exclusive access to a [`SharedTransport`] for the lifetime of the guard
pub struct TransportGuard<'a, E> {
    exchange: &'a E,
    _permit: MutexGuard<'a, ()>,
}

impl<E> Drop for TransportGuard<'_, E> {
    fn drop(&mut self) {
        trace!("transport released");
    }
}

#[async_trait]
impl<E> Exchange for TransportGuard<'_, E>
where
    E: Exchange + Send + Sync,
{
    type Error = E::Error;
    type AnswerType = E::AnswerType;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        self.exchange.exchange(command).await
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::mock::MockExchange;

    #[test]
    fn guard_forwards_exchange() {
        let transport = SharedTransport::new(MockExchange::new().with_answer(&[0x01], 0x9000));

        let answer = block_on(async {
            let guard = transport.lock().await;
            let command = APDUCommand {
                cla: 0x99,
                ins: 0x00,
                p1: 0x00,
                p2: 0x00,
                data: Vec::new(),
            };
            guard.exchange(&command).await
        })
        .unwrap();

        assert_eq!(answer.data(), &[0x01]);
        assert_eq!(
            transport.inner().requests(),
            vec![vec![0x99, 0x00, 0x00, 0x00, 0x00]]
        );
    }

    #[test]
    fn second_guard_waits_for_the_first() {
        let transport = SharedTransport::new(MockExchange::new());

        let first = transport.try_lock();
        assert!(first.is_some());
        assert!(transport.try_lock().is_none());

        drop(first);
        assert!(transport.try_lock().is_some());
    }
}
