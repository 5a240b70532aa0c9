// SPDX-License-Identifier: Apache-2.0

//! Scripted in-memory transport
//!
//! [`MockExchange`] answers commands from a queue of canned answers and records
//! every serialised command it receives. Each exchange yields to the executor
//! once before answering, like a real device round trip would.

use std::collections::VecDeque;
use std::future::Future;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use async_trait::async_trait;
use ledger_apdu::{APDUAnswer, APDUCommand};
use log::debug;
use thiserror::Error;

use crate::Exchange;

/// Transport faults produced by [`MockExchange`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockExchangeError {
    /// The device went away
    #[error("device disconnected")]
    Disconnected,
    /// The device did not answer in time
    #[error("exchange timed out")]
    Timeout,
    /// The script ran out of answers
    #[error("no scripted answer left for command {0}")]
    Exhausted(String),
}

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<Result<Vec<u8>, MockExchangeError>>,
    requests: Vec<Vec<u8>>,
}

/// In-memory transport answering from a script
#[derive(Debug, Default)]
pub struct MockExchange {
    script: Mutex<Script>,
}

impl MockExchange {
    /// Create an exchange with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer with the given body and status word
    pub fn with_answer(self, body: &[u8], status_word: u16) -> Self {
        self.push_answer(body, status_word);
        self
    }

    /// Queue a transport fault
    pub fn with_error(self, error: MockExchangeError) -> Self {
        self.push_error(error);
        self
    }

    /// Queue an answer with the given body and status word
    pub fn push_answer(&self, body: &[u8], status_word: u16) {
        let mut answer = body.to_vec();
        answer.extend_from_slice(&status_word.to_be_bytes());
        self.script().answers.push_back(Ok(answer));
    }

    /// Queue a transport fault
    pub fn push_error(&self, error: MockExchangeError) {
        self.script().answers.push_back(Err(error));
    }

    /// Every command received so far, serialised
    pub fn requests(&self) -> Vec<Vec<u8>> {
        self.script().requests.clone()
    }

    /// Number of scripted answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.script().answers.len()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("mock script poisoned")
    }
}

#[async_trait]
impl Exchange for MockExchange {
    type Error = MockExchangeError;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        let request = command.serialize();
        debug!("mock << {:02x?}", request);
        self.script().requests.push(request.clone());

        YieldNow::default().await;

        let answer = self
            .script()
            .answers
            .pop_front()
            .unwrap_or_else(|| Err(MockExchangeError::Exhausted(format!("{:02x?}", request))))?;
        debug!("mock >> {:02x?}", answer);

        APDUAnswer::from_answer(answer)
            .map_err(|_| MockExchangeError::Exhausted("scripted answer too short".to_string()))
    }
}

#[derive(Default)]
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }

        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
