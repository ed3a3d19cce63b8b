//! Mock transport for deterministic testing of the AT command session.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/reply pairs. This lets you test command framing, the init
//! sequence, and response scraping without a modem.
//!
//! # Example
//!
//! ```
//! use sim900_test_harness::MockTransport;
//!
//! let mock = MockTransport::new();
//! // When the session sends `AT\r`, the modem answers `OK`.
//! mock.expect(b"AT\r", b"\r\nOK\r\n");
//! // The body of an SMS gets no reply until the network answers.
//! mock.expect_silent(b"hello\x1a");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use sim900_core::error::{Error, Result};
use sim900_core::transport::Transport;

/// What the mock modem does after a matching request.
#[derive(Debug, Clone)]
enum Reply {
    /// Make these bytes available to `receive()`.
    Bytes(Vec<u8>),
    /// Fail the next `receive()` with [`Error::Transport`].
    Fail(String),
}

/// A pre-loaded request/reply pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    reply: Reply,
}

/// Mutable state behind a [`MockTransport`].
#[derive(Debug, Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be read.
    rx_buffer: VecDeque<u8>,
    /// A read failure to report on the next `receive()` call.
    pending_failure: Option<String>,
    disconnected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
    flushes: usize,
}

/// A mock [`Transport`] standing in for a modem on a serial line.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation. The reply
/// bytes are appended to the receive buffer, where they stay until read;
/// once the buffer is empty `receive()` reports [`Error::Timeout`], the same
/// way a quiet serial line does.
///
/// If no expectation matches or the queue is exhausted, `send()` returns an
/// error.
///
/// Clones share the same script and log, so a test can hand one clone to
/// the session and keep another to inspect what was sent.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the log from other assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add an expected request and the reply the modem gives to it.
    pub fn expect(&self, request: &[u8], reply: &[u8]) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: Reply::Bytes(reply.to_vec()),
        });
    }

    /// Add an expected request the modem does not answer.
    pub fn expect_silent(&self, request: &[u8]) {
        self.expect(request, b"");
    }

    /// Add an expected request after which reading from the line fails.
    pub fn expect_receive_error(&self, request: &[u8], message: &str) {
        self.state().expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: Reply::Fail(message.to_string()),
        });
    }

    /// Make bytes available before the next request, as the modem does when
    /// it pushes an unsolicited result code such as `+CMTI`.
    pub fn queue_unsolicited(&self, data: &[u8]) {
        self.state().rx_buffer.extend(data.iter().copied());
    }

    /// Return all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        self.state().sent_log.clone()
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.state().expectations.len()
    }

    /// Return how many times `flush()` has been called.
    pub fn flush_count(&self) -> usize {
        self.state().flushes
    }

    /// Return the number of received bytes nobody has read yet.
    pub fn unread_len(&self) -> usize {
        self.state().rx_buffer.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&self, connected: bool) {
        self.state().disconnected = !connected;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state();
        if state.disconnected {
            return Err(Error::NotConnected);
        }

        state.sent_log.push(data.to_vec());

        let expectation = state
            .expectations
            .pop_front()
            .ok_or_else(|| Error::Transport("no more expectations in mock transport".into()))?;

        if data != expectation.request.as_slice() {
            return Err(Error::Transport(format!(
                "unexpected send data: expected {:?}, got {:?}",
                String::from_utf8_lossy(&expectation.request),
                String::from_utf8_lossy(data)
            )));
        }

        match expectation.reply {
            Reply::Bytes(bytes) => state.rx_buffer.extend(bytes),
            Reply::Fail(message) => state.pending_failure = Some(message),
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = self.state();
        if state.disconnected {
            return Err(Error::NotConnected);
        }

        if let Some(message) = state.pending_failure.take() {
            return Err(Error::Transport(message));
        }

        if state.rx_buffer.is_empty() {
            return Err(Error::Timeout);
        }

        let n = state.rx_buffer.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx_buffer.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn flush(&mut self) -> Result<()> {
        let mut state = self.state();
        if state.disconnected {
            return Err(Error::NotConnected);
        }
        state.flushes += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.disconnected = true;
        state.rx_buffer.clear();
        state.pending_failure = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.state().disconnected
    }
}
