//! Transport trait for modem communication.
//!
//! The [`Transport`] trait abstracts over the physical link to the modem.
//! The session in the `sim900` crate operates on a `Transport` rather than
//! directly on a serial port, enabling both real hardware control and
//! deterministic unit testing with `MockTransport` from the
//! `sim900-test-harness` crate.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous duplex byte stream to a modem.
///
/// Implementations handle buffering and error recovery at the physical
/// layer. AT command framing and response scraping belong to the session
/// that consumes this trait.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the modem.
    ///
    /// Implementations should not return until all bytes have been handed to
    /// the underlying device.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the modem into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`](crate::error::Error::Timeout)
    /// if nothing is buffered within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Push any buffered outgoing bytes to the device.
    async fn flush(&mut self) -> Result<()>;

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}
