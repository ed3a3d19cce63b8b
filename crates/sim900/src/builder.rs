//! Sim900Builder -- fluent builder for opening [`Sim900`] sessions.
//!
//! Separates configuration from construction so that callers can set up
//! the serial port, baud rate and wait budgets before the byte stream is
//! opened.
//!
//! # Example
//!
//! ```no_run
//! use sim900::Sim900Builder;
//!
//! # async fn example() -> sim900::Result<()> {
//! let mut modem = Sim900Builder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .build()
//!     .await?;
//! println!("{:?}", modem.sim_status().await?);
//! modem.close().await?;
//! # Ok(())
//! # }
//! ```

use sim900_core::error::{Error, Result};
use sim900_core::transport::Transport;

use crate::modem::Sim900;
use crate::timing::Timing;

/// Factory default baud rate of the SIM900 UART.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Fluent builder for [`Sim900`].
pub struct Sim900Builder {
    serial_port: Option<String>,
    baud_rate: u32,
    timing: Timing,
    verify_liveness: bool,
}

impl Sim900Builder {
    pub fn new() -> Self {
        Sim900Builder {
            serial_port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timing: Timing::default(),
            verify_liveness: true,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the baud rate (default: 115200).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Replace the wait budgets (default: [`Timing::default`]).
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Whether opening the session requires an `OK` to the `AT` probe
    /// (default: true).
    pub fn verify_liveness(mut self, enabled: bool) -> Self {
        self.verify_liveness = enabled;
        self
    }

    /// Open a session over a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `sim900-test-harness`) and for callers that manage the byte stream
    /// themselves.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<Sim900> {
        Sim900::open_with(transport, self.baud_rate, self.timing, self.verify_liveness).await
    }

    /// Open the serial port and then the session.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<Sim900> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = sim900_transport::SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for Sim900Builder {
    fn default() -> Self {
        Self::new()
    }
}
