//! sim900-core: Error definitions and the transport abstraction for the
//! SIM900 modem driver.
//!
//! The driver crate (`sim900`) speaks AT commands over anything that
//! implements [`Transport`]. Concrete transports live in
//! `sim900-transport` (serial ports) and `sim900-test-harness` (scripted
//! mocks), so protocol code never depends on a specific device.
//!
//! # Key types
//!
//! - [`Transport`] -- duplex byte stream to the modem
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;

pub use error::{Error, Result};
pub use transport::Transport;
