//! Transport implementations for the SIM900 driver.
//!
//! This crate provides [`SerialTransport`], an implementation of the
//! [`Transport`](sim900_core::Transport) trait over a USB-serial adapter or
//! a UART device node.
//!
//! # Example
//!
//! ```no_run
//! use sim900_transport::SerialTransport;
//! use sim900_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> sim900_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 115_200).await?;
//!
//! transport.send(b"AT\r").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_millis(250)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::SerialTransport;
