//! sim900-test-harness: Test utilities and mock transports for the SIM900
//! driver.
//!
//! This crate provides [`MockTransport`] for deterministic testing of the
//! AT command session without a modem attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;
