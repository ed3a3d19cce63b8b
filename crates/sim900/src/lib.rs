//! AT command driver for SIM900-class GSM/GPRS modems.
//!
//! This crate drives a modem over a serial byte stream to query SIM and
//! network status and to send, list and delete SMS messages. It provides:
//!
//! - **Command builders** ([`commands`]) -- the exact bytes for each AT
//!   command the driver issues.
//! - **Response grammar** ([`protocol`]) -- status-line scanning, listing
//!   fragment splitting and SMS decoding.
//! - **Messages** ([`sms`]) -- [`SmsRecord`], one decoded listing entry.
//! - **Wait budgets** ([`timing`]) -- the settle delay used by each
//!   operation.
//! - **Session** ([`modem`]) -- [`Sim900`], the AT command session.
//! - **Builder** ([`builder`]) -- [`Sim900Builder`] for opening sessions.
//!
//! # Example
//!
//! ```
//! use sim900::protocol::{split_listing_fragments, decode_fragment};
//!
//! let reply = "\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32:05+28\"\r\n\
//!              Hello there\r\n\r\nOK\r\n";
//! let fragments = split_listing_fragments(reply);
//! assert_eq!(fragments.len(), 1);
//!
//! let sms = decode_fragment(&fragments[0]).unwrap();
//! assert!(sms.is_new());
//! assert_eq!(sms.body(), "Hello there");
//! ```

pub mod builder;
pub mod commands;
pub mod modem;
pub mod protocol;
pub mod sms;
pub mod timing;

pub use builder::Sim900Builder;
pub use modem::{Sim900, DEFAULT_FACTORY_RESET_ATTEMPTS};
pub use protocol::SimStatus;
pub use sim900_core::{Error, Result, Transport};
pub use sms::{SmsRecord, SmsStatus};
pub use timing::Timing;
