//! Stored SMS messages as reported by a listing.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use sim900_core::error::Error;

/// Read status marker of a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmsStatus {
    /// `REC READ` -- received and already read.
    Read,
    /// `REC UNREAD` -- received and not yet read.
    Unread,
}

impl SmsStatus {
    /// The marker text as it appears in a listing, without quotes.
    pub fn as_str(&self) -> &'static str {
        match self {
            SmsStatus::Read => "REC READ",
            SmsStatus::Unread => "REC UNREAD",
        }
    }
}

impl fmt::Display for SmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SmsStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_matches('"') {
            "REC READ" => Ok(SmsStatus::Read),
            "REC UNREAD" => Ok(SmsStatus::Unread),
            other => Err(Error::Parse(format!("unknown read status {other:?}"))),
        }
    }
}

/// One message decoded from a `+CMGL` listing entry.
///
/// Records are only built by
/// [`decode_fragment`](crate::protocol::decode_fragment), which refuses
/// fragments missing any field, and cannot be modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsRecord {
    index: u32,
    status: SmsStatus,
    phone: String,
    timestamp: NaiveDateTime,
    body: String,
    /// The listing fragment this record was decoded from.
    raw: String,
}

impl SmsRecord {
    pub(crate) fn new(
        index: u32,
        status: SmsStatus,
        phone: String,
        timestamp: NaiveDateTime,
        body: String,
        raw: String,
    ) -> Self {
        SmsRecord {
            index,
            status,
            phone,
            timestamp,
            body,
            raw,
        }
    }

    /// Storage slot of the message on the SIM.
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn status(&self) -> SmsStatus {
        self.status
    }

    /// Whether the message had not been read before this listing.
    pub fn is_new(&self) -> bool {
        self.status == SmsStatus::Unread
    }

    /// Sender number exactly as the modem reported it.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Service centre timestamp, truncated to the minute.
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for SmsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "New: {}\nFrom: {} - {}\n{}",
            self.is_new(),
            self.phone,
            self.timestamp,
            self.body
        )
    }
}
