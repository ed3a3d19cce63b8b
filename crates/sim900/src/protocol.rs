//! AT response grammar for the SIM900.
//!
//! Commands are ASCII lines terminated with `\r`. Replies are `\r\n`
//! separated lines: information lines that start with a `+XXXX:` token,
//! followed by a final `OK` or `ERROR`. The modem gives no framing beyond
//! that, so the session reads whatever arrived during a settle window and
//! the functions here scrape it.
//!
//! # Listing grammar
//!
//! `AT+CMGL="ALL"` produces one two-line entry per stored message:
//!
//! ```text
//! +CMGL: <index>,"<REC READ|REC UNREAD>","<phone>",,"<yy/MM/dd,hh:mm:ss+zz>"
//! <body>
//! ```
//!
//! The phone number is taken as the quoted field immediately after the
//! status marker. Numbers are not checked against any country-code pattern.

use bytes::{BufMut, BytesMut};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use sim900_core::error::{Error, Result};

use crate::sms::{SmsRecord, SmsStatus};

/// Command terminator.
pub const TERMINATOR: u8 = b'\r';

/// Ctrl-Z, ends the body of an outgoing SMS.
pub const CTRL_Z: u8 = 0x1A;

/// Final result code for a successful command.
pub const ACK: &str = "OK";

/// Token of the SIM inserted status report.
pub const SIM_STATUS_TOKEN: &str = "+CSMINS:";

/// Token of the service provider name report.
pub const PROVIDER_TOKEN: &str = "+CSPN:";

const TIMESTAMP_FORMAT: &str = "%y/%m/%d,%H:%M";

const REGEX_COMP_ERROR: &str = "listing grammar regex failed to compile";

static INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+CMGL:\s*(\d+)").expect(REGEX_COMP_ERROR));
static STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(REC READ|REC UNREAD)""#).expect(REGEX_COMP_ERROR));
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""REC (?:READ|UNREAD)","([^"]+)""#).expect(REGEX_COMP_ERROR));
static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d\d/\d\d/\d\d,\d\d:\d\d").expect(REGEX_COMP_ERROR));
static SIM_STATUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+CSMINS:\s*(\d+)\s*,\s*(\d+)").expect(REGEX_COMP_ERROR));
static PROVIDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\+CSPN:\s*"([^"]*)""#).expect(REGEX_COMP_ERROR));

/// Encode an AT command line into raw bytes ready for transmission.
///
/// # Example
///
/// ```
/// use sim900::protocol::encode_command;
///
/// assert_eq!(encode_command("AT+CSPN?"), b"AT+CSPN?\r");
/// ```
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(command.len() + 1);
    buf.put_slice(command.as_bytes());
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Decode a raw reply as UTF-8.
pub fn decode_text(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw)
        .map_err(|e| Error::Parse(format!("response is not valid UTF-8: {e}")))
}

/// Whether a raw reply is exactly the acknowledgment token.
///
/// Leading and trailing whitespace (the modem wraps result codes in
/// `\r\n`) is ignored; anything else in the reply fails the check.
pub fn is_ack(raw: &str) -> bool {
    raw.trim() == ACK
}

/// Find the first line of `raw` that starts with `token`.
///
/// Returns the whole line, token included, without its line ending.
/// Absence of the token is not an error: a modem that is still booting
/// answers queries with bare `ERROR` or nothing at all.
///
/// # Example
///
/// ```
/// use sim900::protocol::{parse_status_line, SIM_STATUS_TOKEN};
///
/// let raw = "\r\n+CSMINS: 0,1\r\n\r\nOK\r\n";
/// assert_eq!(parse_status_line(raw, SIM_STATUS_TOKEN).as_deref(), Some("+CSMINS: 0,1"));
/// assert_eq!(parse_status_line("\r\nERROR\r\n", SIM_STATUS_TOKEN), None);
/// ```
pub fn parse_status_line(raw: &str, token: &str) -> Option<String> {
    raw.split(&['\r', '\n'][..])
        .map(str::trim)
        .find(|line| line.starts_with(token))
        .map(str::to_string)
}

/// Split a `AT+CMGL="ALL"` reply into per-message fragments.
///
/// Every line that starts with `+CMGL: <index>` begins a fragment made of
/// that header line and the complete line after it (`"header\nbody"`).
/// The line after a header is always its body, whatever it contains, so a
/// message whose text looks like a header or a result code stays intact.
/// Carriage returns are removed. A header with no complete line after it,
/// because the reply was cut short, yields a one-line fragment that
/// [`decode_fragment`] rejects.
pub fn split_listing_fragments(raw: &str) -> Vec<String> {
    let text = raw.replace('\r', "");
    let segments: Vec<&str> = text.split('\n').collect();
    // The last segment has no line ending yet.
    let complete = segments.len() - 1;

    let mut fragments = Vec::new();
    let mut i = 0;
    while i < segments.len() {
        let header = segments[i];
        if !INDEX_RE.is_match(header) {
            i += 1;
            continue;
        }

        if i + 1 < complete {
            fragments.push(format!("{header}\n{}", segments[i + 1]));
            i += 2;
        } else {
            fragments.push(header.to_string());
            i += 1;
        }
    }
    fragments
}

/// Decode one listing fragment into an [`SmsRecord`].
///
/// Extracts, in order, the listing index, the read status, the sender,
/// the timestamp and the body. Every field is required; a fragment missing
/// any of them is rejected with [`Error::Parse`] rather than producing a
/// partial record.
///
/// # Example
///
/// ```
/// use sim900::protocol::decode_fragment;
///
/// let fragment = "+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32\"\nHello there";
/// let sms = decode_fragment(fragment).unwrap();
/// assert!(sms.is_new());
/// assert_eq!(sms.phone(), "+84912345678");
/// assert_eq!(sms.body(), "Hello there");
/// ```
pub fn decode_fragment(fragment: &str) -> Result<SmsRecord> {
    let (header, rest) = match fragment.split_once('\n') {
        Some((header, rest)) => (header.trim_end_matches('\r'), rest),
        None => (fragment.trim_end_matches('\r'), ""),
    };

    let index = INDEX_RE
        .captures(header)
        .and_then(|c| c[1].parse::<u32>().ok())
        .ok_or_else(|| Error::Parse(format!("no listing index in {header:?}")))?;

    let status: SmsStatus = STATUS_RE
        .captures(header)
        .ok_or_else(|| Error::Parse(format!("no read status in {header:?}")))?[1]
        .parse()?;

    let phone = PHONE_RE
        .captures(header)
        .map(|c| c[1].to_string())
        .ok_or_else(|| Error::Parse(format!("no phone number in {header:?}")))?;

    let stamp = TIMESTAMP_RE
        .find(header)
        .ok_or_else(|| Error::Parse(format!("no timestamp in {header:?}")))?;
    let timestamp = NaiveDateTime::parse_from_str(stamp.as_str(), TIMESTAMP_FORMAT)
        .map_err(|e| Error::Parse(format!("invalid timestamp {:?}: {e}", stamp.as_str())))?;

    if !fragment.contains('\n') {
        return Err(Error::Parse(format!("no message body after {header:?}")));
    }
    let line = rest.split('\n').next().unwrap_or("").trim_end_matches('\r');
    // Some firmware quotes the text line; the quotes are not part of the message.
    let body = line
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(line);

    Ok(SmsRecord::new(
        index,
        status,
        phone,
        timestamp,
        body.to_string(),
        fragment.to_string(),
    ))
}

/// Typed view of a `+CSMINS: <n>,<inserted>` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimStatus {
    /// Whether the modem pushes unsolicited `+CSMINS` reports (`<n>`).
    pub unsolicited_mode: u8,
    /// Whether a SIM card is inserted.
    pub inserted: bool,
}

impl SimStatus {
    /// Parse the line returned by [`Sim900::sim_status`](crate::Sim900::sim_status).
    pub fn parse(line: &str) -> Result<Self> {
        let caps = SIM_STATUS_RE
            .captures(line.trim())
            .ok_or_else(|| Error::Parse(format!("malformed SIM status {line:?}")))?;
        let unsolicited_mode = caps[1]
            .parse::<u8>()
            .map_err(|e| Error::Parse(format!("bad SIM status mode in {line:?}: {e}")))?;
        Ok(SimStatus {
            unsolicited_mode,
            inserted: &caps[2] == "1",
        })
    }
}

/// Extract the quoted operator name from a `+CSPN: "<name>",<mode>` line.
pub fn provider_from_line(line: &str) -> Option<String> {
    PROVIDER_RE
        .captures(line.trim())
        .map(|c| c[1].trim().to_string())
}
