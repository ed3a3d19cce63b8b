//! SIM900 AT command builders.
//!
//! Each function returns the exact bytes to write for one entry of the AT
//! command vocabulary, terminated with a carriage return. All functions are
//! pure; the session in [`crate::modem`] sends them and scrapes the replies.

use crate::protocol::{encode_command, CTRL_Z};
use bytes::{BufMut, BytesMut};

/// Bare attention command used as a liveness probe (`AT`).
pub fn cmd_probe() -> Vec<u8> {
    encode_command("AT")
}

/// Disable command echo (`ATE0`).
pub fn cmd_echo_off() -> Vec<u8> {
    encode_command("ATE0")
}

/// Restore the stored user profile (`ATZ`).
pub fn cmd_reset_defaults() -> Vec<u8> {
    encode_command("ATZ")
}

/// Restore factory defaults (`AT&F`).
pub fn cmd_factory_reset() -> Vec<u8> {
    encode_command("AT&F")
}

/// Select text-mode SMS instead of PDU mode (`AT+CMGF=1`).
pub fn cmd_text_mode() -> Vec<u8> {
    encode_command("AT+CMGF=1")
}

/// Report new messages with an unsolicited `+CMTI` line (`AT+CNMI=1,1,0,0,0`).
pub fn cmd_new_message_indication() -> Vec<u8> {
    encode_command("AT+CNMI=1,1,0,0,0")
}

/// Use the SIM card for the read, write and receive message stores.
pub fn cmd_sms_storage() -> Vec<u8> {
    encode_command(r#"AT+CPMS="SM","SM","SM""#)
}

/// Persist SMS settings to non-volatile memory (`AT+CSAS`).
pub fn cmd_save_settings() -> Vec<u8> {
    encode_command("AT+CSAS")
}

/// Query whether a SIM card is inserted (`AT+CSMINS?`).
pub fn cmd_sim_inserted_status() -> Vec<u8> {
    encode_command("AT+CSMINS?")
}

/// Query the service provider name stored on the SIM (`AT+CSPN?`).
pub fn cmd_provider_name() -> Vec<u8> {
    encode_command("AT+CSPN?")
}

/// Begin an SMS to `phone` (`AT+CMGS="<phone>"`).
///
/// The modem answers with a `> ` prompt and then expects the body, see
/// [`cmd_message_body`].
pub fn cmd_send_message(phone: &str) -> Vec<u8> {
    encode_command(&format!("AT+CMGS=\"{phone}\""))
}

/// Message text followed by Ctrl-Z, which tells the modem to submit it.
pub fn cmd_message_body(body: &str) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(body.len() + 1);
    buf.put_slice(body.as_bytes());
    buf.put_u8(CTRL_Z);
    buf.to_vec()
}

/// List every stored message regardless of status (`AT+CMGL="ALL"`).
pub fn cmd_list_all() -> Vec<u8> {
    encode_command(r#"AT+CMGL="ALL""#)
}

/// Delete every message already read (`AT+CMGDA="DEL READ"`).
pub fn cmd_delete_read() -> Vec<u8> {
    encode_command(r#"AT+CMGDA="DEL READ""#)
}

/// Builders for the init sequence, in the order they must be issued.
pub const INIT_SEQUENCE: [fn() -> Vec<u8>; 5] = [
    cmd_echo_off,
    cmd_text_mode,
    cmd_new_message_indication,
    cmd_sms_storage,
    cmd_save_settings,
];
