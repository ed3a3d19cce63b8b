//! Sim900 -- the AT command session for SIM900-class modems.
//!
//! This module ties the command builders ([`commands`]) and the response
//! grammar ([`protocol`]) to a [`Transport`]. Every operation is a series of
//! write, wait, read-whatever-arrived steps. The modem offers no
//! acknowledgment-based flow control on these commands, so the waits come
//! from the [`Timing`] table.
//!
//! A session owns its transport exclusively, and every operation takes
//! `&mut self`: only one command is ever in flight, and any bytes left over
//! from a previous command (or pushed unsolicited, such as `+CMTI`) are
//! discarded before the next command is written.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use sim900_core::error::{Error, Result};
use sim900_core::transport::Transport;

use crate::commands;
use crate::protocol::{self, PROVIDER_TOKEN, SIM_STATUS_TOKEN};
use crate::sms::SmsRecord;
use crate::timing::Timing;

/// Default number of `AT&F` repetitions for [`Sim900::factory_reset`].
pub const DEFAULT_FACTORY_RESET_ATTEMPTS: u32 = 5;

const READ_CHUNK: usize = 256;

/// An open AT command session with a SIM900 modem.
///
/// Constructed via [`Sim900::open`] or
/// [`Sim900Builder`](crate::builder::Sim900Builder). Release it with
/// [`close`](Sim900::close).
pub struct Sim900 {
    transport: Box<dyn Transport>,
    baud_rate: u32,
    timing: Timing,
    closed: bool,
}

impl Sim900 {
    /// Open a session over an already-open byte stream.
    ///
    /// Runs the init sequence and then checks that the modem answers `AT`
    /// with `OK`. The probe is sent after echo has been disabled, so a modem
    /// that powered up with echo on still passes.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if the transport is not open.
    /// - [`Error::NotResponding`] if the liveness probe fails.
    /// - Any transport error raised during the init sequence.
    pub async fn open(
        transport: Box<dyn Transport>,
        baud_rate: u32,
        timing: Timing,
    ) -> Result<Self> {
        Self::open_with(transport, baud_rate, timing, true).await
    }

    pub(crate) async fn open_with(
        transport: Box<dyn Transport>,
        baud_rate: u32,
        timing: Timing,
        verify_liveness: bool,
    ) -> Result<Self> {
        if !transport.is_connected() {
            return Err(Error::Connection("byte stream to the modem is not open".into()));
        }

        info!(baud_rate, "Connecting to SIM900");
        let mut modem = Sim900 {
            transport,
            baud_rate,
            timing,
            closed: false,
        };

        let startup = modem.startup(verify_liveness).await;

        if let Err(e) = startup {
            warn!(error = %e, "SIM900 startup failed, closing byte stream");
            if let Err(close_err) = modem.transport.close().await {
                debug!(error = %close_err, "Failed to close byte stream after startup failure");
            }
            modem.closed = true;
            return Err(e);
        }

        Ok(modem)
    }

    async fn startup(&mut self, verify_liveness: bool) -> Result<()> {
        self.init_sequence().await?;
        if verify_liveness && !self.probe().await? {
            return Err(Error::NotResponding);
        }
        Ok(())
    }

    /// Baud rate the byte stream was opened with. Informational only.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// The wait budgets this session uses.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn is_connected(&self) -> bool {
        !self.closed && self.transport.is_connected()
    }

    // -----------------------------------------------------------------
    // Byte-level helpers
    // -----------------------------------------------------------------

    async fn write(&mut self, cmd: &[u8]) -> Result<()> {
        trace!(command = ?String::from_utf8_lossy(cmd), "Writing AT command");
        self.transport.send(cmd).await
    }

    /// Read every byte that arrives before the line goes quiet for one
    /// `read_poll` window.
    async fn read_available(&mut self) -> Result<Vec<u8>> {
        let mut buf = [0u8; READ_CHUNK];
        let mut out = Vec::new();
        loop {
            match self.transport.receive(&mut buf, self.timing.read_poll).await {
                Ok(0) | Err(Error::Timeout) => break,
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) => return Err(e),
            }
        }
        trace!(bytes = out.len(), data = ?String::from_utf8_lossy(&out), "Read buffered reply");
        Ok(out)
    }

    /// Drop whatever is already buffered so the next reply starts clean.
    async fn discard_pending(&mut self) -> Result<()> {
        let stale = self.read_available().await?;
        if !stale.is_empty() {
            debug!(
                bytes = stale.len(),
                data = ?String::from_utf8_lossy(&stale),
                "Discarding stale modem output"
            );
        }
        Ok(())
    }

    /// Write `cmd`, wait `wait`, and return what the modem sent back.
    async fn exchange(&mut self, cmd: &[u8], wait: Duration) -> Result<Vec<u8>> {
        self.discard_pending().await?;
        self.write(cmd).await?;
        tokio::time::sleep(wait).await;
        self.read_available().await
    }

    // -----------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------

    async fn init_sequence(&mut self) -> Result<()> {
        info!("Initializing SIM900");
        for build in commands::INIT_SEQUENCE {
            let cmd = build();
            self.write(&cmd).await?;
            tokio::time::sleep(self.timing.init_step).await;
            let reply = self.read_available().await?;
            let command = String::from_utf8_lossy(&cmd);
            let reply = String::from_utf8_lossy(&reply);
            debug!(command = ?command.trim_end(), reply = ?reply.trim(), "Init step done");
        }
        self.transport.flush().await?;
        info!("SIM900 initialized");
        Ok(())
    }

    /// Re-apply the init sequence.
    ///
    /// Safe to call at any time; use it after anything that may have left
    /// the modem and the session out of step.
    pub async fn reinitialize(&mut self) -> Result<()> {
        self.init_sequence().await
    }

    // -----------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------

    /// Send `AT` and check that the modem answers exactly `OK`.
    pub async fn probe(&mut self) -> Result<bool> {
        let wait = self.timing.probe_wait();
        let reply = self.exchange(&commands::cmd_probe(), wait).await?;
        let alive = protocol::is_ack(&String::from_utf8_lossy(&reply));
        debug!(alive, "Liveness probe");
        Ok(alive)
    }

    /// Restore factory defaults by sending `AT&F` `attempts` times.
    ///
    /// The modem gives no reliable acknowledgment for this command, so it is
    /// repeated unconditionally with a settle delay after each attempt.
    /// Settings changed by the init sequence are lost; call
    /// [`reinitialize`](Self::reinitialize) afterwards to restore them.
    pub async fn factory_reset(&mut self, attempts: u32) -> Result<()> {
        if attempts == 0 {
            return Err(Error::InvalidParameter(
                "factory reset needs at least one attempt".into(),
            ));
        }

        info!(attempts, "Factory resetting SIM900");
        self.discard_pending().await?;
        let cmd = commands::cmd_factory_reset();
        for attempt in 1..=attempts {
            debug!(attempt, "AT&F");
            self.write(&cmd).await?;
            tokio::time::sleep(self.timing.reset_settle).await;
            self.transport.flush().await?;
        }
        self.discard_pending().await
    }

    /// Reload the stored profile with `ATZ`, then re-run the init sequence.
    pub async fn reset_defaults(&mut self) -> Result<()> {
        info!("Resetting SIM900 to stored profile");
        self.discard_pending().await?;
        self.write(&commands::cmd_reset_defaults()).await?;
        tokio::time::sleep(self.timing.reset_settle).await;
        self.transport.flush().await?;
        self.discard_pending().await?;
        self.init_sequence().await
    }

    /// Query SIM insertion status.
    ///
    /// Returns the `+CSMINS:` line, or `None` if the modem did not report
    /// one (it may still be booting). See
    /// [`SimStatus::parse`](crate::protocol::SimStatus::parse) for a typed view.
    pub async fn sim_status(&mut self) -> Result<Option<String>> {
        self.query(&commands::cmd_sim_inserted_status(), SIM_STATUS_TOKEN)
            .await
    }

    /// Query the service provider name.
    ///
    /// Returns the `+CSPN:` line, or `None` if the modem did not report one.
    pub async fn provider_name(&mut self) -> Result<Option<String>> {
        self.query(&commands::cmd_provider_name(), PROVIDER_TOKEN)
            .await
    }

    async fn query(&mut self, cmd: &[u8], token: &str) -> Result<Option<String>> {
        let wait = self.timing.query_wait();
        let reply = self.exchange(cmd, wait).await?;
        let line = protocol::parse_status_line(&String::from_utf8_lossy(&reply), token);
        match &line {
            Some(line) => info!(%line, "Modem report"),
            None => debug!(token, "Modem report missing from reply"),
        }
        Ok(line)
    }

    /// Send a text message.
    ///
    /// Writes `AT+CMGS`, waits for the `> ` prompt window, then writes the
    /// body terminated by Ctrl-Z and flushes. Delivery is not confirmed;
    /// the modem's `+CMGS` report is discarded with the next command.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidParameter`] if `phone` is empty or contains a quote,
    /// line break or Ctrl-Z, or if `body` contains Ctrl-Z. Nothing is
    /// written in that case.
    pub async fn send_message(&mut self, phone: &str, body: &str) -> Result<()> {
        validate_phone(phone)?;
        if body.as_bytes().contains(&protocol::CTRL_Z) {
            return Err(Error::InvalidParameter(
                "message body must not contain Ctrl-Z".into(),
            ));
        }

        info!(phone, body, "Sending SMS");
        self.discard_pending().await?;
        self.write(&commands::cmd_send_message(phone)).await?;
        tokio::time::sleep(self.timing.send_prompt).await;

        let prompt = self.read_available().await?;
        if !prompt.contains(&b'>') {
            warn!(
                reply = ?String::from_utf8_lossy(&prompt),
                "No message prompt from modem, sending body anyway"
            );
        }

        self.write(&commands::cmd_message_body(body)).await?;
        self.transport.flush().await?;
        info!(phone, "SMS handed to modem");
        Ok(())
    }

    /// List every stored message.
    ///
    /// If the reply cannot be read or any entry fails to decode, the session
    /// logs the failure, re-runs the init sequence once and returns an empty
    /// list. An empty list therefore means either "no messages" or "modem
    /// was resynchronized, try again". No partial list is ever returned.
    ///
    /// # Errors
    ///
    /// Only if the recovery init sequence itself fails.
    pub async fn list_messages(&mut self) -> Result<Vec<SmsRecord>> {
        match self.read_listing().await {
            Ok(messages) => {
                info!(count = messages.len(), "Listed messages");
                Ok(messages)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    transport = e.is_transport(),
                    "Message listing failed, reinitializing modem"
                );
                self.reinitialize().await?;
                Ok(Vec::new())
            }
        }
    }

    async fn read_listing(&mut self) -> Result<Vec<SmsRecord>> {
        let wait = self.timing.list_settle;
        let raw = self.exchange(&commands::cmd_list_all(), wait).await?;
        if raw.is_empty() {
            // Even an empty store answers OK; silence means we are out of step.
            return Err(Error::Timeout);
        }

        let text = protocol::decode_text(&raw)?;
        protocol::split_listing_fragments(text)
            .iter()
            .map(|fragment| protocol::decode_fragment(fragment))
            .collect()
    }

    /// Delete every message that has already been read.
    pub async fn delete_read_messages(&mut self) -> Result<()> {
        info!("Deleting read messages");
        self.discard_pending().await?;
        self.write(&commands::cmd_delete_read()).await?;
        tokio::time::sleep(self.timing.delete_settle).await;
        self.transport.flush().await?;
        self.discard_pending().await
    }

    /// Close the session and release the byte stream.
    pub async fn close(mut self) -> Result<()> {
        info!("Closing SIM900 session");
        self.closed = true;
        self.transport.close().await
    }
}

impl Drop for Sim900 {
    fn drop(&mut self) {
        if !self.closed {
            debug!("Sim900 dropped without close(), releasing byte stream");
        }
    }
}

fn validate_phone(phone: &str) -> Result<()> {
    if phone.trim().is_empty() {
        return Err(Error::InvalidParameter("phone number is empty".into()));
    }
    if phone
        .chars()
        .any(|c| matches!(c, '"' | '\r' | '\n' | '\u{1a}'))
    {
        return Err(Error::InvalidParameter(format!(
            "phone number {phone:?} contains a reserved character"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim900_test_harness::MockTransport;

    const OK: &[u8] = b"\r\nOK\r\n";

    fn expect_init(mock: &MockTransport) {
        for build in commands::INIT_SEQUENCE {
            mock.expect(&build(), OK);
        }
    }

    /// Open a session over `mock` with the init sequence and probe scripted.
    async fn open_session(mock: &MockTransport) -> Sim900 {
        expect_init(mock);
        mock.expect(&commands::cmd_probe(), OK);
        Sim900::open(Box::new(mock.clone()), 115_200, Timing::immediate())
            .await
            .unwrap()
    }

    fn init_commands() -> Vec<Vec<u8>> {
        commands::INIT_SEQUENCE.iter().map(|f| f()).collect()
    }

    // -----------------------------------------------------------------
    // open / init
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn open_runs_init_then_probe() {
        let mock = MockTransport::new();
        let modem = open_session(&mock).await;

        let mut expected = init_commands();
        expected.push(b"AT\r".to_vec());
        assert_eq!(mock.sent_data(), expected);
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.flush_count(), 1);
        assert_eq!(modem.baud_rate(), 115_200);
        assert!(modem.is_connected());
    }

    #[tokio::test]
    async fn open_closed_stream_is_connection_error() {
        let mock = MockTransport::new();
        mock.set_connected(false);
        let result = Sim900::open(Box::new(mock.clone()), 115_200, Timing::immediate()).await;
        assert!(matches!(result, Err(Error::Connection(_))));
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn open_fails_when_probe_not_acknowledged() {
        let mock = MockTransport::new();
        expect_init(&mock);
        mock.expect(&commands::cmd_probe(), b"\r\nERROR\r\n");

        let result = Sim900::open(Box::new(mock.clone()), 115_200, Timing::immediate()).await;
        assert!(matches!(result, Err(Error::NotResponding)));
        assert!(!mock.is_connected());
    }

    #[tokio::test]
    async fn open_without_liveness_check_skips_probe() {
        let mock = MockTransport::new();
        expect_init(&mock);
        let _modem = Sim900::open_with(Box::new(mock.clone()), 9600, Timing::immediate(), false)
            .await
            .unwrap();
        assert_eq!(mock.sent_data(), init_commands());
    }

    #[tokio::test]
    async fn reinitialize_repeats_same_five_commands() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;

        expect_init(&mock);
        modem.reinitialize().await.unwrap();
        expect_init(&mock);
        modem.reinitialize().await.unwrap();

        let sent = mock.sent_data();
        assert_eq!(sent.len(), 5 + 1 + 5 + 5);
        assert_eq!(sent[6..11].to_vec(), init_commands());
        assert_eq!(sent[11..16].to_vec(), init_commands());
    }

    // -----------------------------------------------------------------
    // probe
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn probe_true_on_bare_ok() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(&commands::cmd_probe(), b"OK");
        assert!(modem.probe().await.unwrap());
    }

    #[tokio::test]
    async fn probe_false_on_extra_content() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;

        mock.expect(&commands::cmd_probe(), b"AT\r\r\nOK\r\n");
        assert!(!modem.probe().await.unwrap());

        mock.expect_silent(&commands::cmd_probe());
        assert!(!modem.probe().await.unwrap());
    }

    #[tokio::test]
    async fn probe_ignores_stale_unsolicited_output() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.queue_unsolicited(b"\r\n+CMTI: \"SM\",2\r\n");
        mock.expect(&commands::cmd_probe(), OK);
        assert!(modem.probe().await.unwrap());
    }

    // -----------------------------------------------------------------
    // queries
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn sim_status_returns_report_line() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_sim_inserted_status(),
            b"\r\n+CSMINS: 0,1\r\n\r\nOK\r\n",
        );
        assert_eq!(
            modem.sim_status().await.unwrap().as_deref(),
            Some("+CSMINS: 0,1")
        );
    }

    #[tokio::test]
    async fn sim_status_absent_is_none() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(&commands::cmd_sim_inserted_status(), b"\r\nERROR\r\n");
        assert_eq!(modem.sim_status().await.unwrap(), None);
    }

    #[tokio::test]
    async fn provider_name_returns_report_line() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_provider_name(),
            b"\r\n+CSPN: \"Viettel\",0\r\n\r\nOK\r\n",
        );
        assert_eq!(
            modem.provider_name().await.unwrap().as_deref(),
            Some("+CSPN: \"Viettel\",0")
        );

        mock.expect_silent(&commands::cmd_provider_name());
        assert_eq!(modem.provider_name().await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_transport_error_propagates() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect_receive_error(&commands::cmd_provider_name(), "overrun");
        assert!(matches!(
            modem.provider_name().await,
            Err(Error::Transport(_))
        ));
    }

    // -----------------------------------------------------------------
    // send / delete / reset
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn send_message_writes_command_then_body() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        let flushes = mock.flush_count();

        mock.expect(b"AT+CMGS=\"0901484041\"\r", b"\r\n> ");
        mock.expect(b"bonjour mon ami\x1a", b"\r\n+CMGS: 12\r\n\r\nOK\r\n");
        modem
            .send_message("0901484041", "bonjour mon ami")
            .await
            .unwrap();

        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.flush_count(), flushes + 1);
    }

    #[tokio::test]
    async fn send_message_without_prompt_still_sends_body() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect_silent(b"AT+CMGS=\"+84912345678\"\r");
        mock.expect_silent(b"hi\x1a");
        modem.send_message("+84912345678", "hi").await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn send_message_rejects_bad_input_before_writing() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        let sent = mock.sent_data().len();

        for (phone, body) in [
            ("", "x"),
            ("  ", "x"),
            ("09\"01", "x"),
            ("0901\r", "x"),
            ("0901484041", "bad\u{1a}body"),
        ] {
            let result = modem.send_message(phone, body).await;
            assert!(matches!(result, Err(Error::InvalidParameter(_))), "{phone:?}");
        }
        assert_eq!(mock.sent_data().len(), sent);
    }

    #[tokio::test]
    async fn delete_read_messages_sends_and_flushes() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        let flushes = mock.flush_count();
        mock.expect(&commands::cmd_delete_read(), OK);
        modem.delete_read_messages().await.unwrap();
        assert_eq!(mock.flush_count(), flushes + 1);
        assert_eq!(mock.unread_len(), 0);
    }

    #[tokio::test]
    async fn factory_reset_repeats_command() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        let sent_before = mock.sent_data().len();
        let flushes = mock.flush_count();

        for _ in 0..DEFAULT_FACTORY_RESET_ATTEMPTS {
            mock.expect(&commands::cmd_factory_reset(), OK);
        }
        modem
            .factory_reset(DEFAULT_FACTORY_RESET_ATTEMPTS)
            .await
            .unwrap();

        let sent = mock.sent_data();
        assert_eq!(sent.len() - sent_before, 5);
        assert!(sent[sent_before..].iter().all(|c| c == b"AT&F\r"));
        assert_eq!(mock.flush_count(), flushes + 5);
        assert_eq!(mock.unread_len(), 0);
    }

    #[tokio::test]
    async fn factory_reset_zero_attempts_rejected() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        assert!(matches!(
            modem.factory_reset(0).await,
            Err(Error::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn reset_defaults_sends_atz_then_init() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(&commands::cmd_reset_defaults(), OK);
        expect_init(&mock);
        modem.reset_defaults().await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    // -----------------------------------------------------------------
    // list
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn list_messages_decodes_entries() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_list_all(),
            b"\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32:05+28\"\r\n\
              Hello there\r\n\
              +CMGL: 2,\"REC READ\",\"0901484041\",,\"23/05/11,08:00:00+28\"\r\n\
              bonjour mon ami\r\n\r\nOK\r\n",
        );

        let messages = modem.list_messages().await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].is_new());
        assert_eq!(messages[0].body(), "Hello there");
        assert!(!messages[1].is_new());
        assert_eq!(messages[1].phone(), "0901484041");
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn list_messages_keeps_bodies_that_look_like_protocol_text() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_list_all(),
            b"\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32:05+28\"\r\n\
              +CMGL: hi\r\n\
              +CMGL: 2,\"REC READ\",\"0901484041\",,\"23/05/11,08:00:00+28\"\r\n\
              OK\r\n\
              +CMGL: 3,\"REC READ\",\"0901484041\",,\"23/05/11,08:01:00+28\"\r\n\
              +CMTI: \"SM\",4\r\n\r\nOK\r\n",
        );
        let sent = mock.sent_data().len();

        let messages = modem.list_messages().await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].body(), "+CMGL: hi");
        assert_eq!(messages[1].body(), "OK");
        assert_eq!(messages[2].body(), "+CMTI: \"SM\",4");
        // No resync.
        assert_eq!(mock.sent_data().len(), sent + 1);
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn list_messages_empty_store_does_not_reinitialize() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(&commands::cmd_list_all(), OK);
        let sent = mock.sent_data().len();

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.sent_data().len(), sent + 1);
    }

    #[tokio::test]
    async fn list_messages_silent_modem_reinitializes_once() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect_silent(&commands::cmd_list_all());
        expect_init(&mock);

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.remaining_expectations(), 0);
        let sent = mock.sent_data();
        assert_eq!(sent[sent.len() - 5..].to_vec(), init_commands());
    }

    #[tokio::test]
    async fn list_messages_transport_error_reinitializes_once() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect_receive_error(&commands::cmd_list_all(), "framing error");
        expect_init(&mock);

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.sent_data().len(), 5 + 1 + 1 + 5);
    }

    #[tokio::test]
    async fn list_messages_malformed_entry_returns_nothing() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_list_all(),
            b"\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32\"\r\n\
              good\r\n\
              +CMGL: 2,\"REC READ\",,,\"23/05/11,08:00\"\r\n\
              no sender\r\n\r\nOK\r\n",
        );
        expect_init(&mock);

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn list_messages_truncated_reply_reinitializes() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(
            &commands::cmd_list_all(),
            b"\r\n+CMGL: 1,\"REC UNREAD\",\"+84912345678\",,\"23/05/10,14:32\"\r\n",
        );
        expect_init(&mock);

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn list_messages_invalid_utf8_reinitializes() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect(&commands::cmd_list_all(), &[0xFF, 0xFE, b'\r', b'\n']);
        expect_init(&mock);

        assert!(modem.list_messages().await.unwrap().is_empty());
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn list_messages_failed_recovery_is_reported() {
        let mock = MockTransport::new();
        let mut modem = open_session(&mock).await;
        mock.expect_receive_error(&commands::cmd_list_all(), "framing error");
        // No init expectations: the recovery write is rejected.
        assert!(modem.list_messages().await.is_err());
    }

    // -----------------------------------------------------------------
    // close
    // -----------------------------------------------------------------

    #[tokio::test]
    async fn close_releases_stream() {
        let mock = MockTransport::new();
        let modem = open_session(&mock).await;
        modem.close().await.unwrap();
        assert!(!mock.is_connected());
    }
}
