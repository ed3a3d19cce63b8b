//! Settle-delay budgets for each session operation.
//!
//! The SIM900 has no usable flow control on its command interpreter: a
//! command is considered done once enough time has passed for the reply to
//! arrive. [`Timing`] names every one of those waits so they can be tuned
//! for a slow network or set to zero under test.

use std::time::Duration;

/// Expected reply length of `AT`, in bytes.
pub const PROBE_REPLY_BYTES: u32 = 6;

/// Expected reply length of `AT+CSMINS?` and `AT+CSPN?`, in bytes.
pub const QUERY_REPLY_BYTES: u32 = 20;

/// Per-operation wait budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Time the modem takes to emit one reply byte. Probe and query waits
    /// are scaled from this.
    pub per_byte: Duration,
    /// Settle delay after each init sequence command.
    pub init_step: Duration,
    /// Wait for the `> ` prompt after `AT+CMGS` before writing the body.
    pub send_prompt: Duration,
    /// Settle delay between factory reset attempts.
    pub reset_settle: Duration,
    /// Settle delay before reading a message listing.
    pub list_settle: Duration,
    /// Settle delay after deleting messages.
    pub delete_settle: Duration,
    /// How long a single read waits for more bytes before the line is
    /// considered drained.
    pub read_poll: Duration,
}

impl Timing {
    /// All-zero budgets. Intended for tests against a mock transport.
    pub const fn immediate() -> Self {
        Timing {
            per_byte: Duration::ZERO,
            init_step: Duration::ZERO,
            send_prompt: Duration::ZERO,
            reset_settle: Duration::ZERO,
            list_settle: Duration::ZERO,
            delete_settle: Duration::ZERO,
            read_poll: Duration::ZERO,
        }
    }

    /// Wait long enough for a reply of `expected_bytes` bytes.
    pub fn scaled(per_byte: Duration, expected_bytes: u32) -> Duration {
        per_byte.saturating_mul(expected_bytes)
    }

    /// Settle delay for the liveness probe.
    pub fn probe_wait(&self) -> Duration {
        Self::scaled(self.per_byte, PROBE_REPLY_BYTES)
    }

    /// Settle delay for the SIM status and provider queries.
    pub fn query_wait(&self) -> Duration {
        Self::scaled(self.per_byte, QUERY_REPLY_BYTES)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            per_byte: Duration::from_millis(40),
            init_step: Duration::from_millis(200),
            send_prompt: Duration::from_millis(500),
            reset_settle: Duration::from_millis(400),
            list_settle: Duration::from_secs(1),
            delete_settle: Duration::from_secs(1),
            read_poll: Duration::from_millis(50),
        }
    }
}
