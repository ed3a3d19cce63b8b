//! Error types for the SIM900 driver.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Session construction, response
//! parsing, and byte-stream failures are all captured here.

/// The error type for all SIM900 operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The byte stream was not open or usable when the session was created.
    #[error("connection error: {0}")]
    Connection(String),

    /// The modem did not acknowledge the `AT` liveness probe.
    ///
    /// Usually the device is powered off, still booting, or the baud rate
    /// does not match.
    #[error("modem did not acknowledge liveness probe")]
    NotResponding,

    /// A required field was missing from a modem response.
    #[error("parse error: {0}")]
    Parse(String),

    /// A read or write on the byte stream failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// Nothing arrived from the modem within the receive window.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed to a session operation.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The byte stream has been closed.
    #[error("not connected")]
    NotConnected,

    /// The connection to the modem was lost unexpectedly.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error came from the byte stream rather than from the
    /// content of a response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Timeout
                | Error::NotConnected
                | Error::ConnectionLost
                | Error::Io(_)
        )
    }
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;
