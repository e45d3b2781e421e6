/*!
Error handling for the E2EE messaging core.
*/

use std::io;
use thiserror::Error;

/// Result type for the E2EE core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the E2EE core
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Identity file missing, unreadable, or malformed
    #[error("Identity error: {0}")]
    Identity(String),

    /// GCM tag failure on the private-key blob: wrong password or a
    /// tampered file, deliberately indistinguishable
    #[error("Identity authentication failed")]
    IdentityAuth,

    /// A wire record failed to deserialize
    #[error("Malformed message: {0}")]
    Parse(String),

    /// A handshake signature did not verify
    #[error("Signature verification failed")]
    SignatureVerify,

    /// A cryptographic primitive failed
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// A frame could not be sent or received
    #[error("Transport error: {0}")]
    Transport(String),

    /// A protocol precondition was violated
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The peer's fingerprint differs from the stored pin
    #[error("Peer fingerprint changed: pinned {pinned}, observed {observed}")]
    PinMismatch {
        /// Fingerprint recorded on first contact
        pinned: String,
        /// Fingerprint the peer presented now
        observed: String,
    },

    /// Unsupported identity-file version
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(u32),
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Self {
        Error::Parse(err.to_string())
    }
}

/// Convert a string to an Error::Identity
pub fn identity_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Identity(msg.into()))
}

/// Convert a string to an Error::Parse
pub fn parse_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Parse(msg.into()))
}

/// Convert a string to an Error::Crypto
pub fn crypto_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Crypto(msg.into()))
}

/// Convert a string to an Error::Transport
pub fn transport_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Transport(msg.into()))
}

/// Convert a string to an Error::Protocol
pub fn protocol_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Protocol(msg.into()))
}
