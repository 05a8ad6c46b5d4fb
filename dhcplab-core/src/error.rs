//! Error types for dhcplab

use crate::types::AttackKind;
use thiserror::Error;

/// Result type alias for dhcplab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dhcplab
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attack name that does not map to any attack kind
    #[error("Unknown attack type: {0}")]
    UnknownAttack(String),

    /// Attack kind already has a live run
    #[error("Attack {0} is already running")]
    AlreadyRunning(AttackKind),

    /// Attack kind has no registered run
    #[error("Attack {0} is not running")]
    NotRunning(AttackKind),

    /// Invalid attack option
    #[error("Invalid option '{name}': {reason}")]
    InvalidOption { name: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Send/receive failure on an interface
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed address or field supplied to the codec
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Insufficient privileges
    #[error("Insufficient privileges: {0}")]
    InsufficientPrivileges(String),
}

impl Error {
    /// Create a transport error with a custom message
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Error::Transport(msg.into())
    }

    /// Create an encoding error with a custom message
    pub fn encoding<S: Into<String>>(msg: S) -> Self {
        Error::Encoding(msg.into())
    }

    /// Create an invalid option error
    pub fn invalid_option<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidOption {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Errors the caller of `start`/`stop` caused and can correct
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::UnknownAttack(_)
                | Error::AlreadyRunning(_)
                | Error::NotRunning(_)
                | Error::InvalidOption { .. }
                | Error::Encoding(_)
        )
    }

    /// Errors raised at the interface while sending or receiving
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::InterfaceNotFound(_)
                | Error::Transport(_)
                | Error::InsufficientPrivileges(_)
        )
    }
}
