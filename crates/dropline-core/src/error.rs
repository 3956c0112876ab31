//! Error types for Dropline.
//!
//! This module provides a unified error type for all Dropline operations,
//! with specific error variants for different failure modes.
//!
//! Protocol-level decisions ([`Error::TransferRejected`],
//! [`Error::TargetFileExists`]) are kept apart from transport failures so a
//! front end can render them differently. Every variant is terminal for the
//! task that produced it; nothing in this crate retries.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized `Result` type for Dropline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for Dropline.
#[derive(Error, Debug)]
pub enum Error {
    /// Presence payload could not be decoded (E001)
    #[error("malformed presence record: {0}")]
    MalformedRecord(String),

    /// Address is not a valid `host:port` pair
    #[error("invalid address '{0}': expected host:port")]
    InvalidAddress(String),

    /// Unable to broadcast on network (E002)
    #[error("unable to broadcast on network: {0}")]
    BroadcastUnavailable(#[source] io::Error),

    /// Unable to listen for presence broadcasts (E003)
    #[error("unable to listen for devices: {0}")]
    DiscoveryUnavailable(#[source] io::Error),

    /// Offer header missing, truncated or unusable (E004)
    #[error("invalid transfer header: {0}")]
    InvalidHeader(String),

    /// Destination file already exists (E005)
    #[error("file '{}' already exists", .0.display())]
    TargetFileExists(PathBuf),

    /// Transfer rejected by receiver (E006)
    #[error("transfer rejected by receiver")]
    TransferRejected,

    /// I/O failure during the handshake or the byte copy (E007)
    #[error("transfer failed: {0}")]
    TransferFailed(#[source] io::Error),

    /// Invalid path
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Configuration file error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns the error code associated with this error, if any.
    ///
    /// Error codes follow the pattern EXXX where XXX is a 3-digit number.
    #[must_use]
    pub const fn code(&self) -> Option<&'static str> {
        match self {
            Self::MalformedRecord(_) => Some("E001"),
            Self::BroadcastUnavailable(_) => Some("E002"),
            Self::DiscoveryUnavailable(_) => Some("E003"),
            Self::InvalidHeader(_) => Some("E004"),
            Self::TargetFileExists(_) => Some("E005"),
            Self::TransferRejected => Some("E006"),
            Self::TransferFailed(_) => Some("E007"),
            _ => None,
        }
    }

    /// Returns whether this error is a decision made by a peer or by the
    /// receiving side's policy rather than a transport failure.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::TransferRejected | Self::TargetFileExists(_))
    }

    /// Returns a helpful suggestion for resolving the error, if applicable.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::BroadcastUnavailable(_) => Some(
                "Check that a network interface is up and that UDP broadcast\n\
                 is not blocked by a firewall.",
            ),
            Self::DiscoveryUnavailable(_) => Some(
                "Another program may hold the discovery port. Try --port with\n\
                 a value both devices agree on.",
            ),
            Self::TargetFileExists(_) => Some(
                "Move or rename the existing file, or receive into another\n\
                 directory with --output.",
            ),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_are_not_transport_failures() {
        assert!(Error::TransferRejected.is_rejection());
        assert!(Error::TargetFileExists(PathBuf::from("a.txt")).is_rejection());
        assert!(!Error::TransferFailed(io::Error::other("reset")).is_rejection());
        assert!(!Error::InvalidHeader("eof".to_string()).is_rejection());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::MalformedRecord(String::new()).code(), Some("E001"));
        assert_eq!(Error::TransferRejected.code(), Some("E006"));
        assert_eq!(Error::ConfigError(String::new()).code(), None);
    }

    #[test]
    fn test_target_exists_display() {
        let err = Error::TargetFileExists(PathBuf::from("/tmp/report.txt"));
        assert_eq!(err.to_string(), "file '/tmp/report.txt' already exists");
    }
}
