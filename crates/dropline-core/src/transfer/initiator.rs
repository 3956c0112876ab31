//! Sender side of the handshake.

use std::io;
use std::net::SocketAddr;
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::discovery::validate_address;
use crate::error::{Error, Result};

use super::{read_line, Line, ACCEPT_TOKEN, LINE_DELIMITER};

/// Sends one file to one device.
#[derive(Debug, Clone)]
pub struct TransferInitiator {
    /// Receiver's transfer endpoint (`host:port`)
    address: String,
}

/// Summary of a completed send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFile {
    /// Name offered to the receiver
    pub file_name: String,
    /// Bytes written to the connection
    pub bytes: u64,
    /// Resolved receiver address
    pub peer: SocketAddr,
}

impl TransferInitiator {
    /// Target the device at `address`, typically a [`DeviceFound`] address.
    ///
    /// [`DeviceFound`]: crate::discovery::DeviceFound
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if `address` is not `host:port`.
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        validate_address(&address)?;
        Ok(Self { address })
    }

    /// The receiver's address.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Offer `path` to the receiver and, if accepted, stream its contents.
    ///
    /// The file is opened before connecting, so a missing file never reaches
    /// the receiver. The header is flushed before waiting for the answer, and
    /// no file bytes are written until `accept` has been read. There is no timeout
    /// on the answer: a receiver that never decides stalls this call.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidPath`] if `path` has no usable file name
    /// - [`Error::TransferRejected`] if the receiver answered anything but `accept`
    /// - [`Error::TransferFailed`] if connecting, the exchange, opening or
    ///   reading the file, or the copy fails
    pub async fn send(&self, path: &Path) -> Result<SentFile> {
        let file_name = header_name(path)?;
        let mut file = File::open(path).await.map_err(Error::TransferFailed)?;

        let mut stream = TcpStream::connect(self.address.as_str())
            .await
            .map_err(Error::TransferFailed)?;
        let peer = stream.peer_addr().map_err(Error::TransferFailed)?;
        tracing::debug!("Connected to {} ({})", self.address, peer);

        let (read_half, mut write_half) = stream.split();

        let mut header = Vec::with_capacity(file_name.len() + 1);
        header.extend_from_slice(file_name.as_bytes());
        header.push(LINE_DELIMITER);
        write_half
            .write_all(&header)
            .await
            .map_err(Error::TransferFailed)?;
        write_half.flush().await.map_err(Error::TransferFailed)?;

        let mut reader = BufReader::new(read_half);
        let response = match read_line(&mut reader).await.map_err(Error::TransferFailed)? {
            Line::Complete(line) => line,
            Line::Closed | Line::Truncated | Line::TooLong => {
                return Err(Error::TransferFailed(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "receiver closed the connection without answering",
                )));
            }
        };

        if String::from_utf8_lossy(&response).trim() != ACCEPT_TOKEN {
            tracing::info!("{} rejected '{}'", self.address, file_name);
            return Err(Error::TransferRejected);
        }

        let bytes = tokio::io::copy(&mut file, &mut write_half)
            .await
            .map_err(Error::TransferFailed)?;
        write_half.shutdown().await.map_err(Error::TransferFailed)?;

        tracing::info!("Sent '{}' ({} bytes) to {}", file_name, bytes, peer);
        Ok(SentFile {
            file_name,
            bytes,
            peer,
        })
    }
}

/// Offer `path` to the device at `address`.
///
/// # Errors
///
/// See [`TransferInitiator::new`] and [`TransferInitiator::send`].
pub async fn send_file(address: &str, path: impl AsRef<Path>) -> Result<SentFile> {
    TransferInitiator::new(address)?.send(path.as_ref()).await
}

/// The name offered in the header: the final path component.
fn header_name(path: &Path) -> Result<String> {
    let invalid = || Error::InvalidPath(path.display().to_string());

    let name = path.file_name().ok_or_else(invalid)?;
    let name = name.to_str().ok_or_else(invalid)?;
    if name.contains(['\n', '\r']) || name.trim().is_empty() {
        return Err(invalid());
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_name_is_basename() {
        assert_eq!(
            header_name(Path::new("/home/me/docs/report.txt")).unwrap(),
            "report.txt"
        );
        assert_eq!(header_name(Path::new("report.txt")).unwrap(), "report.txt");
    }

    #[test]
    fn test_header_name_rejects_pathless() {
        assert!(matches!(
            header_name(Path::new("/")),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            header_name(Path::new("..")),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            header_name(Path::new("two\nlines.txt")),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_initiator_validates_address() {
        assert!(TransferInitiator::new("127.0.0.1:4000").is_ok());
        assert!(matches!(
            TransferInitiator::new("127.0.0.1"),
            Err(Error::InvalidAddress(_))
        ));
    }
}
