//! Receiver side of the handshake.

use std::io;
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use socket2::SockRef;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};

use super::{read_line, sanitize_file_name, Line, ACCEPT_TOKEN, LINE_DELIMITER, REJECT_TOKEN};

/// Listener accepting inbound transfer offers.
#[derive(Debug)]
pub struct TransferListener {
    listener: TcpListener,
}

impl TransferListener {
    /// Bind a listener. Use port 0 for an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::debug!("Transfer listener bound to {}", listener.local_addr()?);
        Ok(Self { listener })
    }

    /// The bound address; this is what gets advertised in presence records.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept the next connection and read its offer.
    ///
    /// Waits indefinitely for a peer and for its header line.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if accepting fails
    /// - [`Error::InvalidHeader`] if the peer closes early or sends an
    ///   unusable header; the connection is closed
    /// - [`Error::TransferFailed`] if reading the header fails
    pub async fn next_offer(&self) -> Result<TransferOffer> {
        let (stream, peer) = self.listener.accept().await?;
        tracing::debug!("Connection from {}", peer);

        let mut reader = BufReader::new(stream);
        let header = match read_line(&mut reader).await.map_err(Error::TransferFailed)? {
            Line::Complete(header) => header,
            Line::Closed | Line::Truncated => {
                return Err(Error::InvalidHeader(
                    "connection closed before the header line ended".to_string(),
                ));
            }
            Line::TooLong => {
                return Err(Error::InvalidHeader(
                    "header line exceeds the maximum length".to_string(),
                ));
            }
        };

        let header = String::from_utf8(header)
            .map_err(|_| Error::InvalidHeader("header is not valid UTF-8".to_string()))?;
        let file_name = sanitize_file_name(&header).ok_or_else(|| {
            Error::InvalidHeader(format!("'{}' does not name a file", header.trim()))
        })?;

        tracing::debug!("{} offered '{}'", peer, file_name);
        Ok(TransferOffer {
            file_name,
            peer,
            reader,
        })
    }
}

/// A file a peer wants to send, waiting for a decision.
///
/// [`accept`](Self::accept) and [`reject`](Self::reject) consume the offer,
/// so exactly one answer is sent. Dropping an undecided offer closes the
/// connection without answering.
///
/// `accept` does not always put `accept` on the wire: if the peer has already
/// sent payload bytes before being answered, `accept` answers `reject` instead
/// and returns [`Error::InvalidHeader`]. Those bytes never reach the disk.
#[derive(Debug)]
pub struct TransferOffer {
    /// Proposed file name, already reduced to a basename
    file_name: String,
    /// Address of the sending peer
    peer: SocketAddr,
    /// Connection, positioned just after the header line
    reader: BufReader<TcpStream>,
}

/// A file written to disk after an accepted offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedFile {
    /// Where the file was written
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
    /// Peer that sent it
    pub peer: SocketAddr,
}

impl TransferOffer {
    /// Proposed file name (no directory components).
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Address of the sending peer.
    #[must_use]
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Accept the offer and store the payload as `dest_dir/<file name>`.
    ///
    /// The payload runs until the peer closes the connection. An existing
    /// file is never overwritten. If the copy fails midway the partial file
    /// is left in place.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidHeader`] if the peer sent payload bytes before the
    ///   offer was answered; the offer is rejected instead
    /// - [`Error::TargetFileExists`] if the destination already exists; the
    ///   existing file and the rest of the stream are left untouched
    /// - [`Error::TransferFailed`] on any I/O error while answering or copying
    pub async fn accept(self, dest_dir: &Path) -> Result<ReceivedFile> {
        if self.has_early_payload() {
            tracing::warn!(
                "{} sent data before the offer was answered, rejecting",
                self.peer
            );
            self.reject().await?;
            return Err(Error::InvalidHeader(
                "peer sent file data before the offer was answered".to_string(),
            ));
        }

        let Self {
            file_name,
            peer,
            mut reader,
        } = self;

        respond(&mut reader, ACCEPT_TOKEN).await?;

        let path = dest_dir.join(&file_name);
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!("Refusing to overwrite {}", path.display());
                return Err(Error::TargetFileExists(path));
            }
            Err(e) => return Err(Error::TransferFailed(e)),
        };

        let bytes = match tokio::io::copy_buf(&mut reader, &mut file).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Transfer of '{}' from {} failed: {}", file_name, peer, e);
                if let Err(flush) = file.flush().await {
                    tracing::debug!("Flushing partial {}: {}", path.display(), flush);
                }
                return Err(Error::TransferFailed(e));
            }
        };
        file.sync_all().await.map_err(Error::TransferFailed)?;
        drop(file);

        if let Err(e) = reader.get_mut().shutdown().await {
            tracing::debug!("Closing connection to {}: {}", peer, e);
        }

        tracing::info!("Received '{}' ({} bytes) from {}", file_name, bytes, peer);
        Ok(ReceivedFile { path, bytes, peer })
    }

    /// Decline the offer and close the connection. No file is created.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransferFailed`] if the answer cannot be written.
    pub async fn reject(self) -> Result<()> {
        let Self {
            file_name,
            peer,
            mut reader,
        } = self;

        respond(&mut reader, REJECT_TOKEN).await?;
        if let Err(e) = reader.get_mut().shutdown().await {
            tracing::debug!("Closing connection to {}: {}", peer, e);
        }

        tracing::info!("Rejected '{}' from {}", file_name, peer);
        Ok(())
    }

    /// Whether anything beyond the header has arrived already.
    ///
    /// Checks the read buffer, then peeks the socket without blocking.
    fn has_early_payload(&self) -> bool {
        if !self.reader.buffer().is_empty() {
            return true;
        }

        let mut probe = [MaybeUninit::<u8>::uninit(); 1];
        matches!(SockRef::from(self.reader.get_ref()).peek(&mut probe), Ok(n) if n > 0)
    }
}

/// Write a response token line and flush it.
async fn respond(reader: &mut BufReader<TcpStream>, token: &str) -> Result<()> {
    let stream = reader.get_mut();
    let mut line = Vec::with_capacity(token.len() + 1);
    line.extend_from_slice(token.as_bytes());
    line.push(LINE_DELIMITER);

    stream.write_all(&line).await.map_err(Error::TransferFailed)?;
    stream.flush().await.map_err(Error::TransferFailed)
}
