//! Network discovery for Dropline.
//!
//! A receiver announces itself with a [`PresenceBroadcaster`]; a sender runs a
//! [`DeviceDiscovery`] session to learn which receivers are around.
//!
//! ## Protocol
//!
//! - Port: 5050 (UDP), configurable
//! - Broadcast interval: every second while receiving
//! - Payload: one JSON-encoded [`PresenceRecord`] per datagram
//!
//! Anything on the port that does not decode into a presence record is
//! dropped without ending the session; broadcast domains carry plenty of
//! unrelated traffic.

mod broadcaster;
mod presence;
mod registry;

pub use broadcaster::PresenceBroadcaster;
pub use presence::{validate_address, PresenceRecord, MAX_DATAGRAM_SIZE};
pub use registry::{DeviceFound, DeviceRegistry};

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::io;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::error::{Error, Result};

pub use crate::DEFAULT_DISCOVERY_PORT;

/// Open a non-blocking UDP socket with address reuse, optionally broadcast-capable.
pub(crate) fn bind_udp(addr: SocketAddrV4, broadcast: bool) -> io::Result<UdpSocket> {
    let socket = socket2::Socket::new(
        socket2::Domain::IPV4,
        socket2::Type::DGRAM,
        Some(socket2::Protocol::UDP),
    )?;

    if broadcast {
        socket.set_broadcast(true)?;
    }
    socket.set_reuse_address(true)?;

    #[cfg(target_os = "macos")]
    socket.set_reuse_port(true)?;

    socket.bind(&addr.into())?;

    socket.set_nonblocking(true)?;

    let std_socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(std_socket)
}

/// Whether a receive error concerns one oversized datagram rather than the
/// socket. Windows reports `WSAEMSGSIZE` instead of truncating.
fn is_oversized_datagram(e: &io::Error) -> bool {
    const WSAEMSGSIZE: i32 = 10040;
    cfg!(windows) && e.raw_os_error() == Some(WSAEMSGSIZE)
}

/// One discovery session: a listening socket plus the devices it has seen.
///
/// Each session starts with an empty [`DeviceRegistry`]; two sessions never
/// share one.
#[derive(Debug)]
pub struct DeviceDiscovery {
    /// UDP socket receiving presence broadcasts
    socket: UdpSocket,
    /// Devices seen so far in this session
    registry: DeviceRegistry,
}

impl DeviceDiscovery {
    /// Start a session listening on `port` on all interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryUnavailable`] if the port cannot be bound.
    pub async fn new(port: u16) -> Result<Self> {
        Self::bind(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port)).await
    }

    /// Start a session listening on a specific address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryUnavailable`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddrV4) -> Result<Self> {
        let socket = bind_udp(addr, false).map_err(Error::DiscoveryUnavailable)?;
        tracing::debug!("Listening for devices on {}", addr);

        Ok(Self {
            socket,
            registry: DeviceRegistry::new(),
        })
    }

    /// Address the session is listening on.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Wait for the next device not yet seen in this session.
    ///
    /// Datagrams that fail to decode, and records whose address is already
    /// registered, are skipped and the wait continues. Dropping the returned
    /// future loses nothing: a record is registered only when it is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryUnavailable`] if receiving from the socket fails.
    pub async fn discover_once(&mut self) -> Result<DeviceFound> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];

        loop {
            let (len, source) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) if is_oversized_datagram(&e) => {
                    tracing::trace!(
                        "Ignoring datagram larger than {} bytes",
                        MAX_DATAGRAM_SIZE
                    );
                    continue;
                }
                Err(e) => return Err(Error::DiscoveryUnavailable(e)),
            };

            let record = match PresenceRecord::decode(&buf[..len]) {
                Ok(record) => record,
                Err(e) => {
                    tracing::trace!("Ignoring datagram from {}: {}", source, e);
                    continue;
                }
            };

            let found = DeviceFound::from(&record);
            if !self.registry.insert(record) {
                continue;
            }

            tracing::debug!(
                "Found device {} at {} (via {})",
                found.name,
                found.address,
                source
            );
            return Ok(found);
        }
    }

    /// Collect every new device heard within `window`.
    ///
    /// A window too large to represent as a deadline never closes; the
    /// scan then only ends on a receive error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DiscoveryUnavailable`] if receiving fails before the
    /// window closes.
    pub async fn scan(&mut self, window: Duration) -> Result<Vec<DeviceFound>> {
        let deadline = Instant::now().checked_add(window);
        let mut found = Vec::new();

        loop {
            let device = match deadline {
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    match tokio::time::timeout_at(deadline, self.discover_once()).await {
                        Ok(device) => device?,
                        Err(_) => break,
                    }
                }
                None => self.discover_once().await?,
            };
            found.push(device);
        }

        Ok(found)
    }

    /// Devices seen so far, in first-seen order.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }
}
