//! Periodic presence announcements.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

use super::{bind_udp, PresenceRecord};
use crate::DEFAULT_BROADCAST_INTERVAL;

/// Broadcaster announcing this device's presence record.
///
/// Each tick encodes the record and sends it as one datagram to the target,
/// which is the limited broadcast address on the discovery port unless set
/// otherwise.
#[derive(Debug)]
pub struct PresenceBroadcaster {
    /// UDP socket for broadcasting
    socket: UdpSocket,
    /// Where each announcement is sent
    target: SocketAddr,
    /// Pause between announcements
    interval: Duration,
}

impl PresenceBroadcaster {
    /// Create a broadcaster for the given discovery port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BroadcastUnavailable`] if a broadcast-capable socket
    /// cannot be opened.
    pub async fn new(port: u16) -> Result<Self> {
        Self::with_target(SocketAddrV4::new(Ipv4Addr::BROADCAST, port).into()).await
    }

    /// Create a broadcaster sending to an explicit target address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BroadcastUnavailable`] if the socket cannot be opened.
    pub async fn with_target(target: SocketAddr) -> Result<Self> {
        let socket = bind_udp(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0), true)
            .map_err(Error::BroadcastUnavailable)?;

        Ok(Self {
            socket,
            target,
            interval: DEFAULT_BROADCAST_INTERVAL,
        })
    }

    /// Set the pause between announcements.
    #[must_use]
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Address announcements are sent to.
    #[must_use]
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Announce `record` until `cancel` fires.
    ///
    /// The socket is released when this returns, whether by cancellation or
    /// by error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BroadcastUnavailable`] on the first failed send; the
    /// loop is not restarted.
    pub async fn run(self, record: PresenceRecord, cancel: CancellationToken) -> Result<()> {
        tracing::debug!(
            "Broadcasting presence of {} ({}) to {} every {:?}",
            record.name(),
            record.address(),
            self.target,
            self.interval
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let payload = record.encode()?;
            if let Err(e) = self.socket.send_to(&payload, self.target).await {
                tracing::warn!("Failed to send presence broadcast: {}", e);
                return Err(Error::BroadcastUnavailable(e));
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    tracing::debug!("Broadcaster received shutdown signal");
                    break;
                }
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        Ok(())
    }
}
