//! Network operations as spawned tasks.
//!
//! Each helper runs one operation on the tokio runtime and reports its
//! terminal outcome as an [`Event`] on an mpsc channel. A front end drives
//! the whole flow from a single receive loop and never touches sockets
//! itself. If the receiving end of the channel is gone, outcomes are
//! dropped.

use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::discovery::{DeviceDiscovery, DeviceFound, PresenceBroadcaster, PresenceRecord};
use crate::error::Error;
use crate::transfer::{ReceivedFile, SentFile, TransferInitiator, TransferListener, TransferOffer};

/// Outcome reported by a spawned operation.
#[derive(Debug)]
pub enum Event {
    /// Discovery saw a new device
    Found(DeviceFound),
    /// A peer offered a file and is waiting for a decision
    Offer(TransferOffer),
    /// An operation finished successfully
    Status(Status),
    /// An operation failed; it will not report again
    Error(Error),
}

/// Successful terminal outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The broadcaster was cancelled and released its socket
    BroadcastStopped,
    /// The discovery session was cancelled
    DiscoveryStopped,
    /// An accepted file was written to disk
    Received(ReceivedFile),
    /// An offer was declined
    Rejected {
        /// Name of the declined file
        file_name: String,
    },
    /// A file was delivered to its receiver
    Sent(SentFile),
}

async fn report(events: &mpsc::Sender<Event>, event: Event) {
    if events.send(event).await.is_err() {
        tracing::debug!("Event receiver dropped, discarding outcome");
    }
}

/// Announce `record` until `cancel` fires.
///
/// Reports [`Status::BroadcastStopped`] on cancellation or [`Event::Error`]
/// if a send fails.
pub fn spawn_broadcast(
    broadcaster: PresenceBroadcaster,
    record: PresenceRecord,
    cancel: CancellationToken,
    events: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = match broadcaster.run(record, cancel).await {
            Ok(()) => Event::Status(Status::BroadcastStopped),
            Err(e) => Event::Error(e),
        };
        report(&events, event).await;
    })
}

/// Report every newly discovered device until `cancel` fires or the socket fails.
///
/// The session is handed back when the task ends, so a caller can resume
/// it later without forgetting devices already reported.
pub fn spawn_discovery(
    mut discovery: DeviceDiscovery,
    cancel: CancellationToken,
    events: mpsc::Sender<Event>,
) -> JoinHandle<DeviceDiscovery> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    report(&events, Event::Status(Status::DiscoveryStopped)).await;
                    break;
                }
                result = discovery.discover_once() => match result {
                    Ok(device) => report(&events, Event::Found(device)).await,
                    Err(e) => {
                        report(&events, Event::Error(e)).await;
                        break;
                    }
                },
            }
        }
        discovery
    })
}

/// Wait for one inbound offer.
///
/// The listener is handed back so the caller can wait for another.
pub fn spawn_offer(
    listener: TransferListener,
    events: mpsc::Sender<Event>,
) -> JoinHandle<TransferListener> {
    tokio::spawn(async move {
        let event = match listener.next_offer().await {
            Ok(offer) => Event::Offer(offer),
            Err(e) => Event::Error(e),
        };
        report(&events, event).await;
        listener
    })
}

/// Accept `offer` into `dest_dir`.
pub fn spawn_accept(
    offer: TransferOffer,
    dest_dir: PathBuf,
    events: mpsc::Sender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let event = match offer.accept(&dest_dir).await {
            Ok(received) => Event::Status(Status::Received(received)),
            Err(e) => Event::Error(e),
        };
        report(&events, event).await;
    })
}

/// Decline `offer`.
pub fn spawn_reject(offer: TransferOffer, events: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let file_name = offer.file_name().to_string();
        let event = match offer.reject().await {
            Ok(()) => Event::Status(Status::Rejected { file_name }),
            Err(e) => Event::Error(e),
        };
        report(&events, event).await;
    })
}

/// Send the file at `path` to the device at `address`.
pub fn spawn_send(address: String, path: PathBuf, events: mpsc::Sender<Event>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = match TransferInitiator::new(address) {
            Ok(initiator) => initiator.send(&path).await,
            Err(e) => Err(e),
        };
        let event = match result {
            Ok(sent) => Event::Status(Status::Sent(sent)),
            Err(e) => Event::Error(e),
        };
        report(&events, event).await;
    })
}
