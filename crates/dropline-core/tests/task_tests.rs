//! Tests for driving transfers from a single event loop.

mod common;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dropline_core::discovery::{PresenceBroadcaster, PresenceRecord};
use dropline_core::task::{self, Event, Status};
use dropline_core::Error;

use common::{
    announce, create_temp_dir, create_test_file, dir_entries, loopback_discovery,
    loopback_listener, within,
};

async fn next_event(events: &mut mpsc::Receiver<Event>) -> Event {
    within(events.recv()).await.expect("channel closed")
}

#[tokio::test]
async fn test_discovery_task_reports_devices_then_stops() {
    let (discovery, target) = loopback_discovery().await;
    let (tx, mut rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();
    let handle = task::spawn_discovery(discovery, cancel.clone(), tx);

    announce(target, "laptop", "10.0.0.5:4000").await;
    announce(target, "laptop", "10.0.0.5:4000").await;
    announce(target, "phone", "10.0.0.6:4000").await;

    for expected in ["laptop", "phone"] {
        match next_event(&mut rx).await {
            Event::Found(device) => assert_eq!(device.name, expected),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    cancel.cancel();
    assert!(matches!(
        next_event(&mut rx).await,
        Event::Status(Status::DiscoveryStopped)
    ));

    let discovery = within(handle).await.expect("join");
    assert_eq!(discovery.registry().len(), 2);
}

#[tokio::test]
async fn test_broadcast_task_reports_stop() {
    let (_discovery, target) = loopback_discovery().await;
    let broadcaster = PresenceBroadcaster::with_target(target)
        .await
        .expect("broadcaster")
        .interval(Duration::from_millis(20));
    let record = PresenceRecord::new("laptop", "10.0.0.5:4000").unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    let cancel = CancellationToken::new();
    task::spawn_broadcast(broadcaster, record, cancel.clone(), tx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    assert!(matches!(
        next_event(&mut rx).await,
        Event::Status(Status::BroadcastStopped)
    ));
}

#[tokio::test]
async fn test_broadcast_task_reports_send_failure() {
    let broadcaster = PresenceBroadcaster::with_target("[::1]:5050".parse().unwrap())
        .await
        .expect("broadcaster");
    let record = PresenceRecord::new("laptop", "10.0.0.5:4000").unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    task::spawn_broadcast(broadcaster, record, CancellationToken::new(), tx);

    assert!(matches!(
        next_event(&mut rx).await,
        Event::Error(Error::BroadcastUnavailable(_))
    ));
}

#[tokio::test]
async fn test_accept_flow_through_events() {
    let src = create_temp_dir();
    let dest = create_temp_dir();
    let file = create_test_file(src.path(), "report.txt", b"hello");
    let (listener, addr) = loopback_listener().await;

    let (tx, mut rx) = mpsc::channel(4);
    task::spawn_offer(listener, tx.clone());
    task::spawn_send(addr.to_string(), file, tx.clone());

    let offer = match next_event(&mut rx).await {
        Event::Offer(offer) => offer,
        other => panic!("expected offer, got {other:?}"),
    };
    assert_eq!(offer.file_name(), "report.txt");
    task::spawn_accept(offer, dest.path().to_path_buf(), tx);

    let mut received = None;
    let mut sent = None;
    while received.is_none() || sent.is_none() {
        match next_event(&mut rx).await {
            Event::Status(Status::Received(file)) => received = Some(file),
            Event::Status(Status::Sent(file)) => sent = Some(file),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    let received = received.unwrap();
    assert_eq!(received.path, dest.path().join("report.txt"));
    assert_eq!(std::fs::read(&received.path).unwrap(), b"hello");
    assert_eq!(sent.unwrap().bytes, 5);
}

#[tokio::test]
async fn test_reject_flow_through_events() {
    let src = create_temp_dir();
    let dest = create_temp_dir();
    let file = create_test_file(src.path(), "report.txt", b"hello");
    let (listener, addr) = loopback_listener().await;

    let (tx, mut rx) = mpsc::channel(4);
    task::spawn_offer(listener, tx.clone());
    task::spawn_send(addr.to_string(), file, tx.clone());

    let offer = match next_event(&mut rx).await {
        Event::Offer(offer) => offer,
        other => panic!("expected offer, got {other:?}"),
    };
    task::spawn_reject(offer, tx);

    let mut rejected = false;
    let mut sender_told = false;
    while !(rejected && sender_told) {
        match next_event(&mut rx).await {
            Event::Status(Status::Rejected { file_name }) => {
                assert_eq!(file_name, "report.txt");
                rejected = true;
            }
            Event::Error(Error::TransferRejected) => sender_told = true,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    assert!(dir_entries(dest.path()).is_empty());
}

#[tokio::test]
async fn test_send_to_invalid_address_reports_error() {
    let (tx, mut rx) = mpsc::channel(1);
    task::spawn_send("not-an-address".to_string(), "report.txt".into(), tx);

    assert!(matches!(
        next_event(&mut rx).await,
        Event::Error(Error::InvalidAddress(_))
    ));
}

#[tokio::test]
async fn test_outcome_dropped_when_receiver_gone() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let handle = task::spawn_send("not-an-address".to_string(), "report.txt".into(), tx);
    within(handle).await.expect("task finishes quietly");
}
