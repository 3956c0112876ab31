//! Common test utilities for `Dropline` integration tests.
//!
//! Everything binds to loopback on ephemeral ports so tests can run in
//! parallel without touching the real network.

#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

use dropline_core::discovery::{DeviceDiscovery, PresenceRecord};
use dropline_core::transfer::TransferListener;
use tokio::net::UdpSocket;

/// Upper bound for any single wait in a test.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Create a temporary directory for test files.
///
/// The directory will be automatically cleaned up when the returned
/// `TempDir` is dropped.
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// Create a test file with the given content.
pub fn create_test_file(dir: &std::path::Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Names of the entries in `dir`, sorted.
pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// A transfer listener on an ephemeral loopback port.
pub async fn loopback_listener() -> (TransferListener, SocketAddr) {
    let listener = TransferListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
        .await
        .expect("Failed to bind transfer listener");
    let addr = listener.local_addr().expect("listener address");
    (listener, addr)
}

/// A discovery session on an ephemeral loopback port.
pub async fn loopback_discovery() -> (DeviceDiscovery, SocketAddr) {
    let discovery = DeviceDiscovery::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("Failed to bind discovery session");
    let addr = discovery.local_addr().expect("discovery address");
    (discovery, addr)
}

/// Send one raw datagram to `target`.
pub async fn send_datagram(target: SocketAddr, payload: &[u8]) {
    let socket = UdpSocket::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind sender socket");
    socket
        .send_to(payload, target)
        .await
        .expect("Failed to send datagram");
}

/// Send an encoded presence record to `target`.
pub async fn announce(target: SocketAddr, name: &str, address: &str) {
    let record = PresenceRecord::new(name, address).expect("valid record");
    send_datagram(target, &record.encode().expect("encode")).await;
}

/// Await `future`, failing the test if it takes longer than [`TEST_TIMEOUT`].
pub async fn within<F: std::future::Future>(future: F) -> F::Output {
    tokio::time::timeout(TEST_TIMEOUT, future)
        .await
        .expect("operation timed out")
}
