//! # Dropline Core Library
//!
//! `dropline-core` provides device discovery and single-file handoff between
//! machines on the same local network.
//!
//! ## Features
//!
//! - **Presence broadcast**: receivers announce `{name, address}` over UDP broadcast
//! - **Deduplicated discovery**: senders see each device exactly once per session
//! - **Explicit consent**: nothing is written until the receiver accepts the offer
//!
//! ## Modules
//!
//! - [`config`] - Configuration management
//! - [`discovery`] - Presence records, broadcasting and device discovery
//! - [`host`] - Local device name and outbound address resolution
//! - [`task`] - Spawned operations reporting on an event channel
//! - [`transfer`] - The filename / accept-reject / raw bytes handshake
//!
//! ## Example
//!
//! ```rust,ignore
//! use dropline_core::discovery::DeviceDiscovery;
//! use dropline_core::transfer::send_file;
//!
//! let mut discovery = DeviceDiscovery::new(dropline_core::DEFAULT_DISCOVERY_PORT).await?;
//! let device = discovery.discover_once().await?;
//! send_file(&device.address, "report.txt").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod task;
pub mod transfer;

pub use error::{Error, Result};

use std::time::Duration;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default discovery port (UDP)
pub const DEFAULT_DISCOVERY_PORT: u16 = 5050;

/// Default interval between presence broadcasts
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(1);
