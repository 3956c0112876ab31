//! CLI command definitions and handlers.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Load configuration with graceful fallback to defaults.
///
/// If the config file doesn't exist or can't be parsed, it falls back to defaults.
pub fn load_config() -> dropline_core::config::Config {
    match dropline_core::config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Ignoring configuration file: {}", e);
            dropline_core::config::Config::default()
        }
    }
}

pub mod receive;
pub mod scan;
pub mod send;

/// Dropline - find devices on the local network and send them a file
#[derive(Parser)]
#[command(name = "dropline")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Detailed logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand)]
pub enum Command {
    /// Announce this device and wait for a file
    Receive(ReceiveArgs),

    /// Pick a device on the network and send it a file
    Send(SendArgs),

    /// List devices announcing themselves on the network
    Scan(ScanArgs),
}

/// Arguments for the receive command
#[derive(Parser)]
pub struct ReceiveArgs {
    /// Output directory for the received file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Device name announced to senders
    #[arg(long)]
    pub name: Option<String>,

    /// Discovery port (UDP)
    #[arg(short, long, env = "DROPLINE_PORT")]
    pub port: Option<u16>,

    /// Accept the first offer without asking
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the send command
#[derive(Parser)]
pub struct SendArgs {
    /// File to send
    pub file: PathBuf,

    /// Discovery port (UDP)
    #[arg(short, long, env = "DROPLINE_PORT")]
    pub port: Option<u16>,
}

/// Arguments for the scan command
#[derive(Parser)]
pub struct ScanArgs {
    /// Duration to scan (e.g., 5s, 10s)
    #[arg(short, long, default_value = "5s")]
    pub duration: String,

    /// Discovery port (UDP)
    #[arg(short, long, env = "DROPLINE_PORT")]
    pub port: Option<u16>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
