//! Receive command implementation.

use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dropline_core::discovery::{PresenceBroadcaster, PresenceRecord};
use dropline_core::host::{HostResolver, SystemResolver};
use dropline_core::task::{self, Event, Status};
use dropline_core::transfer::TransferListener;

use super::ReceiveArgs;

/// Run the receive command.
pub async fn run(args: ReceiveArgs) -> Result<()> {
    let global_config = super::load_config();

    let output_dir = args
        .output
        .or_else(|| global_config.general.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    if !output_dir.is_dir() {
        bail!("Output directory does not exist: {}", output_dir.display());
    }

    let (name, local_ip) = identity(
        &SystemResolver,
        args.name,
        &global_config.general.device_name,
    )?;

    let listener = TransferListener::bind(SocketAddr::new(local_ip, 0))
        .await
        .context("Failed to start transfer listener")?;
    let listen_addr = listener.local_addr()?;

    let mut discovery = global_config.discovery.clone();
    if let Some(port) = args.port {
        discovery.port = port;
    }
    let record = PresenceRecord::new(name.as_str(), listen_addr.to_string())?;
    let broadcaster = PresenceBroadcaster::with_target(discovery.broadcast_target())
        .await?
        .interval(discovery.interval);

    crate::ui::banner();
    println!("  Receiving as {} ({})", name, listen_addr);
    println!("  Announcing on port {}. Waiting for a sender...", discovery.port);
    println!();

    let (tx, mut events) = mpsc::channel(8);
    let cancel = CancellationToken::new();
    task::spawn_broadcast(broadcaster, record, cancel.clone(), tx.clone());
    let mut offers = task::spawn_offer(listener, tx.clone());

    loop {
        match events.recv().await {
            Some(Event::Offer(offer)) => {
                cancel.cancel();

                println!("  {} wants to send you '{}'", offer.peer(), offer.file_name());
                let accepted = args.yes || confirm().await?;

                if accepted {
                    println!("  Receiving...");
                    task::spawn_accept(offer, output_dir.clone(), tx.clone());
                } else {
                    task::spawn_reject(offer, tx.clone());
                }
            }
            Some(Event::Status(Status::Received(file))) => {
                println!();
                println!("  Transfer complete!");
                println!("  Saved {} ({} bytes)", file.path.display(), file.bytes);
                println!();
                return Ok(());
            }
            Some(Event::Status(Status::Rejected { file_name })) => {
                println!("  Declined '{}'.", file_name);
                println!();
                return Ok(());
            }
            Some(Event::Status(_) | Event::Found(_)) => {}
            Some(Event::Error(dropline_core::Error::InvalidHeader(reason)))
                if !cancel.is_cancelled() =>
            {
                tracing::debug!("Dropped connection with a bad header: {}", reason);
                let listener = offers.await.context("Transfer listener task failed")?;
                offers = task::spawn_offer(listener, tx.clone());
            }
            Some(Event::Error(e)) => {
                cancel.cancel();
                return Err(e).context("Transfer failed");
            }
            None => bail!("Receiver stopped unexpectedly"),
        }
    }
}

/// Name to announce and address to listen on.
///
/// An explicit `--name` wins over the configured name; the host name is the
/// fallback when neither is set.
fn identity(
    resolver: &impl HostResolver,
    name: Option<String>,
    configured_name: &str,
) -> Result<(String, IpAddr)> {
    let name = match name {
        Some(name) => name,
        None if !configured_name.is_empty() => configured_name.to_string(),
        None => resolver.device_name()?,
    };
    let local_ip = resolver
        .local_ip()
        .context("Could not determine the local network address")?;
    Ok((name, local_ip))
}

/// Ask whether to take the offered file. Anything but "y" declines.
async fn confirm() -> Result<bool> {
    print!("  Accept? [y/N] ");
    io::stdout().flush()?;

    let mut input = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader.read_line(&mut input).await?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
