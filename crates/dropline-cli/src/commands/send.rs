//! Send command implementation.
//!
//! Devices are listed as discovery reports them; the user picks one by
//! index while discovery keeps running.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dropline_core::discovery::{DeviceDiscovery, DeviceFound};
use dropline_core::task::{self, Event, Status};

use super::SendArgs;
use crate::ui::truncate_string;

/// What the user typed at the device prompt.
#[derive(Debug, PartialEq, Eq)]
enum Choice {
    Device(usize),
    Quit,
    Invalid,
}

/// Run the send command.
pub async fn run(args: SendArgs) -> Result<()> {
    let global_config = super::load_config();
    let port = args.port.unwrap_or(global_config.discovery.port);

    if !args.file.is_file() {
        bail!("Not a file: {}", args.file.display());
    }

    crate::ui::banner();
    println!("  Looking for devices on port {}...", port);
    println!("  Enter a number to send, or 'q' to quit.");
    println!();

    let discovery = DeviceDiscovery::new(port)
        .await
        .context("Failed to create discovery listener")?;

    let (tx, mut events) = mpsc::channel(32);
    let cancel = CancellationToken::new();
    task::spawn_discovery(discovery, cancel.clone(), tx.clone());

    let mut devices: Vec<DeviceFound> = Vec::new();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    let target = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(Event::Found(device)) => {
                    println!(
                        "  [{}] {:24}  {}",
                        devices.len(),
                        truncate_string(&device.name, 24),
                        device.address
                    );
                    devices.push(device);
                    prompt()?;
                }
                Some(Event::Error(e)) => return Err(e).context("Discovery stopped"),
                Some(_) => {}
                None => bail!("Discovery ended unexpectedly"),
            },
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    cancel.cancel();
                    println!();
                    println!("  Cancelled.");
                    return Ok(());
                };
                match parse_choice(&line, devices.len()) {
                    Choice::Device(index) => break devices[index].clone(),
                    Choice::Quit => {
                        cancel.cancel();
                        println!("  Cancelled.");
                        return Ok(());
                    }
                    Choice::Invalid => {
                        println!(
                            "  Pick a number between 0 and {}.",
                            devices.len().saturating_sub(1)
                        );
                        prompt()?;
                    }
                }
            }
        }
    };

    cancel.cancel();

    println!();
    println!("  Offering {} to {}...", args.file.display(), target.name);
    task::spawn_send(target.address.clone(), args.file.clone(), tx);

    loop {
        match events.recv().await {
            Some(Event::Status(Status::Sent(sent))) => {
                println!("  Sent {} ({} bytes).", sent.file_name, sent.bytes);
                println!();
                return Ok(());
            }
            Some(Event::Error(e)) if e.is_rejection() => {
                println!("  {} declined the file.", target.name);
                println!();
                return Ok(());
            }
            Some(Event::Error(e)) => return Err(e).context("Transfer failed"),
            Some(_) => {}
            None => bail!("Transfer ended unexpectedly"),
        }
    }
}

fn prompt() -> Result<()> {
    print!("  > ");
    io::stdout().flush()?;
    Ok(())
}

fn parse_choice(input: &str, available: usize) -> Choice {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Choice::Quit;
    }
    match input.parse::<usize>() {
        Ok(index) if index < available => Choice::Device(index),
        _ => Choice::Invalid,
    }
}
