//! Scan command implementation.

use anyhow::{Context, Result};

use dropline_core::discovery::{DeviceDiscovery, DeviceFound};

use super::ScanArgs;
use crate::ui::{parse_duration, truncate_string};

/// Run the scan command.
pub async fn run(args: ScanArgs) -> Result<()> {
    let global_config = super::load_config();
    let port = args.port.unwrap_or(global_config.discovery.port);

    let duration = parse_duration(&args.duration)
        .context("Invalid duration format. Use formats like '500ms', '5s', '1m'")?;

    if !args.json {
        println!();
        println!("Scanning for devices on port {} ({})...", port, args.duration);
        println!();
    }

    let mut discovery = DeviceDiscovery::new(port)
        .await
        .context("Failed to create discovery listener")?;

    let devices = discovery.scan(duration).await?;

    if args.json {
        output_json_devices(&devices)?;
    } else {
        display_devices(&devices);
    }

    Ok(())
}

/// Output devices as JSON.
fn output_json_devices(devices: &[DeviceFound]) -> Result<()> {
    let output = serde_json::json!({
        "devices": devices.iter().map(|d| serde_json::json!({
            "name": d.name,
            "address": d.address,
        })).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Display devices as text table.
fn display_devices(devices: &[DeviceFound]) {
    println!("Devices on Network:");
    println!("{}", "─".repeat(50));
    println!("  {:24}  {:22}", "Name", "Address");
    println!("{}", "─".repeat(50));

    if devices.is_empty() {
        println!("  (no devices found)");
        println!("{}", "─".repeat(50));
        return;
    }

    for device in devices {
        println!(
            "  {:24}  {:22}",
            truncate_string(&device.name, 24),
            device.address
        );
    }

    println!("{}", "─".repeat(50));
}
