//! UI utilities for Dropline CLI.

use std::time::Duration;

/// Print the banner shown at the start of interactive commands.
pub fn banner() {
    println!();
    println!("Dropline v{}", dropline_core::VERSION);
    println!("{}", "-".repeat(37));
    println!();
}

/// Print a command failure, with the library's error code and suggestion
/// when there is one.
pub fn print_error(err: &anyhow::Error) {
    eprintln!();
    match err.downcast_ref::<dropline_core::Error>() {
        Some(core) => {
            match core.code() {
                Some(code) => eprintln!("  Error [{}]: {:#}", code, err),
                None => eprintln!("  Error: {:#}", err),
            }
            if let Some(suggestion) = core.suggestion() {
                eprintln!();
                for line in suggestion.lines() {
                    eprintln!("  {}", line.trim());
                }
            }
        }
        None => eprintln!("  Error: {:#}", err),
    }
    eprintln!();
}

/// Parse a duration string like "500ms", "30s", or "1m".
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(num_str) = s.strip_suffix("ms") {
        let num: u64 = num_str.parse().ok()?;
        Some(Duration::from_millis(num))
    } else if let Some(num_str) = s.strip_suffix('m') {
        let num: u64 = num_str.parse().ok()?;
        Some(Duration::from_secs(num.checked_mul(60)?))
    } else if let Some(num_str) = s.strip_suffix('s') {
        let num: u64 = num_str.parse().ok()?;
        Some(Duration::from_secs(num))
    } else {
        None
    }
}

/// Truncate a string to fit within a maximum width.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len - 1).collect();
        format!("{}…", truncated)
    }
}
