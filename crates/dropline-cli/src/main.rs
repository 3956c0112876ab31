//! Dropline CLI - find devices on the local network and send them a file
//!
//! ## Quick Start
//!
//! ```bash
//! # Wait for a file (on the receiving device)
//! dropline receive
//!
//! # Pick a receiver and send it a file
//! dropline send ./document.pdf
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

use clap::Parser;

mod commands;
pub mod ui;

use commands::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Receive(args) => commands::receive::run(args).await,
        Command::Send(args) => commands::send::run(args).await,
        Command::Scan(args) => commands::scan::run(args).await,
    };

    if let Err(e) = result {
        ui::print_error(&e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if verbose {
        "warn,dropline=debug,dropline_core=debug"
    } else {
        "warn,dropline=info,dropline_core=info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
