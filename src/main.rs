//! # Catalog Assistant Entry Point
//!
//! ## Application Flow
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialise tracing (console + rolling files)
//!   ├─> Load settings from .env / environment
//!   │
//!   ├─> If a subcommand was given:
//!   │   └─> Run it on a Tokio runtime
//!   │
//!   └─> Otherwise:
//!       └─> Start the interactive wizard
//! ```
//!
//! ## Usage
//!
//! ```bash
//! catalog-assistant                              # interactive wizard
//! catalog-assistant test-connection
//! catalog-assistant columns -t users --json
//! catalog-assistant document -t users -o docs --apply
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // Allow println! in main binary
#![expect(clippy::print_stderr)]

mod cli;
mod wizard;

use anyhow::Result;
use catalog_assistant::logging;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    if let Err(e) = logging::init(&cli.log_level) {
        eprintln!("warning: file logging disabled: {e:#}");
    }

    let settings = cli::load_settings(cli.model.as_deref())?;
    let command = cli.command.unwrap_or(cli::Commands::Wizard);

    tokio::runtime::Runtime::new()?.block_on(cli::run_command(command, settings))
}
