//! Play Bridge - headless driver for the Play Games identity and update bridge
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use play_bridge::headless::emit_line;

/// Play Bridge - replay host sessions against the vendor simulator
#[derive(Parser, Debug)]
#[command(name = "playbridge")]
#[command(about = "Play Games identity and in-app update bridge", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: CommandArg,
}

#[derive(Subcommand, Debug)]
enum CommandArg {
    /// Replay a scenario file and print every event as NDJSON
    Simulate {
        /// Path to the scenario TOML file
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Settings file (defaults to playbridge.toml next to the scenario)
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,
    },

    /// Print the event catalogue as NDJSON
    Events,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    match args.command {
        CommandArg::Simulate { scenario, settings } => {
            // Logs go to a file since stdout carries the events
            if let Err(e) = playbridge_core::logging::init() {
                eprintln!("Logging disabled: {}", e);
            }
            play_bridge::run_headless(&scenario, settings.as_deref()).await?;
        }
        CommandArg::Events => {
            for entry in play_bridge::catalogue() {
                emit_line(&entry);
            }
        }
    }

    Ok(())
}
