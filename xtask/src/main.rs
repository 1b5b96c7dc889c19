// Tooling crate: unwrap/expect/panic acceptable outside the firmware.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod step;
mod test;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Target triple of the SoC's hart.
pub const TARGET: &str = "riscv32imc-unknown-none-elf";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "cheep acquisition firmware tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check both images for the SoC target, the libraries on the host, and lints
    Check,
    /// Run the host test suites
    Test {
        /// Run only the unit tests
        #[arg(long)]
        unit: bool,
        /// Run only the integration tests under each crate's tests/
        #[arg(long)]
        integration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
    }
}
