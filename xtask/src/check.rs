use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, OnFailure};
use crate::TARGET;

pub fn run() -> Result<()> {
    println!();
    println!("{}", "Checking builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    // Both images link against riscv-rt and need the SoC target.
    for bin in ["dlc_vco", "dsm_dlc"] {
        cargo(
            &format!("{bin} image ({TARGET})"),
            &[
                "check",
                "-p",
                "firmware",
                "--target",
                TARGET,
                "--features",
                "hardware",
                "--bin",
                bin,
            ],
            OnFailure::Abort,
        )?;
    }

    // The libraries stay no_std; a bare-target check catches a stray std use.
    cargo(
        "platform and acquisition (no_std)",
        &[
            "check",
            "-p",
            "platform",
            "-p",
            "acquisition",
            "--target",
            TARGET,
            "--no-default-features",
        ],
        OnFailure::Abort,
    )?;

    cargo(
        "host build with tracing",
        &["check", "-p", "firmware", "--features", "std,tracing"],
        OnFailure::Abort,
    )?;

    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;

    if cargo("formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
