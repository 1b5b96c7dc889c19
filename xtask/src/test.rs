use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{cargo, OnFailure};

/// Crates whose tests run on the host.
const TESTED: [&str; 3] = ["platform", "acquisition", "firmware"];

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();
    let packages: Vec<&str> = TESTED.iter().flat_map(|p| ["-p", p]).collect();

    if !integration_only {
        let mut args = vec!["test", "--lib"];
        args.extend(&packages);
        args.extend(["--features", "platform/std"]);
        report(cargo("unit tests", &args, OnFailure::Abort)?);
    }

    if !unit_only {
        let mut args = vec!["test", "--test", "*"];
        args.extend(&packages);
        args.extend(["--features", "platform/std"]);
        report(cargo("integration tests", &args, OnFailure::Abort)?);
    }

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

fn report(output: Option<std::process::Output>) {
    if let Some(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout);
        println!("    {}", summarize(&stdout));
        println!();
    }
}

/// Add up every "test result:" line cargo printed, one per test binary.
fn summarize(output: &str) -> String {
    let mut passed = 0u64;
    let mut failed = 0u64;
    let mut binaries = 0u64;
    for line in output.lines().filter(|l| l.contains("test result:")) {
        binaries = binaries.saturating_add(1);
        passed = passed.saturating_add(count_before(line, " passed"));
        failed = failed.saturating_add(count_before(line, " failed"));
    }
    if binaries == 0 {
        return "(summary not available)".to_string();
    }
    format!("{passed} passed, {failed} failed across {binaries} test binaries")
}

fn count_before(line: &str, label: &str) -> u64 {
    line.split(';')
        .find_map(|part| part.trim().strip_suffix(label))
        .and_then(|n| n.rsplit(' ').next())
        .and_then(|n| n.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_every_test_binary() {
        let out = "\
test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out
test result: ok. 12 passed; 1 failed; 0 ignored; 0 measured; 0 filtered out
";
        assert_eq!(summarize(out), "17 passed, 1 failed across 2 test binaries");
    }

    #[test]
    fn no_result_lines() {
        assert_eq!(summarize("compiling"), "(summary not available)");
    }
}
