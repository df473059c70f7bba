//! CLI integration tests for the demo mode.

use std::process::Command;

fn summary_value<'a>(stdout: &'a str, key: &str) -> &'a str {
    let prefix = format!("{key}=");
    stdout
        .lines()
        .find_map(|line| line.strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{key} line missing"))
        .trim()
}

#[test]
fn demo_cli_delivers_every_unit() {
    let bin = env!("CARGO_BIN_EXE_haulsim");
    // Run the demo binary with default settings.
    let output = Command::new(bin)
        .output()
        .expect("failed to run demo binary");

    assert!(
        output.status.success(),
        "demo exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("SIMULATION SUMMARY"),
        "summary missing from output"
    );
    assert_eq!(summary_value(&stdout, "consistent"), "true");

    // The demo map holds 17 units across 6 blocks.
    assert_eq!(summary_value(&stdout, "units_total"), "17");
    assert_eq!(summary_value(&stdout, "delivered"), "17");
    assert_eq!(summary_value(&stdout, "blocks_mined"), "6");
}

#[test]
fn explicit_demo_subcommand_matches_default() {
    let bin = env!("CARGO_BIN_EXE_haulsim");
    let output = Command::new(bin)
        .arg("demo")
        .output()
        .expect("failed to run demo binary");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(summary_value(&stdout, "delivered"), "17");
}
