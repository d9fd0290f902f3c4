// Integration tests for the crawlkit-models binary

use std::process::{Command, Output};

fn run(args: &[&str], home: &std::path::Path) -> Output {
	Command::new(env!("CARGO_BIN_EXE_crawlkit-models"))
		.args(args)
		.env("CRAWLKIT_HOME", home)
		.env("NO_COLOR", "1")
		.output()
		.expect("Failed to run crawlkit-models")
}

#[test]
fn test_version_display() {
	let tmp = tempfile::tempdir().unwrap();
	let output = run(&["--version"], tmp.path());

	assert!(output.status.success(), "Version command failed");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("crawlkit-models"), "Expected name in version output");
}

#[test]
fn test_help_display() {
	let tmp = tempfile::tempdir().unwrap();
	let output = run(&["--help"], tmp.path());

	assert!(output.status.success(), "Help command failed");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(
		stdout.contains("download") && stdout.contains("info"),
		"Expected download and info in help output"
	);
}

#[test]
fn test_help_subcommand() {
	let tmp = tempfile::tempdir().unwrap();
	let output = run(&["help", "download"], tmp.path());

	assert!(output.status.success(), "help download failed");
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("--remove-existing"));
	assert!(stdout.contains("--assets-only"));
}

#[test]
fn test_info_on_empty_home() {
	let tmp = tempfile::tempdir().unwrap();
	let home = tmp.path().join(".crawlkit");
	let output = run(&["-p", "cpu", "info"], &home);

	assert!(output.status.success(), "Info command failed: {}", String::from_utf8_lossy(&output.stderr));
	let stdout = String::from_utf8_lossy(&output.stdout);
	assert!(stdout.contains("cpu"));
	assert!(stdout.contains("all-MiniLM-L6-v2"));
	assert!(stdout.contains("reuters"));
	assert!(!home.join("models").exists(), "info must not download anything");
}

#[test]
fn test_unknown_provider_rejected() {
	let tmp = tempfile::tempdir().unwrap();
	let output = run(&["-p", "tpu", "info"], tmp.path());

	assert!(!output.status.success());
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(stderr.contains("tpu"));
}
