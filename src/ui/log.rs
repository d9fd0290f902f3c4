//! Unified logging system

use chrono::Local;
use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

const MIB: f64 = 1024.0 * 1024.0;

pub struct Log;

impl Log {
	pub fn set_verbose(enabled: bool) {
		VERBOSE.store(enabled, Ordering::Relaxed);
	}

	pub fn is_verbose() -> bool {
		VERBOSE.load(Ordering::Relaxed)
	}
}

pub fn info(msg: &str) {
	println!("{} {}", "ℹ".bright_blue().bold(), msg.bright_white());
}

pub fn success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_white());
}

pub fn warn(msg: &str) {
	println!("{} {}", "⚠".bright_yellow().bold(), msg.bright_white());
}

pub fn error(msg: &str) {
	println!("{} {}", "✗".bright_red().bold(), msg.bright_white());
}

pub fn debug(msg: &str) {
	if Log::is_verbose() {
		let time = Local::now().format("%H:%M:%S").to_string();
		println!(
			"{} {} {}",
			format!("[{}]", time).dimmed(),
			"⚙".bright_black().bold(),
			msg.dimmed()
		);
	}
}

pub fn header(text: &str) {
	println!("\n{}", text.bright_blue().bold());
}

/// Renders one progress line, e.g. `Downloading: 42.00% (1.00 MB of 2.38 MB)`
pub fn progress_line(downloaded: u64, total: Option<u64>) -> String {
	match total {
		Some(total) if total > 0 && downloaded < total => format!(
			"Downloading: {:.2}% ({:.2} MB of {:.2} MB)",
			100.0 * downloaded as f64 / total as f64,
			downloaded as f64 / MIB,
			total as f64 / MIB
		),
		Some(_) => "Download complete!".to_string(),
		None => format!("Downloading: {:.2} MB", downloaded as f64 / MIB),
	}
}

/// Clickable file path (OSC 8 terminal hyperlink)
pub fn path_link(path: &std::path::Path) -> String {
	let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

	let uri = if cfg!(windows) {
		let path_str = absolute.to_string_lossy();
		let cleaned = path_str.strip_prefix(r"\\?\").unwrap_or(&path_str);
		format!("file:///{}", cleaned.replace('\\', "/"))
	} else {
		format!("file://{}", absolute.display())
	};

	format!("\x1b]8;;{}\x1b\\{}\x1b]8;;\x1b\\", uri, path.display())
}
