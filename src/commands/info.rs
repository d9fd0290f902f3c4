//! Info command - device, capacity and asset status

use anyhow::Result;
use colored::Colorize;

use crate::core::is_present;
use crate::models::{required_assets, ModelCache, ModelKey};
use crate::runtime::GIB;
use crate::ui;

pub fn run(cache: &ModelCache) -> Result<()> {
	let device = cache.device();
	let memory = cache.devices().get_available_memory(device);

	ui::header("Device");
	println!("  {} {}", "Selected:".bright_blue(), device);
	if memory > 0 {
		println!("  {} {:.1} GiB", "Memory:".bright_blue(), memory as f64 / GIB as f64);
	}
	println!("  {} {}", "Batch size:".bright_blue(), cache.batch_size());

	ui::header("Models");
	println!("  {} {}", "Home:".bright_blue(), ui::path_link(cache.home().root()));

	for key in ModelKey::ALL {
		let marker = if cache.is_cached(key) {
			"✓".bright_green()
		} else {
			"✗".bright_red()
		};
		println!("  {} {}", marker, key.to_string().bright_white());

		for required in required_assets(key, cache.settings()) {
			let path = cache.home().models_dir().join(&required.relative);
			if is_present(&path) {
				println!("      {}", ui::path_link(&path));
			} else {
				println!("      {}", path.display().to_string().dimmed());
			}
		}
	}

	if cache.resolve(ModelKey::MultilabelClassifier) == ModelKey::Reuters {
		println!();
		ui::info("No accelerator: topic classification uses the Reuters package");
	}

	Ok(())
}
