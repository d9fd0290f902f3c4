//! crawlkit-models - model downloader for the crawlkit extraction pipeline
//!
//! Fetches, caches and warm-loads the embedding, classification and
//! tokenization models, and reports which device they run on.

use anyhow::Result;
use clap::{CommandFactory, Parser};

use crawlkit_models::cli::{Cli, Command};
use crawlkit_models::commands::{self, DownloadOptions};
use crawlkit_models::config::Settings;
use crawlkit_models::models::ModelCache;
use crawlkit_models::ui::Log;

fn main() -> Result<()> {
	let cli = Cli::parse();

	Log::set_verbose(cli.verbose);

	match cli.command {
		Command::Download {
			remove_existing,
			assets_only,
		} => {
			let cache = ModelCache::standard(Settings::from_env(), cli.provider)?;
			commands::download::run(
				&cache,
				DownloadOptions {
					remove_existing,
					assets_only,
				},
			)
		}
		Command::Info => {
			let cache = ModelCache::standard(Settings::from_env(), cli.provider)?;
			commands::info::run(&cache)
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help()?;
				} else {
					eprintln!("Unknown subcommand: {}", sub);
					cmd.print_help()?;
				}
			} else {
				cmd.print_help()?;
			}
			Ok(())
		}
	}
}
