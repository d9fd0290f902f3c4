use clap::builder::styling::{AnsiColor, Style, Styles};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

/// Compute backend preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Provider {
	/// Auto-detect best available (CUDA → CoreML → CPU)
	#[default]
	Auto,
	/// CPU only
	Cpu,
	/// NVIDIA CUDA GPU (TensorRT when available)
	Cuda,
	/// Apple CoreML (macOS only)
	Coreml,
	/// XNNPACK CPU kernels
	Xnnpack,
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.usage(Style::new().bold().fg_color(Some(AnsiColor::Blue.into())))
		.literal(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.placeholder(Style::new().fg_color(Some(AnsiColor::Yellow.into())))
		.valid(Style::new().fg_color(Some(AnsiColor::Blue.into())))
		.invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
}

#[derive(Parser, Debug)]
#[command(
	name = "crawlkit-models",
	author,
	version,
	about = "Download and cache the models used by crawlkit's extraction pipeline",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {download}                      {download_desc}
  {bin} {download} {fresh}    {fresh_desc}
  {bin} {info} {info_args}                {info_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "crawlkit-models".bright_blue(),
		download = "download".yellow(),
		download_desc = "Fetch and load every model".dimmed(),
		fresh = "--remove-existing",
		fresh_desc = "Start from an empty models folder".dimmed(),
		info = "info".yellow(),
		info_args = "-p cpu",
		info_desc = "Show device and cache status".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	/// Execution provider: auto, cpu, cuda, coreml, xnnpack
	#[arg(short = 'p', long = "provider", global = true, default_value = "auto")]
	pub provider: Provider,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Download every model required by the extraction pipeline
	Download {
		/// Remove existing models before downloading
		#[arg(long = "remove-existing")]
		remove_existing: bool,

		/// Fetch files without loading them
		#[arg(long = "assets-only")]
		assets_only: bool,
	},

	/// Show the selected device and which models are cached
	Info,

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}
