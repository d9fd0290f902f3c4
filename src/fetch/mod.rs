//! # Asset Fetching
//!
//! Puts remote model artifacts on disk when they are not already there.
//! Presence of the destination (a file, or a non-empty directory) is the only
//! cache signal; contents are never verified.

pub mod archive;
pub mod git;
pub mod transport;

pub use git::{GitCli, RepoCloner};
pub use transport::{HttpTransport, Transport};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::core::is_present;
use crate::ui;

/// A remote artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
	/// A single file served over HTTP(S)
	File { url: String },
	/// A folder inside a source repository, taken from one branch
	RepoSubdir {
		url: String,
		branch: String,
		subdir: String,
	},
	/// A zip archive unpacked into the destination directory
	Archive { url: String },
}

impl Asset {
	pub fn file(url: impl Into<String>) -> Self {
		Asset::File { url: url.into() }
	}

	pub fn archive(url: impl Into<String>) -> Self {
		Asset::Archive { url: url.into() }
	}

	pub fn repo_subdir(url: impl Into<String>, branch: impl Into<String>, subdir: impl Into<String>) -> Self {
		Asset::RepoSubdir {
			url: url.into(),
			branch: branch.into(),
			subdir: subdir.into(),
		}
	}
}

/// What [`AssetFetcher::ensure`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
	/// Downloaded or copied `bytes` into place
	Fetched { bytes: u64 },
	/// The destination already existed; nothing was transferred
	AlreadyPresent,
	/// Fetching failed; the destination is absent
	FetchFailed(String),
}

impl FetchOutcome {
	pub fn is_failed(&self) -> bool {
		matches!(self, FetchOutcome::FetchFailed(_))
	}

	pub fn bytes(&self) -> u64 {
		match self {
			FetchOutcome::Fetched { bytes } => *bytes,
			_ => 0,
		}
	}
}

pub struct AssetFetcher {
	transport: Box<dyn Transport>,
	cloner: Box<dyn RepoCloner>,
	scratch: PathBuf,
	progress: ProgressBar,
}

impl AssetFetcher {
	/// `scratch` holds clones and archives while they are being unpacked
	pub fn new(
		transport: impl Transport + 'static,
		cloner: impl RepoCloner + 'static,
		scratch: impl Into<PathBuf>,
	) -> Self {
		Self {
			transport: Box::new(transport),
			cloner: Box::new(cloner),
			scratch: scratch.into(),
			progress: download_bar(),
		}
	}

	/// HTTP transport plus the system `git`
	pub fn standard(scratch: impl Into<PathBuf>) -> Result<Self> {
		Ok(Self::new(HttpTransport::new()?, GitCli::default(), scratch))
	}

	/// Hides the download progress bar
	pub fn quiet(mut self) -> Self {
		self.progress = ProgressBar::hidden();
		self
	}

	pub fn scratch_dir(&self) -> &Path {
		&self.scratch
	}

	/// Makes sure `dest` exists, fetching `asset` if it does not.
	///
	/// Never returns an error: failures are logged and reported as
	/// [`FetchOutcome::FetchFailed`] with `dest` left absent.
	pub fn ensure(&self, asset: &Asset, dest: &Path) -> FetchOutcome {
		if is_present(dest) {
			ui::debug(&format!("Already present: {}", dest.display()));
			return FetchOutcome::AlreadyPresent;
		}

		let result = match asset {
			Asset::File { url } => self.fetch_file(url, dest),
			Asset::RepoSubdir { url, branch, subdir } => self.fetch_repo_subdir(url, branch, subdir, dest),
			Asset::Archive { url } => self.fetch_archive(url, dest),
		};

		match result {
			Ok(bytes) => {
				ui::debug(&format!("Fetched {} bytes into {}", bytes, dest.display()));
				FetchOutcome::Fetched { bytes }
			}
			Err(e) => {
				let reason = format!("{:#}", e);
				ui::error(&format!("Failed to fetch {}: {}", dest.display(), reason));
				FetchOutcome::FetchFailed(reason)
			}
		}
	}

	fn fetch_file(&self, url: &str, dest: &Path) -> Result<u64> {
		if let Some(parent) = dest.parent() {
			fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
		}

		let partial = partial_path(dest);
		let written = self.download_to(url, &partial);
		match written {
			Ok(bytes) => {
				if let Err(e) = fs::rename(&partial, dest) {
					let _ = fs::remove_file(&partial);
					return Err(e).with_context(|| format!("Failed to move download into {}", dest.display()));
				}
				Ok(bytes)
			}
			Err(e) => {
				let _ = fs::remove_file(&partial);
				Err(e)
			}
		}
	}

	fn download_to(&self, url: &str, path: &Path) -> Result<u64> {
		ui::debug(&format!("GET {}", url));
		let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
		let mut writer = BufWriter::new(file);

		let bar = &self.progress;
		bar.reset();
		let mut report = |done: u64, total: Option<u64>| {
			if let Some(total) = total {
				bar.set_length(total);
			}
			bar.set_position(done);
			bar.set_message(ui::progress_line(done, total));
		};

		let result = self
			.transport
			.download(url, &mut writer, &mut report)
			.and_then(|bytes| {
				writer.flush().context("Failed to flush download")?;
				Ok(bytes)
			});

		match &result {
			Ok(_) => bar.finish_with_message("Download complete!"),
			Err(_) => bar.abandon(),
		}
		result
	}

	fn fetch_repo_subdir(&self, url: &str, branch: &str, subdir: &str, dest: &Path) -> Result<u64> {
		let clone_dir = self.scratch.join(git::repo_dir_name(url));

		// Leftovers from an interrupted run
		if clone_dir.exists() {
			ui::debug(&format!("Removing stale clone: {}", clone_dir.display()));
			fs::remove_dir_all(&clone_dir)
				.with_context(|| format!("Failed to remove stale clone {}", clone_dir.display()))?;
		}
		if dest.exists() {
			let _ = fs::remove_dir_all(dest);
		}

		fs::create_dir_all(&self.scratch)
			.with_context(|| format!("Failed to create {}", self.scratch.display()))?;

		let copied = self
			.cloner
			.clone_branch(url, branch, &clone_dir)
			.with_context(|| format!("Failed to clone {} ({})", url, branch))
			.and_then(|_| {
				let source = clone_dir.join(subdir);
				if !source.is_dir() {
					bail!("{} not found in {}", subdir, url);
				}
				copy_tree(&source, dest)
			});

		if clone_dir.exists() {
			if let Err(e) = fs::remove_dir_all(&clone_dir) {
				ui::warn(&format!("Failed to remove clone {}: {}", clone_dir.display(), e));
			}
		}
		if copied.is_err() && dest.exists() {
			let _ = fs::remove_dir_all(dest);
		}

		copied
	}

	fn fetch_archive(&self, url: &str, dest: &Path) -> Result<u64> {
		fs::create_dir_all(&self.scratch)
			.with_context(|| format!("Failed to create {}", self.scratch.display()))?;

		let name = url.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("download.zip");
		let archive_path = self.scratch.join(name);

		let result = self.fetch_file(url, &archive_path).and_then(|bytes| {
			let files = archive::extract_zip(&archive_path, dest)?;
			ui::debug(&format!("Extracted {} files into {}", files, dest.display()));
			Ok(bytes)
		});

		let _ = fs::remove_file(&archive_path);
		if result.is_err() && dest.exists() {
			let _ = fs::remove_dir_all(dest);
		}

		result
	}
}

/// Byte progress bar whose message carries the percentage line
fn download_bar() -> ProgressBar {
	let bar = ProgressBar::new(0);
	bar.set_style(
		ProgressStyle::default_bar()
			.template("{spinner:.green} {msg} [{bar:30.cyan/blue}] {binary_bytes_per_sec}")
			.unwrap_or_else(|_| ProgressStyle::default_bar())
			.progress_chars("=>-"),
	);
	bar
}

/// `<dest>.part`, next to the final file so the rename stays on one filesystem
fn partial_path(dest: &Path) -> PathBuf {
	let mut name: OsString = dest.file_name().map(OsString::from).unwrap_or_default();
	name.push(".part");
	dest.with_file_name(name)
}

/// Recursively copies `src` into `dst`, returning the bytes copied
fn copy_tree(src: &Path, dst: &Path) -> Result<u64> {
	let mut bytes = 0;
	for entry in WalkDir::new(src) {
		let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
		let relative = entry.path().strip_prefix(src)?;
		let target = dst.join(relative);

		if entry.file_type().is_dir() {
			fs::create_dir_all(&target).with_context(|| format!("Failed to create {}", target.display()))?;
		} else {
			bytes += fs::copy(entry.path(), &target)
				.with_context(|| format!("Failed to copy {}", entry.path().display()))?;
		}
	}
	Ok(bytes)
}
