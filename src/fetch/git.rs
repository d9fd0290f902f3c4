//! Repository cloning through the `git` executable

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub trait RepoCloner: Send + Sync {
	/// Clones `branch` of `url` into `dest`, which must not exist yet
	fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()>;
}

pub struct GitCli {
	program: PathBuf,
}

impl GitCli {
	pub fn new(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}
}

impl Default for GitCli {
	fn default() -> Self {
		Self::new("git")
	}
}

impl RepoCloner for GitCli {
	fn clone_branch(&self, url: &str, branch: &str, dest: &Path) -> Result<()> {
		crate::ui::debug(&format!("git clone -b {} {} {}", branch, url, dest.display()));

		let output = Command::new(&self.program)
			.args(["clone", "--depth", "1", "-b", branch, url])
			.arg(dest)
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::piped())
			.output()
			.with_context(|| format!("Failed to run {}", self.program.display()))?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			let reason = stderr.lines().last().unwrap_or("no output").trim().to_string();
			bail!("git clone exited with {}: {}", output.status, reason);
		}

		Ok(())
	}
}

/// Folder name a clone of `url` gets, e.g. `crawl4ai` for `.../crawl4ai.git`
pub fn repo_dir_name(url: &str) -> String {
	let last = url.trim_end_matches('/').rsplit('/').next().unwrap_or(url);
	let name = last.strip_suffix(".git").unwrap_or(last);
	if name.is_empty() {
		"repo".to_string()
	} else {
		name.to_string()
	}
}
