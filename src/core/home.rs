//! Home directory layout (`~/.crawlkit/{cache,models}`)

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{CACHE_DIR, MODELS_DIR};

#[derive(Debug, Clone)]
pub struct Home {
	root: PathBuf,
}

impl Home {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Creates the root, `cache/` and `models/`. Safe to call repeatedly.
	pub fn ensure(&self) -> Result<&Path> {
		for dir in [self.root.clone(), self.cache_dir(), self.models_dir()] {
			fs::create_dir_all(&dir)
				.with_context(|| format!("Failed to create {}", dir.display()))?;
		}
		Ok(&self.root)
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn cache_dir(&self) -> PathBuf {
		self.root.join(CACHE_DIR)
	}

	pub fn models_dir(&self) -> PathBuf {
		self.root.join(MODELS_DIR)
	}

	/// `models/<name>`
	pub fn model_dir(&self, name: &str) -> PathBuf {
		self.models_dir().join(name)
	}
}

/// Existence check used as the cache-hit signal: a file, or a non-empty directory
pub fn is_present(path: &Path) -> bool {
	if path.is_dir() {
		fs::read_dir(path)
			.map(|mut entries| entries.next().is_some())
			.unwrap_or(false)
	} else {
		path.is_file()
	}
}
