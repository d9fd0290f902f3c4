//! Punkt sentence tokenizer data

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct PunktData {
	root: PathBuf,
	languages: Vec<String>,
}

impl PunktData {
	/// Indexes the per-language `*.pickle` models under `root`
	pub fn load(root: &Path) -> Result<Self> {
		if !root.is_dir() {
			anyhow::bail!("Punkt data not found: {}", root.display());
		}

		let mut languages: Vec<String> = WalkDir::new(root)
			.into_iter()
			.filter_map(|e| e.ok())
			.filter(|e| e.file_type().is_file())
			.filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("pickle"))
			.filter_map(|e| e.path().file_stem().and_then(|s| s.to_str()).map(str::to_string))
			.collect();
		languages.sort();
		languages.dedup();

		if languages.is_empty() {
			anyhow::bail!("No Punkt models in {}", root.display());
		}

		Ok(Self {
			root: root.to_path_buf(),
			languages,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn languages(&self) -> &[String] {
		&self.languages
	}

	/// Model file for `language`, preferring the `PY3/` variant
	pub fn model_path(&self, language: &str) -> Option<PathBuf> {
		let file = format!("{}.pickle", language);
		[self.root.join("PY3").join(&file), self.root.join(&file)]
			.into_iter()
			.find(|p| p.is_file())
	}
}
