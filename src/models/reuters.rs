//! Reuters text-categorisation package
//!
//! The package is a spaCy-format folder. It is loaded as a descriptor: the
//! parsed `meta.json` plus the location of each pipeline component.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::PACKAGE_META;

#[derive(Debug, Clone, Deserialize)]
pub struct PackageMeta {
	pub lang: String,
	pub name: String,
	pub version: String,
	#[serde(default)]
	pub pipeline: Vec<String>,
	#[serde(default)]
	pub labels: BTreeMap<String, Vec<String>>,
	#[serde(default)]
	pub spacy_version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReutersPackage {
	root: PathBuf,
	meta: PackageMeta,
}

impl ReutersPackage {
	pub fn load(root: &Path) -> Result<Self> {
		let meta_path = root.join(PACKAGE_META);
		let raw = std::fs::read_to_string(&meta_path)
			.with_context(|| format!("Reuters package is missing {}", meta_path.display()))?;
		let meta: PackageMeta =
			serde_json::from_str(&raw).with_context(|| format!("Malformed {}", meta_path.display()))?;

		for component in &meta.pipeline {
			if !root.join(component).exists() {
				crate::ui::debug(&format!("Component folder absent: {}", component));
			}
		}

		Ok(Self {
			root: root.to_path_buf(),
			meta,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn meta(&self) -> &PackageMeta {
		&self.meta
	}

	/// Labels of the text categoriser components
	pub fn categories(&self) -> Vec<String> {
		self.meta
			.labels
			.iter()
			.filter(|(component, _)| component.starts_with("textcat"))
			.flat_map(|(_, labels)| labels.iter().cloned())
			.collect()
	}

	pub fn component_dir(&self, component: &str) -> Option<PathBuf> {
		let dir = self.root.join(component);
		dir.is_dir().then_some(dir)
	}
}
