//! Download command - pre-populate every model asset

use anyhow::Result;
use std::fs;
use std::time::Instant;

use crate::core::Home;
use crate::fetch::FetchOutcome;
use crate::models::{ModelCache, ModelKey};
use crate::ui;

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
	/// Delete the models folder first
	pub remove_existing: bool,
	/// Fetch files only, skip loading them into memory
	pub assets_only: bool,
}

#[derive(Debug, Default)]
pub struct DownloadReport {
	pub steps: Vec<(ModelKey, Vec<FetchOutcome>)>,
}

impl DownloadReport {
	pub fn bytes(&self) -> u64 {
		self.steps
			.iter()
			.flat_map(|(_, outcomes)| outcomes.iter())
			.map(FetchOutcome::bytes)
			.sum()
	}

	pub fn fetched(&self) -> usize {
		self.steps
			.iter()
			.flat_map(|(_, outcomes)| outcomes.iter())
			.filter(|o| matches!(o, FetchOutcome::Fetched { .. }))
			.count()
	}
}

/// Steps run by [`download_all_models`], in order
pub const STEPS: [ModelKey; 3] = [ModelKey::MiniLm, ModelKey::MultilabelClassifier, ModelKey::Punkt];

/// Fetches (and by default loads) every model the extraction pipeline uses.
///
/// Stops at the first failing step; completed steps stay on disk and a rerun
/// picks up where this one stopped.
pub fn download_all_models(cache: &ModelCache, options: DownloadOptions) -> Result<DownloadReport> {
	if options.remove_existing {
		ui::info("Removing existing models...");
		remove_existing(cache.home());
		cache.clear();
		ui::info("Existing models removed");
	}
	cache.home().ensure()?;

	let mut report = DownloadReport::default();
	for key in STEPS {
		ui::info(&format!("Downloading {}...", step_label(key)));
		let (resolved, outcomes) = cache.prefetch(key)?;

		if !options.assets_only {
			load(cache, key)?;
		}

		report.steps.push((resolved, outcomes));
	}

	Ok(report)
}

fn step_label(key: ModelKey) -> &'static str {
	match key {
		ModelKey::MiniLm => "ONNX embedding model",
		ModelKey::MultilabelClassifier => "text classifier",
		ModelKey::Punkt => "Punkt tokenizer data",
		ModelKey::BgeSmall => "BGE embedding model",
		ModelKey::BertBase => "BERT base model",
		ModelKey::NytTopic => "news topic classifier",
		ModelKey::Reuters => "Reuters package",
	}
}

fn load(cache: &ModelCache, key: ModelKey) -> Result<()> {
	match key {
		ModelKey::MiniLm => {
			cache.load_onnx_all_minilm_l6_v2()?;
		}
		ModelKey::BgeSmall => {
			cache.load_bge_small_en_v1_5()?;
		}
		ModelKey::BertBase => {
			cache.load_bert_base_uncased()?;
		}
		ModelKey::NytTopic => {
			let (_, device) = cache.load_text_classifier()?;
			ui::info(&format!("News topic classifier loaded on {}", device));
		}
		ModelKey::MultilabelClassifier => {
			let (classifier, device) = cache.load_text_multilabel_classifier()?;
			ui::info(&format!("Text classifier ({}) loaded on {}", classifier.backend(), device));
		}
		ModelKey::Punkt => {
			cache.load_nltk_punkt()?;
		}
		ModelKey::Reuters => {
			cache.load_reuters_model()?;
		}
	}
	Ok(())
}

/// Best-effort removal of the models folder
fn remove_existing(home: &Home) {
	for dir in [home.model_dir(ModelKey::Reuters.dir()), home.models_dir()] {
		if dir.exists() {
			match fs::remove_dir_all(&dir) {
				Ok(()) => ui::debug(&format!("Deleted: {}", dir.display())),
				Err(e) => ui::warn(&format!("Could not delete {}: {}", dir.display(), e)),
			}
		}
	}
}

/// CLI entry point
pub fn run(cache: &ModelCache, options: DownloadOptions) -> Result<()> {
	let start = Instant::now();

	ui::header("crawlkit model downloader");
	ui::debug(&format!("Home: {}", cache.home().root().display()));

	let report = download_all_models(cache, options)?;

	println!();
	ui::success(&format!(
		"All models downloaded ({} files, {:.1} MB) in {:.1}s",
		report.fetched(),
		report.bytes() as f64 / (1024.0 * 1024.0),
		start.elapsed().as_secs_f32()
	));

	Ok(())
}
