//! Named models and the assets each one needs

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{
	hub_url, HubSource, Settings, BERT_DIR, BERT_REPO, BGE_DIR, BGE_REPO, CLASSIFIER_DIR, CLASSIFIER_ONNX, MINILM_DIR,
	MINILM_TOKENIZER_REPO, MINILM_URL, MODEL_CONFIG, NYT_TOPIC_DIR, ONNX_MODEL, PUNKT_DIR, PUNKT_URL, REUTERS_DIR,
	REUTERS_REPO_SUBDIR, REUTERS_REPO_URL, TOKENIZER,
};
use crate::fetch::Asset;

/// Cache key of a named model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKey {
	/// all-MiniLM-L6-v2, single ONNX binary
	MiniLm,
	/// BAAI bge-small-en-v1.5
	BgeSmall,
	/// bert-base-uncased encoder
	BertBase,
	/// Multilabel topic classifier (accelerator devices)
	MultilabelClassifier,
	/// Single-label NYT news topic classifier
	NytTopic,
	/// Punkt sentence tokenizer data
	Punkt,
	/// Reuters text-categorisation package
	Reuters,
}

impl ModelKey {
	pub const ALL: [ModelKey; 7] = [
		ModelKey::MiniLm,
		ModelKey::BgeSmall,
		ModelKey::BertBase,
		ModelKey::MultilabelClassifier,
		ModelKey::NytTopic,
		ModelKey::Punkt,
		ModelKey::Reuters,
	];

	pub fn name(&self) -> &'static str {
		match self {
			ModelKey::MiniLm => "all-MiniLM-L6-v2",
			ModelKey::BgeSmall => "bge-small-en-v1.5",
			ModelKey::BertBase => "bert-base-uncased",
			ModelKey::MultilabelClassifier => "tweet-topic-21-multi",
			ModelKey::NytTopic => "roberta-base_topic_classification_nyt_news",
			ModelKey::Punkt => "punkt",
			ModelKey::Reuters => "reuters",
		}
	}

	/// Folder under `models/`
	pub fn dir(&self) -> &'static str {
		match self {
			ModelKey::MiniLm => MINILM_DIR,
			ModelKey::BgeSmall => BGE_DIR,
			ModelKey::BertBase => BERT_DIR,
			ModelKey::MultilabelClassifier => CLASSIFIER_DIR,
			ModelKey::NytTopic => NYT_TOPIC_DIR,
			ModelKey::Punkt => PUNKT_DIR,
			ModelKey::Reuters => REUTERS_DIR,
		}
	}
}

impl fmt::Display for ModelKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// One asset and where it lives, relative to `models/`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredAsset {
	pub asset: Asset,
	pub relative: PathBuf,
}

impl RequiredAsset {
	fn new(asset: Asset, relative: PathBuf) -> Self {
		Self { asset, relative }
	}
}

/// ONNX export, tokenizer and label config of a hub-hosted sequence classifier
fn classifier_assets(source: &HubSource, dir: &Path) -> Vec<RequiredAsset> {
	vec![
		RequiredAsset::new(Asset::file(source.url(CLASSIFIER_ONNX)), dir.join(ONNX_MODEL)),
		RequiredAsset::new(Asset::file(source.url(TOKENIZER)), dir.join(TOKENIZER)),
		RequiredAsset::new(Asset::file(source.url(MODEL_CONFIG)), dir.join(MODEL_CONFIG)),
	]
}

/// Assets `key` needs on disk before it can load. Repository branch and
/// classifier sources come from `settings`.
pub fn required_assets(key: ModelKey, settings: &Settings) -> Vec<RequiredAsset> {
	let dir = PathBuf::from(key.dir());
	match key {
		ModelKey::MiniLm => vec![
			RequiredAsset::new(Asset::file(MINILM_URL), dir.join(ONNX_MODEL)),
			RequiredAsset::new(Asset::file(hub_url(MINILM_TOKENIZER_REPO, TOKENIZER)), dir.join(TOKENIZER)),
		],
		ModelKey::BgeSmall => vec![
			RequiredAsset::new(Asset::file(hub_url(BGE_REPO, "onnx/model.onnx")), dir.join(ONNX_MODEL)),
			RequiredAsset::new(Asset::file(hub_url(BGE_REPO, TOKENIZER)), dir.join(TOKENIZER)),
		],
		ModelKey::BertBase => vec![
			RequiredAsset::new(Asset::file(hub_url(BERT_REPO, ONNX_MODEL)), dir.join(ONNX_MODEL)),
			RequiredAsset::new(Asset::file(hub_url(BERT_REPO, TOKENIZER)), dir.join(TOKENIZER)),
		],
		ModelKey::MultilabelClassifier => classifier_assets(&settings.classifier, &dir),
		ModelKey::NytTopic => classifier_assets(&settings.nyt_topic, &dir),
		ModelKey::Punkt => vec![RequiredAsset::new(Asset::archive(PUNKT_URL), dir)],
		ModelKey::Reuters => vec![RequiredAsset::new(
			Asset::repo_subdir(REUTERS_REPO_URL, settings.repo_branch.as_str(), REUTERS_REPO_SUBDIR),
			dir,
		)],
	}
}
