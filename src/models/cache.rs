//! Memoized model loading
//!
//! Each accessor fetches missing assets, builds the handle on the selected
//! device and keeps it for the lifetime of the cache. Loads are single-flight
//! per model.

use anyhow::{Context, Result};
use std::sync::Arc;

use super::catalog::{required_assets, ModelKey};
use super::classifier::{MultilabelClassifier, TextClassifier, TopicClassifier};
use super::embedding::EmbeddingModel;
use super::punkt::PunktData;
use super::reuters::ReutersPackage;
use super::slot::Slot;
use crate::cli::Provider;
use crate::config::{Settings, ONNX_MODEL, TOKENIZER};
use crate::core::{is_present, Home};
use crate::fetch::{AssetFetcher, FetchOutcome};
use crate::runtime::{Device, DeviceSelector};
use crate::ui;

pub struct ModelCache {
	settings: Settings,
	home: Home,
	devices: Arc<DeviceSelector>,
	fetcher: AssetFetcher,
	minilm: Slot<EmbeddingModel>,
	bge: Slot<EmbeddingModel>,
	bert: Slot<EmbeddingModel>,
	classifier: Slot<TopicClassifier>,
	nyt_topic: Slot<TextClassifier>,
	punkt: Slot<PunktData>,
	reuters: Slot<ReutersPackage>,
}

impl ModelCache {
	pub fn new(settings: Settings, devices: Arc<DeviceSelector>, fetcher: AssetFetcher) -> Self {
		let home = Home::new(settings.home.clone());
		Self {
			settings,
			home,
			devices,
			fetcher,
			minilm: Slot::new(),
			bge: Slot::new(),
			bert: Slot::new(),
			classifier: Slot::new(),
			nyt_topic: Slot::new(),
			punkt: Slot::new(),
			reuters: Slot::new(),
		}
	}

	/// Real hardware probing, HTTP downloads and the system `git`
	pub fn standard(settings: Settings, provider: Provider) -> Result<Self> {
		let home = Home::new(settings.home.clone());
		let fetcher = AssetFetcher::standard(home.cache_dir())?;
		let devices = Arc::new(DeviceSelector::detect(provider));
		Ok(Self::new(settings, devices, fetcher))
	}

	pub fn home(&self) -> &Home {
		&self.home
	}

	pub fn settings(&self) -> &Settings {
		&self.settings
	}

	pub fn devices(&self) -> &DeviceSelector {
		&self.devices
	}

	pub fn device(&self) -> Device {
		self.devices.get_device()
	}

	/// Recommended batch size on the selected device
	pub fn batch_size(&self) -> usize {
		self.devices.calculate_batch_size(self.device())
	}

	/// Model that actually backs `key` on this device. The multilabel
	/// classifier is replaced by the Reuters package off-accelerator.
	pub fn resolve(&self, key: ModelKey) -> ModelKey {
		match key {
			ModelKey::MultilabelClassifier if !self.device().is_accelerator() => ModelKey::Reuters,
			other => other,
		}
	}

	/// Whether every asset of `key` is already on disk
	pub fn is_cached(&self, key: ModelKey) -> bool {
		required_assets(key, &self.settings)
			.iter()
			.all(|required| is_present(&self.home.models_dir().join(&required.relative)))
	}

	pub fn is_loaded(&self, key: ModelKey) -> bool {
		match key {
			ModelKey::MiniLm => self.minilm.is_loaded(),
			ModelKey::BgeSmall => self.bge.is_loaded(),
			ModelKey::BertBase => self.bert.is_loaded(),
			ModelKey::MultilabelClassifier => self.classifier.is_loaded(),
			ModelKey::NytTopic => self.nyt_topic.is_loaded(),
			ModelKey::Punkt => self.punkt.is_loaded(),
			ModelKey::Reuters => self.reuters.is_loaded(),
		}
	}

	/// Drops every loaded handle; the next accessor call loads again
	pub fn clear(&self) {
		self.minilm.clear();
		self.bge.clear();
		self.bert.clear();
		self.classifier.clear();
		self.nyt_topic.clear();
		self.punkt.clear();
		self.reuters.clear();
	}

	/// Puts the assets of `key` (as resolved for this device) on disk without
	/// loading, returning the model that actually backs `key` and the outcomes.
	///
	/// Fails when any asset could not be fetched. An unreachable transformer
	/// classifier falls back to the Reuters package.
	pub fn prefetch(&self, key: ModelKey) -> Result<(ModelKey, Vec<FetchOutcome>)> {
		let resolved = self.resolve(key);
		match self.require(resolved) {
			Err(e) if resolved == ModelKey::MultilabelClassifier => {
				classifier_fallback_warning(&e);
				Ok((ModelKey::Reuters, self.require(ModelKey::Reuters)?))
			}
			other => other.map(|outcomes| (resolved, outcomes)),
		}
	}

	fn require(&self, key: ModelKey) -> Result<Vec<FetchOutcome>> {
		self.home.ensure()?;

		let models_dir = self.home.models_dir();
		let mut outcomes = Vec::new();
		for required in required_assets(key, &self.settings) {
			let dest = models_dir.join(&required.relative);
			let outcome = self.fetcher.ensure(&required.asset, &dest);
			if let FetchOutcome::FetchFailed(reason) = &outcome {
				anyhow::bail!("{} is unavailable ({}): {}", key, dest.display(), reason);
			}
			outcomes.push(outcome);
		}
		Ok(outcomes)
	}

	pub fn load_onnx_all_minilm_l6_v2(&self) -> Result<Arc<EmbeddingModel>> {
		self.minilm.get_or_try_init(|| self.load_embedding(ModelKey::MiniLm))
	}

	pub fn load_bge_small_en_v1_5(&self) -> Result<Arc<EmbeddingModel>> {
		self.bge.get_or_try_init(|| self.load_embedding(ModelKey::BgeSmall))
	}

	pub fn load_bert_base_uncased(&self) -> Result<Arc<EmbeddingModel>> {
		self.bert.get_or_try_init(|| self.load_embedding(ModelKey::BertBase))
	}

	fn load_embedding(&self, key: ModelKey) -> Result<EmbeddingModel> {
		self.require(key)?;
		let dir = self.home.model_dir(key.dir());
		let device = self.device();

		ui::debug(&format!("Loading {}: {}", key, dir.display()));
		let model = EmbeddingModel::load(key.name(), &dir.join(ONNX_MODEL), &dir.join(TOKENIZER), device)?;
		ui::success(&format!("{} loaded on {}", key, device));
		Ok(model)
	}

	/// Topic classifier and the device it runs on
	pub fn load_text_multilabel_classifier(&self) -> Result<(Arc<TopicClassifier>, Device)> {
		let device = self.device();
		let classifier = self.classifier.get_or_try_init(|| {
			if !device.is_accelerator() {
				ui::debug("No accelerator, using the Reuters package for topics");
				return Ok(TopicClassifier::Reuters(self.load_reuters_model()?));
			}

			let key = ModelKey::MultilabelClassifier;
			if let Err(e) = self.require(key) {
				classifier_fallback_warning(&e);
				return Ok(TopicClassifier::Reuters(self.load_reuters_model()?));
			}
			let dir = self.home.model_dir(key.dir());
			let model = MultilabelClassifier::load(&dir, device)
				.with_context(|| format!("Failed to load {}", key))?;
			ui::success(&format!("{} loaded on {}", key, device));
			Ok(TopicClassifier::Transformer(model))
		})?;
		Ok((classifier, device))
	}

	/// Single-label NYT news topic classifier and the device it runs on
	pub fn load_text_classifier(&self) -> Result<(Arc<TextClassifier>, Device)> {
		let device = self.device();
		let classifier = self.nyt_topic.get_or_try_init(|| {
			let key = ModelKey::NytTopic;
			self.require(key)?;
			let dir = self.home.model_dir(key.dir());
			let model = TextClassifier::load(&dir, device).with_context(|| format!("Failed to load {}", key))?;
			ui::success(&format!("{} loaded on {}", key, device));
			Ok(model)
		})?;
		Ok((classifier, device))
	}

	pub fn load_nltk_punkt(&self) -> Result<Arc<PunktData>> {
		self.punkt.get_or_try_init(|| {
			self.require(ModelKey::Punkt)?;
			let punkt = PunktData::load(&self.home.model_dir(ModelKey::Punkt.dir()))?;
			ui::debug(&format!("Punkt languages: {}", punkt.languages().join(", ")));
			Ok(punkt)
		})
	}

	pub fn load_reuters_model(&self) -> Result<Arc<ReutersPackage>> {
		self.reuters.get_or_try_init(|| {
			self.require(ModelKey::Reuters)?;
			let package = ReutersPackage::load(&self.home.model_dir(ModelKey::Reuters.dir()))?;
			ui::success(&format!("{} package {} loaded", package.meta().name, package.meta().version));
			Ok(package)
		})
	}
}

fn classifier_fallback_warning(err: &anyhow::Error) {
	ui::warn(&format!("{:#}", err));
	ui::warn("Transformer topic classifier unavailable, using the Reuters package");
}
