//! Topic classification: multilabel (sigmoid) and single-label (softmax) heads

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;

use super::embedding::load_tokenizer;
use super::reuters::ReutersPackage;
use crate::config::{CLASSIFIER_MAX_LENGTH, MODEL_CONFIG, NYT_TOPIC_MAX_LENGTH, ONNX_MODEL, TOKENIZER};
use crate::runtime::{create_session, Device};

#[derive(Debug, Deserialize)]
struct ModelConfig {
	#[serde(default)]
	id2label: HashMap<String, String>,
}

/// Session, tokenizer and label set shared by the sequence classifiers
struct SequenceModel {
	session: Mutex<Session>,
	tokenizer: Tokenizer,
	labels: Vec<String>,
	device: Device,
}

impl SequenceModel {
	fn load(dir: &Path, device: Device, max_length: usize) -> Result<Self> {
		let model_path = dir.join(ONNX_MODEL);
		let config_path = dir.join(MODEL_CONFIG);
		if !model_path.exists() {
			anyhow::bail!("Classifier model not found: {}", model_path.display());
		}

		let config = std::fs::read_to_string(&config_path)
			.with_context(|| format!("Failed to read {}", config_path.display()))?;
		let labels = labels_from_config(&config)?;

		let session = create_session(&model_path, device).context("Failed to load classifier")?;
		let tokenizer = load_tokenizer(&dir.join(TOKENIZER), max_length)?;

		Ok(Self {
			session: Mutex::new(session),
			tokenizer,
			labels,
			device,
		})
	}

	/// Row-major `[batch, labels]` logits for `texts`
	fn logits(&self, texts: &[&str]) -> Result<Vec<f32>> {
		let encodings = self
			.tokenizer
			.encode_batch(texts.to_vec(), true)
			.map_err(|e| anyhow::anyhow!("Tokenize: {}", e))?;

		let batch = encodings.len();
		let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);

		let mut input_ids = Vec::with_capacity(batch * seq_len);
		let mut attention_mask = Vec::with_capacity(batch * seq_len);
		for encoding in &encodings {
			input_ids.extend(encoding.get_ids().iter().map(|&x| x as i64));
			attention_mask.extend(encoding.get_attention_mask().iter().map(|&x| x as i64));
		}

		let shape = vec![batch, seq_len];
		let input_ids_val = Value::from_array((shape.clone(), input_ids))?;
		let attention_mask_val = Value::from_array((shape, attention_mask))?;

		let mut session = self.session.lock().map_err(|e| anyhow::anyhow!("Session lock: {}", e))?;
		let outputs = session.run(ort::inputs![
			"input_ids" => input_ids_val,
			"attention_mask" => attention_mask_val,
		])?;

		let logits = outputs.get("logits").context("Model output 'logits' not found")?;
		let (_, data) = logits.try_extract_tensor::<f32>()?;
		Ok(data.to_vec())
	}
}

/// Transformer classifier with independent sigmoid scores per label
pub struct MultilabelClassifier {
	model: SequenceModel,
}

impl MultilabelClassifier {
	/// Loads `model.onnx`, `tokenizer.json` and `config.json` from `dir`
	pub fn load(dir: &Path, device: Device) -> Result<Self> {
		Ok(Self {
			model: SequenceModel::load(dir, device, CLASSIFIER_MAX_LENGTH)?,
		})
	}

	pub fn labels(&self) -> &[String] {
		&self.model.labels
	}

	pub fn device(&self) -> Device {
		self.model.device
	}

	/// Labels scoring at or above `threshold`, per input text
	pub fn classify(&self, texts: &[&str], threshold: f32) -> Result<Vec<Vec<String>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}
		let logits = self.model.logits(texts)?;
		Ok(decode_multilabel(&logits, &self.model.labels, threshold))
	}
}

/// Single-label news topic classifier (softmax, best label wins)
pub struct TextClassifier {
	model: SequenceModel,
}

impl TextClassifier {
	pub fn load(dir: &Path, device: Device) -> Result<Self> {
		Ok(Self {
			model: SequenceModel::load(dir, device, NYT_TOPIC_MAX_LENGTH)?,
		})
	}

	pub fn labels(&self) -> &[String] {
		&self.model.labels
	}

	pub fn device(&self) -> Device {
		self.model.device
	}

	/// Top label and its probability, per input text
	pub fn classify(&self, texts: &[&str]) -> Result<Vec<TopicScore>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}
		let logits = self.model.logits(texts)?;
		Ok(decode_single_label(&logits, &self.model.labels))
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicScore {
	pub label: String,
	pub score: f32,
}

/// Label names ordered by id from a hub `config.json`
fn labels_from_config(json: &str) -> Result<Vec<String>> {
	let config: ModelConfig = serde_json::from_str(json).context("Malformed model config")?;
	if config.id2label.is_empty() {
		anyhow::bail!("Model config has no id2label mapping");
	}

	let mut indexed = Vec::with_capacity(config.id2label.len());
	for (id, label) in config.id2label {
		let id: usize = id.parse().with_context(|| format!("Invalid label id: {}", id))?;
		indexed.push((id, label));
	}
	indexed.sort_by_key(|(id, _)| *id);

	if indexed.iter().enumerate().any(|(i, (id, _))| i != *id) {
		anyhow::bail!("Label ids are not contiguous");
	}

	Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Sigmoid then threshold each row of `logits` (row-major `[batch, labels]`)
fn decode_multilabel(logits: &[f32], labels: &[String], threshold: f32) -> Vec<Vec<String>> {
	if labels.is_empty() {
		return Vec::new();
	}

	logits
		.chunks(labels.len())
		.map(|row| {
			row.iter()
				.zip(labels)
				.filter(|(logit, _)| sigmoid(**logit) >= threshold)
				.map(|(_, label)| label.clone())
				.collect()
		})
		.collect()
}

/// Softmax each row of `logits` and keep the most probable label
fn decode_single_label(logits: &[f32], labels: &[String]) -> Vec<TopicScore> {
	if labels.is_empty() {
		return Vec::new();
	}

	logits
		.chunks(labels.len())
		.filter_map(|row| {
			let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
			let exps: Vec<f32> = row.iter().map(|x| (x - max).exp()).collect();
			let sum: f32 = exps.iter().sum();

			exps.iter()
				.enumerate()
				.max_by(|a, b| a.1.total_cmp(b.1))
				.map(|(i, e)| TopicScore {
					label: labels[i].clone(),
					score: e / sum,
				})
		})
		.collect()
}

fn sigmoid(x: f32) -> f32 {
	1.0 / (1.0 + (-x).exp())
}

/// Topic classifier chosen for the current device
pub enum TopicClassifier {
	/// Transformer model, used on accelerators
	Transformer(MultilabelClassifier),
	/// Reuters package, used on CPU
	Reuters(Arc<ReutersPackage>),
}

impl TopicClassifier {
	pub fn labels(&self) -> Vec<String> {
		match self {
			TopicClassifier::Transformer(model) => model.labels().to_vec(),
			TopicClassifier::Reuters(package) => package.categories(),
		}
	}

	pub fn backend(&self) -> &'static str {
		match self {
			TopicClassifier::Transformer(_) => "transformer",
			TopicClassifier::Reuters(_) => "reuters",
		}
	}
}
