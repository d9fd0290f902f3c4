//! Sentence embedding models (MiniLM, BGE, BERT base) on ONNX Runtime

use anyhow::{Context, Result};
use ndarray::{Array1, ArrayView3};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::core::Embedding;
use crate::runtime::{create_session, Device};

const MAX_SEQUENCE: usize = 512;

pub struct EmbeddingModel {
	name: &'static str,
	session: Mutex<Session>,
	tokenizer: Tokenizer,
	device: Device,
}

impl EmbeddingModel {
	pub fn load(name: &'static str, model_path: &Path, tokenizer_path: &Path, device: Device) -> Result<Self> {
		if !model_path.exists() {
			anyhow::bail!("Embedding model not found: {}", model_path.display());
		}
		if !tokenizer_path.exists() {
			anyhow::bail!("Tokenizer not found: {}", tokenizer_path.display());
		}

		let session = create_session(model_path, device).with_context(|| format!("Failed to load {}", name))?;
		let tokenizer = load_tokenizer(tokenizer_path, MAX_SEQUENCE)?;

		Ok(Self {
			name,
			session: Mutex::new(session),
			tokenizer,
			device,
		})
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn device(&self) -> Device {
		self.device
	}

	/// Embeds `texts` as one batch; one normalized vector per input
	pub fn embed(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let encodings = self
			.tokenizer
			.encode_batch(texts.to_vec(), true)
			.map_err(|e| anyhow::anyhow!("Tokenize: {}", e))?;

		let batch = encodings.len();
		let seq_len = encodings.first().map(|e| e.len()).unwrap_or(0);

		let mut input_ids = Vec::with_capacity(batch * seq_len);
		let mut attention_mask = Vec::with_capacity(batch * seq_len);
		let mut token_type_ids = Vec::with_capacity(batch * seq_len);
		for encoding in &encodings {
			input_ids.extend(encoding.get_ids().iter().map(|&x| x as i64));
			attention_mask.extend(encoding.get_attention_mask().iter().map(|&x| x as i64));
			token_type_ids.extend(encoding.get_type_ids().iter().map(|&x| x as i64));
		}

		let shape = vec![batch, seq_len];
		let input_ids_val = Value::from_array((shape.clone(), input_ids))?;
		let attention_mask_val = Value::from_array((shape.clone(), attention_mask.clone()))?;
		let token_type_ids_val = Value::from_array((shape, token_type_ids))?;

		let mut session = self.session.lock().map_err(|e| anyhow::anyhow!("Session lock: {}", e))?;
		let outputs = session.run(ort::inputs![
			"input_ids" => input_ids_val,
			"attention_mask" => attention_mask_val,
			"token_type_ids" => token_type_ids_val,
		])?;

		let output = outputs
			.get("last_hidden_state")
			.or_else(|| outputs.get("sentence_embedding"))
			.context("Model output not found")?;

		let (shape, data) = output.try_extract_tensor::<f32>()?;
		let dims: Vec<usize> = shape.iter().map(|&x| x as usize).collect();

		let rows = sentence_rows(&dims, data, &attention_mask)?;
		Ok(rows.into_iter().map(Embedding::new).collect())
	}
}

/// One vector per sentence from either token states `[b, s, h]` (mean pooled)
/// or ready-made sentence embeddings `[b, h]`
fn sentence_rows(dims: &[usize], data: &[f32], mask: &[i64]) -> Result<Vec<Vec<f32>>> {
	match dims {
		[_, _, 0] | [_, 0] => anyhow::bail!("Model returned zero-width embeddings: {:?}", dims),
		[b, s, h] => {
			let hidden = ArrayView3::from_shape((*b, *s, *h), data)?;
			Ok(mean_pool(hidden, mask))
		}
		[_, h] => Ok(data.chunks(*h).map(|row| row.to_vec()).collect()),
		_ => anyhow::bail!("Unexpected output shape: {:?}", dims),
	}
}

pub(crate) fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer> {
	let mut tokenizer = Tokenizer::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
	tokenizer.with_padding(Some(PaddingParams::default()));
	tokenizer
		.with_truncation(Some(TruncationParams {
			max_length,
			..Default::default()
		}))
		.map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
	Ok(tokenizer)
}

/// Mean pooling over tokens whose attention mask is 1.
///
/// `mask` is row-major `[batch, seq]`.
fn mean_pool(hidden: ArrayView3<f32>, mask: &[i64]) -> Vec<Vec<f32>> {
	let (_, seq_len, hidden_size) = hidden.dim();

	hidden
		.outer_iter()
		.enumerate()
		.map(|(i, row)| {
			let mut sum = Array1::<f32>::zeros(hidden_size);
			let mut count = 0.0f32;
			for (j, token) in row.outer_iter().enumerate() {
				if mask.get(i * seq_len + j).copied().unwrap_or(0) == 1 {
					sum += &token;
					count += 1.0;
				}
			}
			if count > 0.0 {
				sum.mapv_inplace(|v| v / count);
			}
			sum.to_vec()
		})
		.collect()
}
