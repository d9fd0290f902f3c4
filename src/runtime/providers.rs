//! Session creation with the execution provider matching the selected device

use anyhow::{Context, Result};
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::path::Path;

use super::device::Device;
use crate::config::INTRA_THREADS;
use crate::ui;

/// Builds an ONNX Runtime session for `model_path`, placed on `device`
pub fn create_session(model_path: &Path, device: Device) -> Result<Session> {
	let mut builder = Session::builder().context("Failed to create session builder")?;

	if !register_for_device(&mut builder, device) && device != Device::Cpu {
		ui::warn(&format!("{} provider registration failed, running on CPU", device));
	}

	builder
		.with_optimization_level(GraphOptimizationLevel::Level3)
		.map_err(ort::Error::<()>::from)
		.context("Failed to set optimization level")?
		.with_intra_threads(INTRA_THREADS)
		.map_err(ort::Error::<()>::from)
		.context("Failed to set thread count")?
		.commit_from_file(model_path)
		.with_context(|| format!("Failed to load model: {}", model_path.display()))
}

macro_rules! try_provider {
	($builder:expr, $provider:expr, $name:expr) => {{
		use ort::ep::ExecutionProvider;

		ui::debug(&format!("Trying provider: {}", $name));

		let provider = $provider;
		if !provider.is_available().unwrap_or(false) {
			ui::debug(&format!("{} not available", $name));
			false
		} else {
			match provider.register($builder) {
				Ok(_) => {
					ui::debug(&format!("Using {} execution provider", $name));
					true
				}
				Err(e) => {
					ui::debug(&format!("{} registration failed: {}", $name, e));
					false
				}
			}
		}
	}};
}

fn register_for_device(builder: &mut SessionBuilder, device: Device) -> bool {
	match device {
		Device::Cpu => true,
		Device::Cuda { ordinal } => {
			let id = ordinal as i32;
			try_provider!(builder, ort::ep::TensorRT::default().with_device_id(id), "TensorRT")
				|| try_provider!(builder, ort::ep::CUDA::default().with_device_id(id), "CUDA")
		}
		Device::CoreMl => try_coreml(builder),
		Device::Xnnpack => try_provider!(builder, ort::ep::XNNPACK::default(), "XNNPACK"),
	}
}

#[cfg(target_os = "macos")]
fn try_coreml(builder: &mut SessionBuilder) -> bool {
	try_provider!(builder, ort::ep::CoreML::default(), "CoreML")
}

#[cfg(not(target_os = "macos"))]
fn try_coreml(_builder: &mut SessionBuilder) -> bool {
	ui::debug("CoreML only available on macOS");
	false
}
