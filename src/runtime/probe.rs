//! Hardware probing strategies
//!
//! [`OrtProbe`] asks ONNX Runtime which execution providers are usable on this
//! machine. [`SimulatedHardware`] answers from a fixed description so callers
//! can exercise device selection without the hardware present.

use std::process::Command;

use super::device::GIB;

/// Source of truth for which compute backends exist
pub trait DeviceProbe: Send + Sync {
	fn cuda_available(&self) -> bool;

	fn coreml_available(&self) -> bool;

	fn xnnpack_available(&self) -> bool {
		false
	}

	/// Total memory of a CUDA device in bytes, when it can be determined
	fn cuda_total_memory(&self, ordinal: u32) -> Option<u64>;
}

/// Probes execution providers through ONNX Runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct OrtProbe;

fn ep_available<E: ort::ep::ExecutionProvider>(provider: &E, name: &str) -> bool {
	match provider.is_available() {
		Ok(true) => {
			crate::ui::debug(&format!("{} available", name));
			true
		}
		Ok(false) => {
			crate::ui::debug(&format!("{} not available", name));
			false
		}
		Err(e) => {
			crate::ui::debug(&format!("{} probe failed: {}", name, e));
			false
		}
	}
}

impl DeviceProbe for OrtProbe {
	fn cuda_available(&self) -> bool {
		ep_available(&ort::ep::CUDA::default(), "CUDA")
	}

	fn coreml_available(&self) -> bool {
		#[cfg(target_os = "macos")]
		{
			ep_available(&ort::ep::CoreML::default(), "CoreML")
		}
		#[cfg(not(target_os = "macos"))]
		{
			false
		}
	}

	fn xnnpack_available(&self) -> bool {
		ep_available(&ort::ep::XNNPACK::default(), "XNNPACK")
	}

	fn cuda_total_memory(&self, ordinal: u32) -> Option<u64> {
		let output = Command::new("nvidia-smi")
			.args([
				"--query-gpu=memory.total",
				"--format=csv,noheader,nounits",
				"-i",
				&ordinal.to_string(),
			])
			.output()
			.ok()?;

		if !output.status.success() {
			crate::ui::debug("nvidia-smi did not report device memory");
			return None;
		}

		parse_mib(&String::from_utf8_lossy(&output.stdout))
	}
}

/// Parses the first line of `nvidia-smi` memory output (MiB) into bytes
pub(crate) fn parse_mib(stdout: &str) -> Option<u64> {
	let mib: u64 = stdout.lines().next()?.trim().parse().ok()?;
	Some(mib * 1024 * 1024)
}

/// Fixed hardware description for tests and dry runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatedHardware {
	/// A CUDA device with the given total memory
	Cuda { total_memory: u64 },
	/// An Apple CoreML accelerator, no CUDA
	CoreMl,
	/// No accelerator at all
	CpuOnly,
}

impl SimulatedHardware {
	pub fn cuda_gib(gib: u64) -> Self {
		Self::Cuda { total_memory: gib * GIB }
	}
}

impl DeviceProbe for SimulatedHardware {
	fn cuda_available(&self) -> bool {
		matches!(self, Self::Cuda { .. })
	}

	fn coreml_available(&self) -> bool {
		matches!(self, Self::CoreMl)
	}

	fn cuda_total_memory(&self, _ordinal: u32) -> Option<u64> {
		match self {
			Self::Cuda { total_memory } => Some(*total_memory),
			_ => None,
		}
	}
}
