//! Device selection, memory estimation and batch size advice

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock, PoisonError};

use super::probe::{DeviceProbe, OrtProbe, SimulatedHardware};
use crate::cli::Provider;

pub const GIB: u64 = 1024 * 1024 * 1024;

/// CoreML exposes no memory introspection; assume a roomy unified-memory machine
pub const COREML_MEMORY: u64 = 48 * GIB;

pub const CPU_BATCH_SIZE: usize = 16;
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Compute backend a model is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
	Cpu,
	Cuda { ordinal: u32 },
	CoreMl,
	/// CPU-side XNNPACK kernels; no accelerator memory of its own
	Xnnpack,
}

impl Device {
	pub fn is_accelerator(&self) -> bool {
		matches!(self, Device::Cuda { .. } | Device::CoreMl)
	}
}

impl fmt::Display for Device {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Device::Cpu => write!(f, "cpu"),
			Device::Cuda { ordinal } => write!(f, "cuda:{}", ordinal),
			Device::CoreMl => write!(f, "coreml"),
			Device::Xnnpack => write!(f, "xnnpack"),
		}
	}
}

/// Recommended inference batch size for a device with `available_memory` bytes.
///
/// Thresholds are inclusive lower bounds.
pub fn calculate_batch_size(device: Device, available_memory: u64) -> usize {
	match device {
		Device::Cpu => CPU_BATCH_SIZE,
		Device::Cuda { .. } | Device::CoreMl => {
			if available_memory >= 31 * GIB {
				256
			} else if available_memory >= 15 * GIB {
				128
			} else if available_memory >= 8 * GIB {
				64
			} else {
				32
			}
		}
		Device::Xnnpack => DEFAULT_BATCH_SIZE,
	}
}

/// Picks the compute device once and answers capacity questions about it
pub struct DeviceSelector {
	probe: Box<dyn DeviceProbe>,
	preference: Provider,
	device: OnceLock<Device>,
	memory: Mutex<HashMap<Device, u64>>,
}

impl DeviceSelector {
	pub fn new(probe: impl DeviceProbe + 'static, preference: Provider) -> Self {
		Self {
			probe: Box::new(probe),
			preference,
			device: OnceLock::new(),
			memory: Mutex::new(HashMap::new()),
		}
	}

	/// Selector backed by ONNX Runtime's execution provider checks
	pub fn detect(preference: Provider) -> Self {
		Self::new(OrtProbe, preference)
	}

	pub fn simulated(hardware: SimulatedHardware) -> Self {
		Self::new(hardware, Provider::Auto)
	}

	/// The selected device. Probed on first call, identical on every later call.
	pub fn get_device(&self) -> Device {
		*self.device.get_or_init(|| {
			let device = self.probe_device();
			crate::ui::debug(&format!("Selected device: {}", device));
			device
		})
	}

	fn probe_device(&self) -> Device {
		match self.preference {
			Provider::Auto => {
				if self.probe.cuda_available() {
					Device::Cuda { ordinal: 0 }
				} else if self.probe.coreml_available() {
					Device::CoreMl
				} else {
					Device::Cpu
				}
			}
			Provider::Cpu => Device::Cpu,
			Provider::Cuda => {
				if self.probe.cuda_available() {
					Device::Cuda { ordinal: 0 }
				} else {
					crate::ui::error("CUDA requested but unavailable, falling back to CPU");
					Device::Cpu
				}
			}
			Provider::Coreml => {
				if self.probe.coreml_available() {
					Device::CoreMl
				} else {
					crate::ui::error("CoreML requested but unavailable, falling back to CPU");
					Device::Cpu
				}
			}
			Provider::Xnnpack => {
				if self.probe.xnnpack_available() {
					Device::Xnnpack
				} else {
					crate::ui::error("XNNPACK requested but unavailable, falling back to CPU");
					Device::Cpu
				}
			}
		}
	}

	/// Usable memory of `device` in bytes. A heuristic, not current free memory.
	pub fn get_available_memory(&self, device: Device) -> u64 {
		let mut memo = self.memory.lock().unwrap_or_else(PoisonError::into_inner);
		*memo.entry(device).or_insert_with(|| match device {
			Device::Cuda { ordinal } => self.probe.cuda_total_memory(ordinal).unwrap_or(0),
			Device::CoreMl => COREML_MEMORY,
			Device::Cpu | Device::Xnnpack => 0,
		})
	}

	pub fn calculate_batch_size(&self, device: Device) -> usize {
		calculate_batch_size(device, self.get_available_memory(device))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::Arc;

	struct CountingProbe {
		cuda_checks: Arc<AtomicUsize>,
		memory_checks: Arc<AtomicUsize>,
	}

	impl DeviceProbe for CountingProbe {
		fn cuda_available(&self) -> bool {
			self.cuda_checks.fetch_add(1, Ordering::SeqCst);
			true
		}

		fn coreml_available(&self) -> bool {
			false
		}

		fn cuda_total_memory(&self, _ordinal: u32) -> Option<u64> {
			self.memory_checks.fetch_add(1, Ordering::SeqCst);
			Some(12 * GIB)
		}
	}

	#[test]
	fn cpu_always_gets_sixteen() {
		assert_eq!(calculate_batch_size(Device::Cpu, 0), 16);
		assert_eq!(calculate_batch_size(Device::Cpu, 64 * GIB), 16);
	}

	#[test]
	fn thresholds_are_closed_on_lower_bound() {
		let cuda = Device::Cuda { ordinal: 0 };
		assert_eq!(calculate_batch_size(cuda, 31 * GIB), 256);
		assert_eq!(calculate_batch_size(cuda, 31 * GIB - 1), 128);
		assert_eq!(calculate_batch_size(cuda, 15 * GIB), 128);
		assert_eq!(calculate_batch_size(cuda, 15 * GIB - 1), 64);
		assert_eq!(calculate_batch_size(cuda, 8 * GIB), 64);
		assert_eq!(calculate_batch_size(cuda, 8 * GIB - 1), 32);
		assert_eq!(calculate_batch_size(cuda, 0), 32);
	}

	#[test]
	fn coreml_uses_fixed_estimate() {
		let selector = DeviceSelector::simulated(SimulatedHardware::CoreMl);
		assert_eq!(selector.get_device(), Device::CoreMl);
		assert_eq!(selector.get_available_memory(Device::CoreMl), 48 * GIB);
		assert_eq!(selector.calculate_batch_size(Device::CoreMl), 256);
	}

	#[test]
	fn unknown_kind_gets_default() {
		assert_eq!(calculate_batch_size(Device::Xnnpack, 100 * GIB), DEFAULT_BATCH_SIZE);
	}

	#[test]
	fn priority_prefers_cuda() {
		assert_eq!(
			DeviceSelector::simulated(SimulatedHardware::cuda_gib(24)).get_device(),
			Device::Cuda { ordinal: 0 }
		);
		assert_eq!(DeviceSelector::simulated(SimulatedHardware::CpuOnly).get_device(), Device::Cpu);
	}

	#[test]
	fn device_and_memory_are_memoized() {
		let cuda_checks = Arc::new(AtomicUsize::new(0));
		let memory_checks = Arc::new(AtomicUsize::new(0));
		let selector = DeviceSelector::new(
			CountingProbe {
				cuda_checks: cuda_checks.clone(),
				memory_checks: memory_checks.clone(),
			},
			Provider::Auto,
		);

		let first = selector.get_device();
		for _ in 0..5 {
			assert_eq!(selector.get_device(), first);
			assert_eq!(selector.calculate_batch_size(first), 64);
		}

		assert_eq!(cuda_checks.load(Ordering::SeqCst), 1);
		assert_eq!(memory_checks.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn forced_provider_falls_back_to_cpu() {
		let selector = DeviceSelector::new(SimulatedHardware::CpuOnly, Provider::Cuda);
		assert_eq!(selector.get_device(), Device::Cpu);

		let selector = DeviceSelector::new(SimulatedHardware::cuda_gib(8), Provider::Cpu);
		assert_eq!(selector.get_device(), Device::Cpu);
	}

	#[test]
	fn cuda_memory_query_failure_is_zero() {
		struct Silent;
		impl DeviceProbe for Silent {
			fn cuda_available(&self) -> bool {
				true
			}
			fn coreml_available(&self) -> bool {
				false
			}
			fn cuda_total_memory(&self, _ordinal: u32) -> Option<u64> {
				None
			}
		}

		let selector = DeviceSelector::new(Silent, Provider::Auto);
		let device = selector.get_device();
		assert_eq!(selector.get_available_memory(device), 0);
		assert_eq!(selector.calculate_batch_size(device), 32);
	}
}
