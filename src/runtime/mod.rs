//! # Compute Runtime
//!
//! Device selection, capacity heuristics and ONNX Runtime session placement.

pub mod device;
pub mod probe;
pub mod providers;

pub use crate::cli::Provider;
pub use device::{calculate_batch_size, Device, DeviceSelector, GIB};
pub use probe::{DeviceProbe, OrtProbe, SimulatedHardware};
pub use providers::create_session;
