//! Single-flight memo cell

use anyhow::Result;
use std::sync::{Arc, Mutex, PoisonError};

/// Holds at most one value, built at most once at a time.
///
/// The lock is held for the whole of `init`, so callers racing on an empty
/// slot wait for the first load and share its result. A failed load leaves
/// the slot empty.
pub struct Slot<T> {
	value: Mutex<Option<Arc<T>>>,
}

impl<T> Slot<T> {
	pub const fn new() -> Self {
		Self { value: Mutex::new(None) }
	}

	pub fn get_or_try_init(&self, init: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
		let mut guard = self.value.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(value) = guard.as_ref() {
			return Ok(Arc::clone(value));
		}

		let value = Arc::new(init()?);
		*guard = Some(Arc::clone(&value));
		Ok(value)
	}

	pub fn get(&self) -> Option<Arc<T>> {
		self.value.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}

	pub fn is_loaded(&self) -> bool {
		self.value.lock().unwrap_or_else(PoisonError::into_inner).is_some()
	}

	pub fn clear(&self) {
		*self.value.lock().unwrap_or_else(PoisonError::into_inner) = None;
	}
}

impl<T> Default for Slot<T> {
	fn default() -> Self {
		Self::new()
	}
}
