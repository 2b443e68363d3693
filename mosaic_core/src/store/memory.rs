use super::ResourceStore;
use crate::{Blob, ResourceKey};
use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Process-local store, forgotten when the process ends.
#[derive(Debug, Default)]
pub struct MemoryStore {
	data: Mutex<HashMap<ResourceKey, Blob>>,
}

impl MemoryStore {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.data.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.data.lock().is_empty()
	}
}

impl ResourceStore for MemoryStore {
	fn get(&self, key: &ResourceKey) -> Result<Option<Blob>> {
		Ok(self.data.lock().get(key).cloned())
	}

	fn set(&self, key: &ResourceKey, content: &Blob) -> Result<()> {
		self.data.lock().insert(key.clone(), content.clone());
		Ok(())
	}

	fn clear(&self) -> Result<()> {
		self.data.lock().clear();
		Ok(())
	}
}
