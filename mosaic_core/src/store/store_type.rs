//! Selection of the resource store used by a session.
//!
//! The default disk store directory can be controlled with the environment variable
//! `MOSAIC_CACHE_DIR`. If unset, `mosaic_cache` inside the system temporary folder is used,
//! so consecutive runs share their fetched resources.

use super::{DiskStore, MemoryStore, ResourceStore};
use anyhow::Result;
use std::{path::PathBuf, sync::Arc, sync::LazyLock};

pub static DEFAULT_STORE_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
	std::env::var("MOSAIC_CACHE_DIR").map_or_else(|_| std::env::temp_dir().join("mosaic_cache"), PathBuf::from)
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreType {
	/// Keep resources for the lifetime of the process only.
	InMemory,
	/// Keep resources as files in the given directory.
	Disk(PathBuf),
}

impl StoreType {
	#[must_use]
	pub fn new_disk() -> Self {
		Self::Disk(DEFAULT_STORE_DIR.to_path_buf())
	}

	#[must_use]
	pub fn new_memory() -> Self {
		Self::InMemory
	}

	/// Opens the store this variant describes.
	pub fn open(&self) -> Result<Arc<dyn ResourceStore>> {
		Ok(match self {
			StoreType::InMemory => Arc::new(MemoryStore::new()),
			StoreType::Disk(path) => Arc::new(DiskStore::new(path)?),
		})
	}
}

impl Default for StoreType {
	fn default() -> Self {
		Self::new_memory()
	}
}
