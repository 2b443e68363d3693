//! On-disk resource store.
//!
//! Each key is stored in its own file inside the store directory. File names are derived
//! from the key and percent-encode all bytes except ASCII alphanumerics and `.`, `_`, `-`, `,`
//! as `"%xx"`, which keeps paths portable across platforms and filesystems.

use super::ResourceStore;
use crate::{Blob, ResourceKey};
use anyhow::{Context, Result};
use std::{
	fs::{create_dir_all, remove_dir_all},
	path::{Path, PathBuf},
};

#[derive(Debug)]
pub struct DiskStore {
	path: PathBuf,
}

impl DiskStore {
	/// Opens the store rooted at `path`, creating the directory if needed.
	pub fn new(path: &Path) -> Result<Self> {
		create_dir_all(path).with_context(|| format!("creating store directory '{}'", path.display()))?;
		log::debug!("opened disk store at '{}'", path.display());
		Ok(Self {
			path: path.to_path_buf(),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn entry_path(&self, key: &ResourceKey) -> PathBuf {
		let name = key
			.as_str()
			.bytes()
			.map(|b| {
				if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'-' || b == b',' {
					(b as char).to_string()
				} else {
					format!("%{b:02x}")
				}
			})
			.collect::<String>();
		self.path.join(format!("{name}.bin"))
	}
}

impl ResourceStore for DiskStore {
	fn get(&self, key: &ResourceKey) -> Result<Option<Blob>> {
		let entry_path = self.entry_path(key);
		if !entry_path.exists() {
			return Ok(None);
		}
		let blob = Blob::load_from_file(&entry_path).with_context(|| format!("reading store entry for '{key}'"))?;
		Ok(Some(blob))
	}

	fn set(&self, key: &ResourceKey, content: &Blob) -> Result<()> {
		content
			.save_to_file(&self.entry_path(key))
			.with_context(|| format!("writing store entry for '{key}'"))
	}

	fn clear(&self) -> Result<()> {
		if self.path.exists() {
			remove_dir_all(&self.path).with_context(|| format!("removing '{}'", self.path.display()))?;
		}
		create_dir_all(&self.path).with_context(|| format!("recreating '{}'", self.path.display()))?;
		log::info!("cleared disk store at '{}'", self.path.display());
		Ok(())
	}
}
