use crate::{Blob, ResourceKey};
use anyhow::Result;
use std::fmt::Debug;

/// Key-value store that keeps fetched resources, possibly across sessions.
///
/// No transactional guarantees are expected beyond single `get`/`set` calls.
///
/// `get` and `set` are called synchronously from the fetch scheduler task and must be
/// cheap, like a single small file read or write.
pub trait ResourceStore: Debug + Send + Sync {
	fn get(&self, key: &ResourceKey) -> Result<Option<Blob>>;
	fn set(&self, key: &ResourceKey, content: &Blob) -> Result<()>;
	fn clear(&self) -> Result<()>;
}
