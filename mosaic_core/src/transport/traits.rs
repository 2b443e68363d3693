use crate::{Blob, ResourceKey};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Type alias for a shared dynamic implementation of [`Transport`].
pub type SharedTransport = std::sync::Arc<dyn Transport>;

/// Fetches the content of a resource from a remote source.
///
/// The fetch cache issues exactly one call per admitted request, it never calls
/// `fetch` twice for the same key while a call is outstanding.
#[async_trait]
pub trait Transport: Debug + Send + Sync {
	async fn fetch(&self, key: &ResourceKey) -> Result<Blob>;

	/// Gets the name of the resource source, used in log messages.
	fn get_name(&self) -> &str;
}
