//! Builder pattern for constructing [`MosaicSession`] instances

use super::{IncompleteRowPolicy, MosaicSession, SessionConfig};
use crate::{EventBus, ResourceStore, SharedTransport, StoreType, TileSize};
use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builder for customized [`MosaicSession`] instances.
///
/// # Examples
///
/// ```no_run
/// use mosaic_core::{HttpTransport, MosaicSession, TileSize};
/// use std::sync::Arc;
///
/// let transport = Arc::new(HttpTransport::from_str("http://localhost:8765").unwrap());
/// let session = MosaicSession::builder(transport)
///     .with_disk_store()
///     .tile_size(TileSize::new(16, 16))
///     .fetch_limit(4)
///     .build()
///     .unwrap();
/// ```
pub struct SessionBuilder {
	transport: SharedTransport,
	store: Option<Arc<dyn ResourceStore>>,
	store_type: Option<StoreType>,
	config: SessionConfig,
}

impl SessionBuilder {
	pub fn new(transport: SharedTransport) -> Self {
		Self {
			transport,
			store: None,
			store_type: None,
			config: SessionConfig::default(),
		}
	}

	/// Use an already opened store. Takes precedence over [`store_type`](Self::store_type).
	pub fn store(mut self, store: Arc<dyn ResourceStore>) -> Self {
		self.store = Some(store);
		self
	}

	/// Set the store type (InMemory or Disk), opened by [`build`](Self::build).
	pub fn store_type(mut self, store_type: StoreType) -> Self {
		self.store_type = Some(store_type);
		self
	}

	/// Use an in-memory store (default)
	pub fn with_memory_store(self) -> Self {
		self.store_type(StoreType::new_memory())
	}

	/// Use a disk store in the default directory
	pub fn with_disk_store(self) -> Self {
		self.store_type(StoreType::new_disk())
	}

	/// Replace all options at once.
	pub fn config(mut self, config: SessionConfig) -> Self {
		self.config = config;
		self
	}

	pub fn tile_size(mut self, tile_size: TileSize) -> Self {
		self.config.tile_size = tile_size;
		self
	}

	pub fn fetch_limit(mut self, limit: usize) -> Self {
		self.config.fetch_limit = limit.max(1);
		self
	}

	pub fn template(mut self, template: &str) -> Self {
		self.config.template = template.to_string();
		self
	}

	pub fn incomplete_rows(mut self, policy: IncompleteRowPolicy) -> Self {
		self.config.incomplete_rows = policy;
		self
	}

	/// Build the session, opening its store if needed.
	pub fn build(self) -> Result<MosaicSession> {
		let store = match self.store {
			Some(store) => store,
			None => self.store_type.unwrap_or_default().open()?,
		};

		Ok(MosaicSession {
			config: self.config,
			transport: self.transport,
			store,
			events: EventBus::new(),
			token: CancellationToken::new(),
		})
	}
}
