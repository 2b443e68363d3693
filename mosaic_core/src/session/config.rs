use crate::{DEFAULT_FETCH_LIMIT, TileSize, resolver::DEFAULT_TEMPLATE};

/// What happens to rows that can never complete because some of their tiles were
/// skipped or failed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IncompleteRowPolicy {
	/// Leave them unrendered and emit one `RowStalled` event per row.
	#[default]
	Stall,
	/// Render them anyway, with missing tiles left blank.
	Flush,
}

/// Options of a [`MosaicSession`](crate::MosaicSession).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
	pub tile_size: TileSize,
	/// Maximum number of concurrent transport calls.
	pub fetch_limit: usize,
	/// Resource key template, see [`ResourceResolver`](crate::ResourceResolver).
	pub template: String,
	pub incomplete_rows: IncompleteRowPolicy,
}

impl Default for SessionConfig {
	fn default() -> Self {
		SessionConfig {
			tile_size: TileSize::default(),
			fetch_limit: DEFAULT_FETCH_LIMIT,
			template: DEFAULT_TEMPLATE.to_string(),
			incomplete_rows: IncompleteRowPolicy::default(),
		}
	}
}
