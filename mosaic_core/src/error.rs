//! Typed failure kinds of the mosaic pipeline.
//!
//! Functions return [`anyhow::Result`]; when a caller needs to react to a particular
//! kind it can `downcast_ref::<MosaicError>()` the error.

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MosaicError {
	/// The image or the tile size has a zero dimension; no grid can be built.
	#[error("invalid dimensions: image is {width}x{height}, tile is {tile_width}x{tile_height}")]
	InvalidDimensions {
		width: u32,
		height: u32,
		tile_width: u32,
		tile_height: u32,
	},

	#[error("no tile at ({x}, {y}), the grid ends at ({max_x}, {max_y})")]
	OutOfBounds { x: u32, y: u32, max_x: u32, max_y: u32 },

	/// Reading the pixels of a tile failed. The tile is skipped, its row can never complete.
	#[error("tile ({x}, {y}) is unavailable: {reason}")]
	TileUnavailable { x: u32, y: u32, reason: String },

	#[error("tile contains no pixels")]
	EmptyTile,

	#[error("fetching '{key}' failed: {message}")]
	Transport { key: String, message: String },

	#[error("operation was cancelled")]
	Cancelled,
}

impl MosaicError {
	/// Returns `true` if `error` is (or wraps) [`MosaicError::Cancelled`].
	pub fn is_cancelled(error: &anyhow::Error) -> bool {
		matches!(error.downcast_ref::<MosaicError>(), Some(MosaicError::Cancelled))
	}
}
