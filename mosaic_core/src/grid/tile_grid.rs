//! Partitioning of a bitmap into a grid of fixed-size tiles.
//!
//! The grid spans `max_x + 1` columns and `max_y + 1` rows, where
//! `max_x = ceil(width / tile_width) - 1` and `max_y = ceil(height / tile_height) - 1`.
//! Tiles in the last column and last row cover only what remains of the image, so the
//! areas of all tiles add up to the area of the bitmap.
//!
//! # Examples
//!
//! ```rust
//! use mosaic_core::{TileGrid, TileSize, TileCoord};
//!
//! let grid = TileGrid::new(40, 32, TileSize::new(16, 16)).unwrap();
//! assert_eq!((grid.max_x(), grid.max_y()), (2, 1));
//! assert_eq!(grid.tile_rect(TileCoord::new(2, 0)).unwrap().width, 8);
//! ```

use super::PixelSource;
use crate::{MosaicError, TileCoord, TileRect, TileSize};
use anyhow::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGrid {
	width: u32,
	height: u32,
	tile_size: TileSize,
	max_x: u32,
	max_y: u32,
}

impl TileGrid {
	/// Builds the grid for an image of `width × height` pixels.
	///
	/// Fails with [`MosaicError::InvalidDimensions`] if any dimension is zero.
	pub fn new(width: u32, height: u32, tile_size: TileSize) -> Result<TileGrid> {
		if width == 0 || height == 0 || tile_size.width == 0 || tile_size.height == 0 {
			return Err(MosaicError::InvalidDimensions {
				width,
				height,
				tile_width: tile_size.width,
				tile_height: tile_size.height,
			}
			.into());
		}

		Ok(TileGrid {
			width,
			height,
			tile_size,
			max_x: width.div_ceil(tile_size.width) - 1,
			max_y: height.div_ceil(tile_size.height) - 1,
		})
	}

	pub fn for_source(source: &dyn PixelSource, tile_size: TileSize) -> Result<TileGrid> {
		TileGrid::new(source.width(), source.height(), tile_size)
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn tile_size(&self) -> TileSize {
		self.tile_size
	}

	/// Index of the last tile column.
	pub fn max_x(&self) -> u32 {
		self.max_x
	}

	/// Index of the last tile row.
	pub fn max_y(&self) -> u32 {
		self.max_y
	}

	/// Number of tiles per row.
	pub fn columns(&self) -> u32 {
		self.max_x + 1
	}

	pub fn rows(&self) -> u32 {
		self.max_y + 1
	}

	/// Pixel width of the tiles in column `x`. Only the last column can be narrower.
	pub fn column_width(&self, x: u32) -> u32 {
		if x == self.max_x {
			self.width - x * self.tile_size.width
		} else {
			self.tile_size.width
		}
	}

	/// Pixel height of row `y`. Only the last row can be lower.
	pub fn row_height(&self, y: u32) -> u32 {
		if y == self.max_y {
			self.height - y * self.tile_size.height
		} else {
			self.tile_size.height
		}
	}

	fn check_bounds(&self, coord: TileCoord) -> Result<()> {
		if coord.x > self.max_x || coord.y > self.max_y {
			return Err(MosaicError::OutOfBounds {
				x: coord.x,
				y: coord.y,
				max_x: self.max_x,
				max_y: self.max_y,
			}
			.into());
		}
		Ok(())
	}

	/// The pixel rectangle covered by the tile at `coord`.
	pub fn tile_rect(&self, coord: TileCoord) -> Result<TileRect> {
		self.check_bounds(coord)?;
		Ok(TileRect {
			x: coord.x * self.tile_size.width,
			y: coord.y * self.tile_size.height,
			width: self.column_width(coord.x),
			height: self.row_height(coord.y),
		})
	}

	/// Reads the RGBA pixels of the tile at `coord` from `source`.
	///
	/// Coordinates outside the grid are an error. A failing read is not: it is logged and
	/// the tile is reported as unavailable (`None`) so the caller can skip it.
	pub fn tile_at(&self, source: &dyn PixelSource, coord: TileCoord) -> Result<Option<Vec<u8>>> {
		let rect = self.tile_rect(coord)?;
		match source.read_pixels(rect.x, rect.y, rect.width, rect.height) {
			Ok(pixels) => Ok(Some(pixels)),
			Err(err) => {
				log::debug!("reading {rect:?} of tile {coord} failed: {err:#}");
				Ok(None)
			}
		}
	}

	/// All coordinates of row `y`, left to right.
	pub fn row_coords(&self, y: u32) -> impl Iterator<Item = TileCoord> + use<> {
		(0..=self.max_x).map(move |x| TileCoord::new(x, y))
	}

	/// All coordinates in row-major order.
	pub fn coords(&self) -> impl Iterator<Item = TileCoord> + use<> {
		let max_x = self.max_x;
		(0..=self.max_y).flat_map(move |y| (0..=max_x).map(move |x| TileCoord::new(x, y)))
	}
}
