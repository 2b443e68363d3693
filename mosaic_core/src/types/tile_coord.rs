//! Grid coordinates and tile dimensions.

use std::fmt;

/// Position of a tile in the grid, counted in tiles (not pixels).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	#[must_use]
	pub fn new(x: u32, y: u32) -> TileCoord {
		TileCoord { x, y }
	}
}

impl fmt::Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "({}, {})", self.x, self.y)
	}
}

/// Nominal width and height of a tile in pixels.
///
/// Edge tiles of a grid may be smaller, see [`TileGrid`](crate::TileGrid).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileSize {
	pub width: u32,
	pub height: u32,
}

impl TileSize {
	/// Default tile edge length used by the mosaic server.
	pub const DEFAULT_EDGE: u32 = 16;

	#[must_use]
	pub fn new(width: u32, height: u32) -> TileSize {
		TileSize { width, height }
	}
}

impl Default for TileSize {
	fn default() -> Self {
		TileSize::new(Self::DEFAULT_EDGE, Self::DEFAULT_EDGE)
	}
}

impl fmt::Display for TileSize {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// Pixel rectangle covered by a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
	pub x: u32,
	pub y: u32,
	pub width: u32,
	pub height: u32,
}

impl TileRect {
	#[must_use]
	pub fn area(&self) -> u64 {
		u64::from(self.width) * u64::from(self.height)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn display() {
		assert_eq!(TileCoord::new(3, 7).to_string(), "(3, 7)");
		assert_eq!(TileSize::new(16, 8).to_string(), "16x8");
	}

	#[test]
	fn default_tile_size() {
		assert_eq!(TileSize::default(), TileSize::new(16, 16));
	}

	#[test]
	fn coords_order_row_major() {
		let mut coords = vec![TileCoord::new(1, 0), TileCoord::new(0, 1), TileCoord::new(0, 0)];
		coords.sort_by_key(|c| (c.y, c.x));
		assert_eq!(coords, vec![TileCoord::new(0, 0), TileCoord::new(1, 0), TileCoord::new(0, 1)]);
	}

	#[test]
	fn rect_area() {
		let rect = TileRect {
			x: 0,
			y: 0,
			width: 16,
			height: 3,
		};
		assert_eq!(rect.area(), 48);
	}
}
