//! Average color of a tile.
//!
//! Pure function over an RGBA-interleaved buffer: the red, green and blue channels of every
//! pixel are summed (alpha is ignored), divided by the number of pixels and truncated.
//! Trailing bytes that do not form a full pixel are ignored. A buffer without a single
//! pixel is rejected with [`MosaicError::EmptyTile`] instead of dividing by zero.

use crate::{MosaicError, TileColor};
use anyhow::Result;

pub fn average_color(pixels: &[u8]) -> Result<TileColor> {
	let count = (pixels.len() / 4) as u64;
	if count == 0 {
		return Err(MosaicError::EmptyTile.into());
	}

	let mut sum = [0u64; 3];
	for pixel in pixels.chunks_exact(4) {
		sum[0] += u64::from(pixel[0]);
		sum[1] += u64::from(pixel[1]);
		sum[2] += u64::from(pixel[2]);
	}

	let [r, g, b] = sum.map(|s| (s / count) as u8);
	Ok(TileColor::new(r, g, b))
}
