//! Source pixels of a mosaic.
//!
//! [`PixelSource`] is the read primitive the pipeline relies on. [`Bitmap`] implements it on
//! top of an in-memory RGBA image and is what the CLI feeds into a session.

use anyhow::{Context, Result, ensure};
use image::{DynamicImage, RgbaImage, imageops::FilterType};
use std::path::Path;

/// Read access to an RGBA pixel buffer.
///
/// `read_pixels` returns `width * height * 4` interleaved RGBA bytes, row by row.
/// It may fail, e.g. when the region leaves the backing surface.
pub trait PixelSource: Send + Sync {
	fn width(&self) -> u32;
	fn height(&self) -> u32;
	fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>>;
}

/// Immutable RGBA bitmap.
#[derive(Clone, Debug)]
pub struct Bitmap {
	image: RgbaImage,
}

impl Bitmap {
	#[must_use]
	pub fn new(image: RgbaImage) -> Bitmap {
		Bitmap { image }
	}

	#[must_use]
	pub fn from_image(image: &DynamicImage) -> Bitmap {
		Bitmap::new(image.to_rgba8())
	}

	/// Converts `image` and scales it down to at most `max_width` pixels wide,
	/// preserving the aspect ratio. Narrower images are kept as they are.
	#[must_use]
	pub fn from_image_scaled(image: &DynamicImage, max_width: u32) -> Bitmap {
		let rgba = image.to_rgba8();
		let (width, height) = rgba.dimensions();
		if max_width == 0 || width <= max_width {
			return Bitmap::new(rgba);
		}
		let scaled_height = ((u64::from(height) * u64::from(max_width)) / u64::from(width)).max(1) as u32;
		log::debug!("scaling {width}x{height} image down to {max_width}x{scaled_height}");
		Bitmap::new(image::imageops::resize(&rgba, max_width, scaled_height, FilterType::Triangle))
	}

	/// Decodes the image file at `path`, optionally limiting its width.
	pub fn open(path: &Path, max_width: Option<u32>) -> Result<Bitmap> {
		let image = image::open(path).with_context(|| format!("opening image '{}'", path.display()))?;
		Ok(match max_width {
			Some(max_width) => Bitmap::from_image_scaled(&image, max_width),
			None => Bitmap::from_image(&image),
		})
	}
}

impl PixelSource for Bitmap {
	fn width(&self) -> u32 {
		self.image.width()
	}

	fn height(&self) -> u32 {
		self.image.height()
	}

	fn read_pixels(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Vec<u8>> {
		let (total_width, total_height) = self.image.dimensions();
		ensure!(
			u64::from(x) + u64::from(width) <= u64::from(total_width)
				&& u64::from(y) + u64::from(height) <= u64::from(total_height),
			"region {width}x{height} at ({x}, {y}) exceeds bitmap {total_width}x{total_height}"
		);

		let raw = self.image.as_raw();
		let stride = total_width as usize * 4;
		let row_len = width as usize * 4;
		let mut buffer = Vec::with_capacity(row_len * height as usize);
		for row in y..y + height {
			let start = row as usize * stride + x as usize * 4;
			buffer.extend_from_slice(&raw[start..start + row_len]);
		}
		Ok(buffer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgba;

	fn gradient(width: u32, height: u32) -> Bitmap {
		Bitmap::new(RgbaImage::from_fn(width, height, |x, y| {
			Rgba([x as u8, y as u8, 0, 255])
		}))
	}

	#[test]
	fn read_region() -> Result<()> {
		let bitmap = gradient(4, 3);
		let pixels = bitmap.read_pixels(1, 1, 2, 2)?;
		assert_eq!(
			pixels,
			vec![1, 1, 0, 255, 2, 1, 0, 255, 1, 2, 0, 255, 2, 2, 0, 255]
		);
		Ok(())
	}

	#[test]
	fn read_outside_fails() {
		let bitmap = gradient(4, 3);
		assert!(bitmap.read_pixels(3, 0, 2, 1).is_err());
		assert!(bitmap.read_pixels(0, 2, 1, 2).is_err());
		assert!(bitmap.read_pixels(u32::MAX, 0, 2, 1).is_err());
	}

	#[test]
	fn scaled_keeps_aspect_ratio() {
		let image = DynamicImage::ImageRgba8(RgbaImage::new(200, 100));
		let bitmap = Bitmap::from_image_scaled(&image, 50);
		assert_eq!((bitmap.width(), bitmap.height()), (50, 25));
	}

	#[test]
	fn scaled_leaves_narrow_images() {
		let image = DynamicImage::ImageRgba8(RgbaImage::new(40, 10));
		let bitmap = Bitmap::from_image_scaled(&image, 50);
		assert_eq!((bitmap.width(), bitmap.height()), (40, 10));
	}

	#[test]
	fn open_missing_file() {
		let err = Bitmap::open(Path::new("does/not/exist.png"), None).unwrap_err();
		assert!(err.to_string().contains("does/not/exist.png"));
	}
}
