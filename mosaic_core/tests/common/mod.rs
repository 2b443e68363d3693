use anyhow::{Context, Result};
use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use mosaic_core::{Blob, ResourceKey, Transport};
use std::{
	collections::HashSet,
	io::Cursor,
	sync::atomic::{AtomicUsize, Ordering},
	time::Duration,
};

/// Serves `/color/rrggbb` as a solid 16x16 PNG of that color, after a short random-ish delay
/// so completions arrive out of order.
#[derive(Debug, Default)]
pub struct ColorServer {
	pub calls: AtomicUsize,
	/// Colors (`rrggbb`) that always fail.
	pub broken: HashSet<String>,
}

impl ColorServer {
	pub fn with_broken(colors: &[&str]) -> ColorServer {
		ColorServer {
			broken: colors.iter().map(|c| (*c).to_string()).collect(),
			..Default::default()
		}
	}

	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

pub fn parse_color(hex: &str) -> Result<Rgba<u8>> {
	let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).with_context(|| format!("parsing '{hex}'"));
	Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}

#[async_trait]
impl Transport for ColorServer {
	async fn fetch(&self, key: &ResourceKey) -> Result<Blob> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		let hex = key.as_str().strip_prefix("/color/").context("unknown resource")?;
		tokio::time::sleep(Duration::from_millis((7 * call as u64) % 5)).await;
		anyhow::ensure!(!self.broken.contains(hex), "color {hex} is not available");

		let mut buffer = Cursor::new(Vec::new());
		RgbaImage::from_pixel(16, 16, parse_color(hex)?).write_to(&mut buffer, ImageFormat::Png)?;
		Ok(Blob::from(buffer.into_inner()))
	}

	fn get_name(&self) -> &str {
		"color server"
	}
}

/// Tile (x, y) of a 16 px grid is filled with a color derived from its position.
pub fn patchwork(width: u32, height: u32) -> RgbaImage {
	RgbaImage::from_fn(width, height, |x, y| {
		let (column, row) = ((x / 16) as u8, (y / 16) as u8);
		Rgba([column.wrapping_mul(40), row.wrapping_mul(60), 200, 255])
	})
}
