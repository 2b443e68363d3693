//! Draws the rows a session emits into one canvas.

use anyhow::{Context, Result, ensure};
use image::{RgbaImage, imageops};
use mosaic_core::{EventBus, MosaicEvent};
use parking_lot::Mutex;
use std::{path::Path, sync::Arc};

#[derive(Debug, Default)]
struct Canvas {
	image: RgbaImage,
	rows_drawn: u32,
	finished: bool,
}

/// Subscribes to an [`EventBus`] and composites every `RowReady` at its vertical offset.
#[derive(Clone, Debug)]
pub struct CanvasRenderer {
	canvas: Arc<Mutex<Canvas>>,
}

impl CanvasRenderer {
	/// Creates a transparent `width × height` canvas fed by `events`.
	pub fn attach(events: &EventBus, width: u32, height: u32) -> CanvasRenderer {
		let canvas = Arc::new(Mutex::new(Canvas {
			image: RgbaImage::new(width, height),
			..Default::default()
		}));

		let target = canvas.clone();
		events.subscribe(move |event| match event {
			MosaicEvent::RowReady(row) => {
				let mut canvas = target.lock();
				imageops::overlay(&mut canvas.image, &row.image, 0, i64::from(row.y_offset));
				canvas.rows_drawn += 1;
				log::info!("{}% rendered", row.progress);
			}
			MosaicEvent::AllRowsRendered => target.lock().finished = true,
			MosaicEvent::TileSkipped { coord, reason } => log::debug!("tile {coord} skipped: {reason}"),
			MosaicEvent::TileFailed { coord, key, reason } => log::debug!("tile {coord} ('{key}') failed: {reason}"),
			MosaicEvent::RowStalled { row, missing } => log::debug!("row {row} stalled, missing {missing:?}"),
		});

		CanvasRenderer { canvas }
	}

	pub fn rows_drawn(&self) -> u32 {
		self.canvas.lock().rows_drawn
	}

	/// `true` once every row has been drawn.
	pub fn is_finished(&self) -> bool {
		self.canvas.lock().finished
	}

	/// A copy of the canvas as drawn so far.
	pub fn snapshot(&self) -> RgbaImage {
		self.canvas.lock().image.clone()
	}

	/// Writes the canvas to `path`, the format follows the file extension.
	pub fn save(&self, path: &Path) -> Result<()> {
		let canvas = self.canvas.lock();
		ensure!(canvas.rows_drawn > 0, "nothing has been rendered, not writing '{}'", path.display());
		canvas
			.image
			.save(path)
			.with_context(|| format!("writing mosaic to '{}'", path.display()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgba;
	use mosaic_core::RenderedRow;

	fn row(row: u32, color: Rgba<u8>) -> MosaicEvent {
		MosaicEvent::RowReady(Arc::new(RenderedRow {
			row,
			y_offset: row * 2,
			image: RgbaImage::from_pixel(4, 2, color),
			progress: ((row + 1) * 50) as u8,
		}))
	}

	#[test]
	fn rows_land_at_their_offset() {
		let bus = EventBus::new();
		let renderer = CanvasRenderer::attach(&bus, 4, 4);

		bus.emit(row(0, Rgba([255, 0, 0, 255])));
		assert!(!renderer.is_finished());
		bus.emit(row(1, Rgba([0, 255, 0, 255])));
		bus.emit(MosaicEvent::AllRowsRendered);

		let image = renderer.snapshot();
		assert_eq!(image.get_pixel(3, 1).0, [255, 0, 0, 255]);
		assert_eq!(image.get_pixel(0, 2).0, [0, 255, 0, 255]);
		assert_eq!(renderer.rows_drawn(), 2);
		assert!(renderer.is_finished());
	}

	#[test]
	fn save_writes_png() -> Result<()> {
		let bus = EventBus::new();
		let renderer = CanvasRenderer::attach(&bus, 4, 2);
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("mosaic.png");

		assert!(renderer.save(&path).is_err());
		bus.emit(row(0, Rgba([1, 2, 3, 255])));
		renderer.save(&path)?;

		let written = image::open(&path)?.to_rgba8();
		assert_eq!(written.dimensions(), (4, 2));
		assert_eq!(written.get_pixel(0, 0).0, [1, 2, 3, 255]);
		Ok(())
	}
}
