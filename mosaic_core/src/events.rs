//! Per-session event bus.
//!
//! A [`MosaicSession`](crate::MosaicSession) owns one [`EventBus`]. Renderers subscribe to it
//! and receive rows strictly in ascending order, followed by a single
//! [`MosaicEvent::AllRowsRendered`].

use crate::TileCoord;
use arc_swap::ArcSwap;
use image::RgbaImage;
use std::sync::Arc;

/// A fully composited row of the mosaic.
#[derive(Debug)]
pub struct RenderedRow {
	pub row: u32,
	/// Vertical pixel offset of the row in the canvas.
	pub y_offset: u32,
	pub image: RgbaImage,
	/// Percentage of rows rendered so far, rounded up.
	pub progress: u8,
}

#[derive(Debug, Clone)]
pub enum MosaicEvent {
	RowReady(Arc<RenderedRow>),

	/// Emitted exactly once, after the last row.
	AllRowsRendered,

	/// The tile's pixels could not be read or contained no pixels.
	TileSkipped { coord: TileCoord, reason: String },

	/// Fetching or decoding the tile's resource failed.
	TileFailed {
		coord: TileCoord,
		key: String,
		reason: String,
	},

	/// A row that can never complete because tiles are missing.
	RowStalled { row: u32, missing: Vec<u32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(usize);

type EventListener = Arc<dyn Fn(&MosaicEvent) + Send + Sync>;

/// Thread-safe event bus. Listeners are called synchronously, in subscription order.
#[derive(Clone)]
pub struct EventBus {
	listeners: Arc<ArcSwap<Vec<EventListener>>>,
}

impl EventBus {
	pub fn new() -> Self {
		Self {
			listeners: Arc::new(ArcSwap::from_pointee(Vec::new())),
		}
	}

	pub fn subscribe<F>(&self, listener: F) -> ListenerId
	where
		F: Fn(&MosaicEvent) + Send + Sync + 'static,
	{
		let listener: EventListener = Arc::new(listener);
		let previous = self.listeners.rcu(|old| {
			let mut new = (**old).clone();
			new.push(listener.clone());
			new
		});
		ListenerId(previous.len())
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.load().len()
	}

	/// Calls every listener with `event`. A panicking listener is logged and skipped.
	pub fn emit(&self, event: MosaicEvent) {
		let listeners = self.listeners.load();
		for listener in listeners.iter() {
			if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| listener(&event))).is_err() {
				log::error!("event listener panicked while handling {}", event_name(&event));
			}
		}
	}
}

impl Default for EventBus {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for EventBus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("EventBus")
			.field("listeners", &self.listener_count())
			.finish()
	}
}

fn event_name(event: &MosaicEvent) -> &'static str {
	match event {
		MosaicEvent::RowReady(_) => "RowReady",
		MosaicEvent::AllRowsRendered => "AllRowsRendered",
		MosaicEvent::TileSkipped { .. } => "TileSkipped",
		MosaicEvent::TileFailed { .. } => "TileFailed",
		MosaicEvent::RowStalled { .. } => "RowStalled",
	}
}
