//! Distribution of tile color computation across blocking workers.
//!
//! The rows of the grid are split into contiguous bands, one per worker. Each worker runs
//! on tokio's blocking pool, owns its list of tile coordinates and reports one
//! [`WorkOutcome`] per tile over a channel. Workers know nothing about rows being
//! assembled or about fetching; the outcomes arrive at the session in any order.
//!
//! With zero workers every tile is processed on the calling task, in row-major order.
//!
//! A tile whose processing panics is reported as skipped, the worker goes on with its next
//! tile.

use crate::{MosaicError, PixelSource, ResourceKey, ResourceResolver, TileColor, TileCoord, TileGrid, average_color};
use std::{
	any::Any,
	ops::Range,
	panic::{AssertUnwindSafe, catch_unwind},
	sync::Arc,
};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

/// A tile whose color has been computed and mapped to a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedTile {
	pub coord: TileCoord,
	pub color: TileColor,
	pub key: ResourceKey,
}

#[derive(Debug)]
pub enum WorkOutcome {
	Keyed(KeyedTile),
	/// The tile could not be read or contained no pixels.
	Skipped { coord: TileCoord, error: anyhow::Error },
}

impl WorkOutcome {
	pub fn coord(&self) -> TileCoord {
		match self {
			WorkOutcome::Keyed(tile) => tile.coord,
			WorkOutcome::Skipped { coord, .. } => *coord,
		}
	}
}

/// The running work of one [`WorkDistributor::dispatch`].
#[derive(Debug)]
pub struct Dispatch {
	/// One outcome per tile. Closes once every worker has stopped.
	pub outcomes: mpsc::UnboundedReceiver<WorkOutcome>,
	/// The blocking workers, empty on the synchronous path.
	pub workers: JoinSet<()>,
}

/// Splits `rows` rows into one contiguous band per worker.
///
/// Every band holds `rows / workers` rows, the last one also takes the remainder.
/// `workers` is clamped to `rows`, so no band is empty. Zero workers yield no bands.
pub fn partition_rows(rows: u32, workers: usize) -> Vec<Range<u32>> {
	let workers = u32::try_from(workers).unwrap_or(u32::MAX).min(rows);
	if workers == 0 {
		return Vec::new();
	}

	let per_worker = rows / workers;
	(0..workers)
		.map(|index| {
			let start = index * per_worker;
			let end = if index + 1 == workers { rows } else { start + per_worker };
			start..end
		})
		.collect()
}

#[derive(Clone, Debug)]
pub struct WorkDistributor {
	grid: TileGrid,
	resolver: ResourceResolver,
	workers: usize,
}

impl WorkDistributor {
	/// `workers` is clamped to the number of grid rows, zero selects the synchronous path.
	pub fn new(grid: TileGrid, resolver: ResourceResolver, workers: usize) -> WorkDistributor {
		let workers = workers.min(grid.rows() as usize);
		WorkDistributor {
			grid,
			resolver,
			workers,
		}
	}

	pub fn workers(&self) -> usize {
		self.workers
	}

	/// Processes every tile of the grid and returns the outcomes along with the workers.
	///
	/// The channel closes once all workers are done or have stopped because `token` was
	/// cancelled. Must be called within a tokio runtime when workers are used.
	pub fn dispatch(&self, source: Arc<dyn PixelSource>, token: &CancellationToken) -> Dispatch {
		let (sender, outcomes) = mpsc::unbounded_channel();
		let mut workers = JoinSet::new();

		if self.workers == 0 {
			log::debug!("processing {} rows synchronously", self.grid.rows());
			let tasks: Vec<TileCoord> = self.grid.coords().collect();
			process_tiles(&self.grid, &self.resolver, source.as_ref(), tasks, token, &sender);
			return Dispatch { outcomes, workers };
		}

		for (index, rows) in partition_rows(self.grid.rows(), self.workers).into_iter().enumerate() {
			log::trace!("worker {index} takes rows {rows:?}");
			let tasks: Vec<TileCoord> = rows.flat_map(|y| self.grid.row_coords(y)).collect();
			let grid = self.grid;
			let resolver = self.resolver.clone();
			let source = source.clone();
			let token = token.clone();
			let sender = sender.clone();
			workers.spawn_blocking(move || {
				process_tiles(&grid, &resolver, source.as_ref(), tasks, &token, &sender);
			});
		}

		Dispatch { outcomes, workers }
	}
}

fn process_tiles(
	grid: &TileGrid,
	resolver: &ResourceResolver,
	source: &dyn PixelSource,
	tasks: Vec<TileCoord>,
	token: &CancellationToken,
	sender: &mpsc::UnboundedSender<WorkOutcome>,
) {
	for coord in tasks {
		if token.is_cancelled() {
			log::debug!("stopping before tile {coord}, cancelled");
			return;
		}
		let outcome = catch_unwind(AssertUnwindSafe(|| process_tile(grid, resolver, source, coord)))
			.unwrap_or_else(|payload| {
				let reason = format!("processing panicked: {}", panic_message(payload.as_ref()));
				log::error!("tile {coord}: {reason}");
				WorkOutcome::Skipped {
					coord,
					error: MosaicError::TileUnavailable {
						x: coord.x,
						y: coord.y,
						reason,
					}
					.into(),
				}
			});
		if sender.send(outcome).is_err() {
			// nobody listens anymore
			return;
		}
	}
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
	if let Some(message) = payload.downcast_ref::<&str>() {
		*message
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.as_str()
	} else {
		"unknown cause"
	}
}

fn process_tile(grid: &TileGrid, resolver: &ResourceResolver, source: &dyn PixelSource, coord: TileCoord) -> WorkOutcome {
	let pixels = match grid.tile_at(source, coord) {
		Ok(Some(pixels)) => pixels,
		Ok(None) => {
			let error = MosaicError::TileUnavailable {
				x: coord.x,
				y: coord.y,
				reason: "reading its pixels failed".to_string(),
			};
			return WorkOutcome::Skipped {
				coord,
				error: error.into(),
			};
		}
		Err(error) => return WorkOutcome::Skipped { coord, error },
	};

	match average_color(&pixels) {
		Ok(color) => WorkOutcome::Keyed(KeyedTile {
			coord,
			color,
			key: resolver.resolve(&color),
		}),
		Err(error) => WorkOutcome::Skipped { coord, error },
	}
}
