use super::{IncompleteRowPolicy, SessionBuilder, SessionConfig, SessionReport};
use crate::{
	Blob, ContentCheck, Dispatch, EventBus, FetchCache, KeyedTile, MosaicError, MosaicEvent, PixelSource, ResourceResolver, ResourceStore,
	RowAssembler, SharedTransport, TileCoord, TileGrid, WorkDistributor, WorkOutcome,
};
use anyhow::{Context, Result};
use futures::{FutureExt, StreamExt, future::BoxFuture, stream::FuturesUnordered};
use image::RgbaImage;
use std::{sync::Arc, time::Instant};
use tokio_util::sync::CancellationToken;

/// Turns one image at a time into a mosaic.
///
/// Rows are published on the session's [`EventBus`] as soon as they and all rows above them
/// are complete. Subscribe before calling [`start`](Self::start).
#[derive(Debug)]
pub struct MosaicSession {
	pub(super) config: SessionConfig,
	pub(super) transport: SharedTransport,
	pub(super) store: Arc<dyn ResourceStore>,
	pub(super) events: EventBus,
	pub(super) token: CancellationToken,
}

impl MosaicSession {
	pub fn builder(transport: SharedTransport) -> SessionBuilder {
		SessionBuilder::new(transport)
	}

	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	pub fn events(&self) -> &EventBus {
		&self.events
	}

	pub fn store(&self) -> &Arc<dyn ResourceStore> {
		&self.store
	}

	/// Token that stops every running and future [`start`](Self::start) when cancelled.
	pub fn cancellation_token(&self) -> CancellationToken {
		self.token.clone()
	}

	pub fn cancel(&self) {
		self.token.cancel();
	}

	/// Renders `bitmap` with `worker_count` parallel workers, zero meaning synchronous.
	///
	/// Returns once every tile has been placed, skipped or has failed. Fails immediately if
	/// no grid can be built and with [`MosaicError::Cancelled`] if the session is cancelled.
	pub async fn start(&self, bitmap: Arc<dyn PixelSource>, worker_count: usize) -> Result<SessionReport> {
		let started = Instant::now();
		let grid = TileGrid::for_source(bitmap.as_ref(), self.config.tile_size)?;
		log::debug!(
			"rendering {}x{} image as {}x{} tiles of {}",
			grid.width(),
			grid.height(),
			grid.columns(),
			grid.rows(),
			grid.tile_size()
		);

		let token = self.token.child_token();
		let decodable: ContentCheck = Arc::new(|content: &Blob| decode(content).map(drop));
		let cache = FetchCache::with_check(
			self.transport.clone(),
			self.store.clone(),
			self.config.fetch_limit,
			decodable,
			token.clone(),
		);
		let distributor = WorkDistributor::new(grid, ResourceResolver::new(&self.config.template), worker_count);

		let mut run = Run {
			session: self,
			assembler: RowAssembler::new(grid),
			tiles_skipped: 0,
			tiles_failed: 0,
		};
		let result = run.process(&distributor, &cache, bitmap, &token).await;
		token.cancel();
		result?;

		let rows_rendered = run.assembler.rows_rendered();
		let mut report = SessionReport {
			rows: grid.rows(),
			rows_rendered,
			tiles_skipped: run.tiles_skipped,
			tiles_failed: run.tiles_failed,
			..Default::default()
		};

		if !run.assembler.is_finished() {
			let incomplete = run.assembler.incomplete_rows();
			match self.config.incomplete_rows {
				IncompleteRowPolicy::Stall => {
					for row in incomplete {
						log::warn!("row {} can not be completed, missing columns {:?}", row.row, row.missing);
						report.rows_stalled += 1;
						self.events.emit(MosaicEvent::RowStalled {
							row: row.row,
							missing: row.missing,
						});
					}
				}
				IncompleteRowPolicy::Flush => {
					log::warn!("flushing {} incomplete rows", incomplete.len());
					for event in run.assembler.flush_incomplete() {
						self.events.emit(event);
					}
					report.rows_flushed = run.assembler.rows_rendered() - rows_rendered;
				}
			}
		}

		report.fetch = cache.stats();
		report.elapsed = started.elapsed();
		log::debug!("session finished: {report}");
		Ok(report)
	}
}

/// State of a single [`MosaicSession::start`] call, confined to the calling task.
struct Run<'a> {
	session: &'a MosaicSession,
	assembler: RowAssembler,
	tiles_skipped: u64,
	tiles_failed: u64,
}

impl Run<'_> {
	async fn process(
		&mut self,
		distributor: &WorkDistributor,
		cache: &FetchCache,
		bitmap: Arc<dyn PixelSource>,
		token: &CancellationToken,
	) -> Result<()> {
		let Dispatch {
			mut outcomes,
			mut workers,
		} = distributor.dispatch(bitmap, token);
		let mut outcomes_open = true;
		let mut pending: FuturesUnordered<BoxFuture<'static, (KeyedTile, Result<Blob>)>> = FuturesUnordered::new();

		while outcomes_open || !pending.is_empty() {
			tokio::select! {
				biased;
				() = token.cancelled() => return Err(MosaicError::Cancelled.into()),
				outcome = outcomes.recv(), if outcomes_open => match outcome {
					Some(WorkOutcome::Keyed(tile)) => {
						let resolve = cache.submit(tile.key.clone());
						let token = token.clone();
						pending.push(
							async move {
								let content = resolve.wait(&token).await;
								(tile, content)
							}
							.boxed(),
						);
					}
					Some(WorkOutcome::Skipped { coord, error }) => self.skip(coord, &error),
					None => outcomes_open = false,
				},
				Some((tile, content)) = pending.next(), if !pending.is_empty() => {
					self.arrive(tile, content)?;
				}
			}
		}

		// every worker has dropped its sender by now
		while let Some(joined) = workers.join_next().await {
			joined.context("tile worker failed")?;
		}
		Ok(())
	}

	fn skip(&mut self, coord: TileCoord, error: &anyhow::Error) {
		log::warn!("skipping tile {coord}: {error:#}");
		self.tiles_skipped += 1;
		self.session.events.emit(MosaicEvent::TileSkipped {
			coord,
			reason: format!("{error:#}"),
		});
	}

	fn arrive(&mut self, tile: KeyedTile, content: Result<Blob>) -> Result<()> {
		let image = match content.and_then(|blob| decode(&blob)) {
			Ok(image) => image,
			Err(err) if MosaicError::is_cancelled(&err) => return Err(err),
			Err(err) => {
				log::warn!("tile {} failed: {err:#}", tile.coord);
				self.tiles_failed += 1;
				self.session.events.emit(MosaicEvent::TileFailed {
					coord: tile.coord,
					key: tile.key.to_string(),
					reason: format!("{err:#}"),
				});
				return Ok(());
			}
		};

		match self.assembler.push(tile.coord, &image) {
			Ok(events) => {
				for event in events {
					self.session.events.emit(event);
				}
			}
			Err(err) => log::warn!("dropping tile {}: {err:#}", tile.coord),
		}
		Ok(())
	}
}

fn decode(content: &Blob) -> Result<RgbaImage> {
	let image = image::load_from_memory(content.as_slice()).with_context(|| format!("decoding {content:?}"))?;
	Ok(image.to_rgba8())
}
