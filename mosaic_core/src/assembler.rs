//! Ordered reassembly of tiles into rows.
//!
//! Tiles arrive in any order. Each row collects its tiles on a surface of
//! `image width × row height` pixels and moves through
//! `Pending → Accumulating → Loaded → Rendered`. A loaded row is only rendered once every
//! row above it has been rendered, so rows leave the assembler strictly top to bottom and
//! each exactly once.

use crate::{
	MosaicError, TileCoord, TileGrid,
	events::{MosaicEvent, RenderedRow},
};
use anyhow::{Result, bail};
use image::{RgbaImage, imageops};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowState {
	/// No tile has arrived yet.
	Pending,
	Accumulating,
	/// All tiles arrived, waiting for the rows above.
	Loaded,
	Rendered,
}

/// An unrendered row and the columns it is still missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncompleteRow {
	pub row: u32,
	pub missing: Vec<u32>,
}

#[derive(Debug)]
struct Row {
	surface: RgbaImage,
	loaded: Vec<bool>,
	count: u32,
}

#[derive(Debug)]
pub struct RowAssembler {
	grid: TileGrid,
	rows: BTreeMap<u32, Row>,
	last_rendered_row: Option<u32>,
	count_y: u32,
	finished: bool,
}

impl RowAssembler {
	pub fn new(grid: TileGrid) -> RowAssembler {
		RowAssembler {
			grid,
			rows: BTreeMap::new(),
			last_rendered_row: None,
			count_y: 0,
			finished: false,
		}
	}

	/// Places `tile` at `coord` and returns the events it unlocked, in emission order.
	///
	/// Tiles whose size differs from the nominal tile size are resized first; edge tiles are
	/// clipped by the row surface. Duplicate tiles, tiles of rendered rows and coordinates
	/// outside the grid are rejected and leave the assembler unchanged.
	pub fn push(&mut self, coord: TileCoord, tile: &RgbaImage) -> Result<Vec<MosaicEvent>> {
		self.grid.tile_rect(coord)?;
		if self.is_rendered(coord.y) {
			bail!("tile {coord} arrived after row {} was rendered", coord.y);
		}

		let grid = self.grid;
		let row = self.rows.entry(coord.y).or_insert_with(|| Row {
			surface: RgbaImage::new(grid.width(), grid.row_height(coord.y)),
			loaded: vec![false; grid.columns() as usize],
			count: 0,
		});
		if row.loaded[coord.x as usize] {
			bail!("tile {coord} arrived twice");
		}

		let size = grid.tile_size();
		let x_offset = i64::from(coord.x * size.width);
		if tile.dimensions() == (size.width, size.height) {
			imageops::overlay(&mut row.surface, tile, x_offset, 0);
		} else {
			let resized = imageops::resize(tile, size.width, size.height, imageops::FilterType::Triangle);
			imageops::overlay(&mut row.surface, &resized, x_offset, 0);
		}
		row.loaded[coord.x as usize] = true;
		row.count += 1;

		if row.count < grid.columns() {
			return Ok(Vec::new());
		}
		log::trace!("row {} is loaded", coord.y);
		Ok(self.drain())
	}

	fn next_row(&self) -> u32 {
		self.last_rendered_row.map_or(0, |row| row + 1)
	}

	fn is_rendered(&self, y: u32) -> bool {
		self.last_rendered_row.is_some_and(|last| y <= last)
	}

	/// Renders loaded rows for as long as the next row in line is loaded.
	fn drain(&mut self) -> Vec<MosaicEvent> {
		let columns = self.grid.columns();
		let mut events = Vec::new();
		loop {
			let next = self.next_row();
			if !self.rows.get(&next).is_some_and(|row| row.count == columns) {
				break;
			}
			let Some(row) = self.rows.remove(&next) else {
				break;
			};
			events.push(self.render(next, row.surface));
		}
		self.finish(&mut events);
		events
	}

	fn render(&mut self, row: u32, surface: RgbaImage) -> MosaicEvent {
		debug_assert_eq!(row, self.next_row());
		self.last_rendered_row = Some(row);
		self.count_y += 1;

		let rows = u64::from(self.grid.rows());
		let progress = (u64::from(row + 1) * 100).div_ceil(rows) as u8;
		log::debug!("row {row} rendered, {progress}% done");

		MosaicEvent::RowReady(Arc::new(RenderedRow {
			row,
			y_offset: row * self.grid.tile_size().height,
			image: surface,
			progress,
		}))
	}

	fn finish(&mut self, events: &mut Vec<MosaicEvent>) {
		if !self.finished && self.count_y == self.grid.rows() {
			self.finished = true;
			events.push(MosaicEvent::AllRowsRendered);
		}
	}

	/// Renders every remaining row in ascending order, leaving missing tiles blank,
	/// followed by the terminal event.
	pub fn flush_incomplete(&mut self) -> Vec<MosaicEvent> {
		let mut events = Vec::new();
		for y in self.next_row()..self.grid.rows() {
			let surface = match self.rows.remove(&y) {
				Some(row) => row.surface,
				None => RgbaImage::new(self.grid.width(), self.grid.row_height(y)),
			};
			events.push(self.render(y, surface));
		}
		self.finish(&mut events);
		events
	}

	/// Every row that has not been rendered yet, top to bottom, with its missing columns.
	///
	/// A loaded row waiting for an earlier row is listed with no missing columns.
	pub fn incomplete_rows(&self) -> Vec<IncompleteRow> {
		(self.next_row()..self.grid.rows())
			.map(|y| {
				let missing = match self.rows.get(&y) {
					Some(row) => (0..self.grid.columns()).filter(|&x| !row.loaded[x as usize]).collect(),
					None => (0..self.grid.columns()).collect(),
				};
				IncompleteRow { row: y, missing }
			})
			.collect()
	}

	pub fn row_state(&self, y: u32) -> Result<RowState> {
		if y > self.grid.max_y() {
			return Err(MosaicError::OutOfBounds {
				x: 0,
				y,
				max_x: self.grid.max_x(),
				max_y: self.grid.max_y(),
			}
			.into());
		}
		Ok(if self.is_rendered(y) {
			RowState::Rendered
		} else {
			match self.rows.get(&y) {
				None => RowState::Pending,
				Some(row) if row.count == self.grid.columns() => RowState::Loaded,
				Some(_) => RowState::Accumulating,
			}
		})
	}

	pub fn last_rendered_row(&self) -> Option<u32> {
		self.last_rendered_row
	}

	pub fn rows_rendered(&self) -> u32 {
		self.count_y
	}

	/// `true` once the terminal event has been produced.
	pub fn is_finished(&self) -> bool {
		self.finished
	}
}
