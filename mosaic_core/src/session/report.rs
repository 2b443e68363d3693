use crate::FetchStats;
use std::{fmt, time::Duration};

/// Summary of a finished [`MosaicSession::start`](crate::MosaicSession::start).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
	pub rows: u32,
	/// Rows rendered once all of their tiles had arrived.
	pub rows_rendered: u32,
	pub rows_stalled: u32,
	/// Incomplete rows rendered with blanks.
	pub rows_flushed: u32,
	pub tiles_skipped: u64,
	pub tiles_failed: u64,
	pub fetch: FetchStats,
	pub elapsed: Duration,
}

impl SessionReport {
	/// `true` if every row was rendered with all of its tiles.
	pub fn is_complete(&self) -> bool {
		self.rows_rendered == self.rows
	}
}

impl fmt::Display for SessionReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}/{} rows rendered, {} stalled, {} flushed, {} tiles skipped, {} tiles failed in {:.2?} ({})",
			self.rows_rendered,
			self.rows,
			self.rows_stalled,
			self.rows_flushed,
			self.tiles_skipped,
			self.tiles_failed,
			self.elapsed,
			self.fetch
		)
	}
}
