use std::fmt;

/// Counters kept by the fetch scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchStats {
	/// Requests received by the scheduler.
	pub requests: u64,
	/// Transport calls issued.
	pub transport_calls: u64,
	pub memory_hits: u64,
	pub store_hits: u64,
	/// Requests that joined an in-flight transport call for the same key.
	pub coalesced: u64,
	/// Requests that had to wait in the overflow queue.
	pub queued: u64,
	pub failures: u64,
	/// Highest number of transport calls in flight at the same time.
	pub peak_in_flight: usize,
}

impl fmt::Display for FetchStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} requests, {} fetched, {} memory hits, {} store hits, {} coalesced, {} queued, {} failed, peak {}",
			self.requests,
			self.transport_calls,
			self.memory_hits,
			self.store_hits,
			self.coalesced,
			self.queued,
			self.failures,
			self.peak_in_flight
		)
	}
}
