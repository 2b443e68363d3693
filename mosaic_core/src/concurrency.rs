//! Default concurrency for the two kinds of work a session performs
//!
//! - **Workers**: CPU-bound color averaging, defaults to 1x CPU count
//! - **Fetches**: I/O-bound resource requests, defaults to a fixed ceiling of 8
//!
//! # Usage
//!
//! ```
//! use mosaic_core::{DEFAULT_FETCH_LIMIT, cpu_count};
//!
//! assert_eq!(DEFAULT_FETCH_LIMIT, 8);
//! assert!(cpu_count() >= 1);
//! ```

/// Ceiling of concurrent transport requests, matching what the resource server tolerates.
pub const DEFAULT_FETCH_LIMIT: usize = 8;

/// Number of logical CPUs, the default number of workers.
pub fn cpu_count() -> usize {
	num_cpus::get()
}
