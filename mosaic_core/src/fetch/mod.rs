//! Bounded-concurrency, deduplicating resolution of resource keys.
//!
//! A [`FetchCache`] is a cheap handle. All bookkeeping (the in-memory cache, the waiters of
//! in-flight keys, the overflow queue and the concurrency counter) is owned by a single
//! scheduler task and mutated nowhere else.

mod cache;
mod scheduler;
mod stats;

pub use cache::{ContentCheck, FetchCache, PendingResolve};
pub use stats::FetchStats;
