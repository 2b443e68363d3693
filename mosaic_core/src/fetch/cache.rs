use super::{
	FetchStats,
	scheduler::{Reply, Request, Scheduler},
};
use crate::{Blob, MosaicError, ResourceKey, ResourceStore, SharedTransport};
use anyhow::Result;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

/// Accepts or rejects fetched content before it is cached.
///
/// Rejected content is handled like a failed transport call. Stored content that is
/// rejected is fetched again.
pub type ContentCheck = Arc<dyn Fn(&Blob) -> Result<()> + Send + Sync>;

/// Bounded-concurrency, deduplicating resolver of resource keys to content.
///
/// The handle is cheap to clone. All bookkeeping lives in a scheduler task spawned by
/// [`FetchCache::new`]; the task ends when every handle is dropped or `token` is cancelled.
#[derive(Clone, Debug)]
pub struct FetchCache {
	requests: mpsc::UnboundedSender<Request>,
	stats: Arc<Mutex<FetchStats>>,
}

impl FetchCache {
	/// Spawns the scheduler on the current tokio runtime.
	///
	/// `limit` is the maximum number of concurrent transport calls, at least 1.
	pub fn new(
		transport: SharedTransport,
		store: Arc<dyn ResourceStore>,
		limit: usize,
		token: CancellationToken,
	) -> FetchCache {
		Self::spawn(transport, store, limit, None, token)
	}

	/// Like [`new`](Self::new), but only content accepted by `check` is cached and delivered.
	pub fn with_check(
		transport: SharedTransport,
		store: Arc<dyn ResourceStore>,
		limit: usize,
		check: ContentCheck,
		token: CancellationToken,
	) -> FetchCache {
		Self::spawn(transport, store, limit, Some(check), token)
	}

	fn spawn(
		transport: SharedTransport,
		store: Arc<dyn ResourceStore>,
		limit: usize,
		check: Option<ContentCheck>,
		token: CancellationToken,
	) -> FetchCache {
		let limit = limit.max(1);
		let stats = Arc::new(Mutex::new(FetchStats::default()));
		let (requests, receiver) = mpsc::unbounded_channel();

		log::debug!("starting fetch scheduler for {} with {limit} slots", transport.get_name());
		let scheduler = Scheduler::new(transport, store, limit, check, stats.clone());
		tokio::spawn(scheduler.run(receiver, token));

		FetchCache { requests, stats }
	}

	/// Registers a request for `key`.
	///
	/// Requests are admitted in the order `submit` is called. The content, even when it is
	/// already cached, is only delivered through the returned [`PendingResolve`].
	pub fn submit(&self, key: ResourceKey) -> PendingResolve {
		let (waiter, receiver) = oneshot::channel();
		if let Err(mpsc::error::SendError(request)) = self.requests.send(Request { key, waiter }) {
			// the waiter goes down with the request, `wait` reports the request as cancelled
			log::debug!("fetch scheduler is gone, dropping request for '{}'", request.key);
		}
		PendingResolve { receiver }
	}

	/// Resolves `key` to its content, fetching it if necessary.
	pub async fn resolve(&self, key: ResourceKey, token: &CancellationToken) -> Result<Blob> {
		self.submit(key).wait(token).await
	}

	pub fn stats(&self) -> FetchStats {
		*self.stats.lock()
	}
}

/// A submitted request whose content has not been awaited yet.
#[derive(Debug)]
pub struct PendingResolve {
	receiver: oneshot::Receiver<Reply>,
}

impl PendingResolve {
	/// Waits for the content. Fails with [`MosaicError::Transport`] if the fetch failed and
	/// with [`MosaicError::Cancelled`] once `token` fires or the scheduler has stopped.
	pub async fn wait(self, token: &CancellationToken) -> Result<Blob> {
		tokio::select! {
			biased;
			() = token.cancelled() => Err(MosaicError::Cancelled.into()),
			reply = self.receiver => match reply {
				Ok(Ok(content)) => Ok(content),
				Ok(Err(err)) => Err(err.into()),
				Err(_) => Err(MosaicError::Cancelled.into()),
			},
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{MemoryStore, Transport};
	use anyhow::{bail, ensure};
	use async_trait::async_trait;
	use futures::future::join_all;
	use pretty_assertions::assert_eq;
	use std::{
		collections::HashSet,
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration,
	};
	use tokio::sync::Semaphore;

	/// Echoes the key as content. Calls block on `gate` when one is set.
	#[derive(Debug, Default)]
	struct MockTransport {
		calls: AtomicUsize,
		current: AtomicUsize,
		peak: AtomicUsize,
		order: Mutex<Vec<String>>,
		fail_once: Mutex<HashSet<String>>,
		/// Keys answered once with an error page instead of their content.
		garbage_once: Mutex<HashSet<String>>,
		gate: Option<Arc<Semaphore>>,
		delay: Option<Duration>,
	}

	impl MockTransport {
		fn gated() -> (Arc<MockTransport>, Arc<Semaphore>) {
			let gate = Arc::new(Semaphore::new(0));
			let transport = MockTransport {
				gate: Some(gate.clone()),
				..Default::default()
			};
			(Arc::new(transport), gate)
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl Transport for MockTransport {
		async fn fetch(&self, key: &ResourceKey) -> Result<Blob> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.order.lock().push(key.to_string());
			let current = self.current.fetch_add(1, Ordering::SeqCst) + 1;
			self.peak.fetch_max(current, Ordering::SeqCst);

			if let Some(gate) = &self.gate {
				gate.acquire().await?.forget();
			}
			if let Some(delay) = self.delay {
				tokio::time::sleep(delay).await;
			}

			self.current.fetch_sub(1, Ordering::SeqCst);
			if self.fail_once.lock().remove(key.as_str()) {
				bail!("connection reset");
			}
			if self.garbage_once.lock().remove(key.as_str()) {
				return Ok(Blob::from("<html>502</html>"));
			}
			Ok(Blob::from(key.as_str()))
		}

		fn get_name(&self) -> &str {
			"mock"
		}
	}

	fn cache_with(transport: Arc<MockTransport>, limit: usize) -> (FetchCache, CancellationToken) {
		let token = CancellationToken::new();
		let cache = FetchCache::new(transport, Arc::new(MemoryStore::new()), limit, token.clone());
		(cache, token)
	}

	fn rejects_markup() -> ContentCheck {
		Arc::new(|content: &Blob| {
			ensure!(!content.as_slice().starts_with(b"<html>"), "not a color swatch");
			Ok(())
		})
	}

	async fn wait_for_requests(cache: &FetchCache, count: u64) {
		while cache.stats().requests < count {
			tokio::time::sleep(Duration::from_millis(1)).await;
		}
	}

	#[tokio::test]
	async fn coalesces_requests_for_one_key() -> Result<()> {
		let (transport, gate) = MockTransport::gated();
		let (cache, token) = cache_with(transport.clone(), 8);

		let pending: Vec<_> = (0..10).map(|_| cache.submit(ResourceKey::from("/color/ff0000"))).collect();
		wait_for_requests(&cache, 10).await;
		gate.add_permits(100);

		let results = join_all(pending.into_iter().map(|p| p.wait(&token))).await;
		for result in results {
			assert_eq!(result?, Blob::from("/color/ff0000"));
		}
		assert_eq!(transport.calls(), 1);
		assert_eq!(cache.stats().coalesced, 9);
		Ok(())
	}

	#[tokio::test]
	async fn never_exceeds_the_ceiling() -> Result<()> {
		let transport = Arc::new(MockTransport {
			delay: Some(Duration::from_millis(5)),
			..Default::default()
		});
		let (cache, token) = cache_with(transport.clone(), 3);

		let keys: Vec<_> = (0..20).map(|i| ResourceKey::from(format!("/color/{i:06x}"))).collect();
		let results = join_all(keys.iter().map(|key| cache.resolve(key.clone(), &token))).await;
		assert!(results.iter().all(Result::is_ok));

		assert_eq!(transport.calls(), 20);
		assert!(transport.peak.load(Ordering::SeqCst) <= 3);
		assert!(cache.stats().peak_in_flight <= 3);
		Ok(())
	}

	#[tokio::test]
	async fn overflow_is_served_in_arrival_order() -> Result<()> {
		let (transport, gate) = MockTransport::gated();
		let (cache, token) = cache_with(transport.clone(), 1);

		let names = ["a", "b", "c", "d"];
		let pending: Vec<_> = names.iter().map(|n| cache.submit(ResourceKey::from(*n))).collect();
		wait_for_requests(&cache, 4).await;
		assert_eq!(cache.stats().queued, 3);
		gate.add_permits(4);

		for result in join_all(pending.into_iter().map(|p| p.wait(&token))).await {
			result?;
		}
		assert_eq!(*transport.order.lock(), names);
		assert_eq!(transport.peak.load(Ordering::SeqCst), 1);
		Ok(())
	}

	#[tokio::test]
	async fn requeued_requests_hit_the_memory_cache() -> Result<()> {
		let (transport, gate) = MockTransport::gated();
		let (cache, token) = cache_with(transport.clone(), 1);

		let names = ["a", "b", "c", "b"];
		let pending: Vec<_> = names.iter().map(|n| cache.submit(ResourceKey::from(*n))).collect();
		wait_for_requests(&cache, 4).await;
		assert_eq!(cache.stats().queued, 3);
		gate.add_permits(10);

		let results = join_all(pending.into_iter().map(|p| p.wait(&token))).await;
		for (name, result) in names.iter().zip(results) {
			assert_eq!(result?, Blob::from(*name));
		}
		assert_eq!(transport.calls(), 3);
		assert_eq!(*transport.order.lock(), ["a", "b", "c"]);
		assert_eq!(cache.stats().memory_hits, 1);
		Ok(())
	}

	#[tokio::test]
	async fn cached_keys_are_never_fetched_again() -> Result<()> {
		let transport = Arc::new(MockTransport::default());
		let (cache, token) = cache_with(transport.clone(), 8);
		let key = ResourceKey::from("/color/123456");

		let first = cache.resolve(key.clone(), &token).await?;
		let second = cache.resolve(key, &token).await?;
		assert_eq!(first, second);
		assert_eq!(transport.calls(), 1);
		assert_eq!(cache.stats().memory_hits, 1);
		Ok(())
	}

	#[tokio::test]
	async fn store_hits_skip_the_transport() -> Result<()> {
		let transport = Arc::new(MockTransport::default());
		let store = Arc::new(MemoryStore::new());
		let key = ResourceKey::from("/color/abcdef");
		store.set(&key, &Blob::from("stored"))?;

		let token = CancellationToken::new();
		let cache = FetchCache::new(transport.clone(), store, 8, token.clone());
		assert_eq!(cache.resolve(key.clone(), &token).await?, Blob::from("stored"));
		assert_eq!(cache.resolve(key, &token).await?, Blob::from("stored"));

		assert_eq!(transport.calls(), 0);
		let stats = cache.stats();
		assert_eq!((stats.store_hits, stats.memory_hits), (1, 1));
		Ok(())
	}

	#[tokio::test]
	async fn fetched_content_is_written_to_the_store() -> Result<()> {
		let transport = Arc::new(MockTransport::default());
		let store = Arc::new(MemoryStore::new());
		let token = CancellationToken::new();
		let cache = FetchCache::new(transport, store.clone(), 8, token.clone());

		let key = ResourceKey::from("/color/000000");
		cache.resolve(key.clone(), &token).await?;
		assert_eq!(store.get(&key)?, Some(Blob::from("/color/000000")));
		Ok(())
	}

	#[tokio::test]
	async fn failures_reach_every_waiter_and_are_retried() -> Result<()> {
		let (transport, gate) = MockTransport::gated();
		transport.fail_once.lock().insert("/color/ffffff".to_string());
		let (cache, token) = cache_with(transport.clone(), 8);
		let key = ResourceKey::from("/color/ffffff");

		let first = cache.submit(key.clone());
		let second = cache.submit(key.clone());
		wait_for_requests(&cache, 2).await;
		gate.add_permits(10);

		for result in [first.wait(&token).await, second.wait(&token).await] {
			let err = result.unwrap_err();
			assert!(matches!(
				err.downcast_ref::<MosaicError>(),
				Some(MosaicError::Transport { key, .. }) if key == "/color/ffffff"
			));
		}

		assert_eq!(cache.resolve(key, &token).await?, Blob::from("/color/ffffff"));
		assert_eq!(transport.calls(), 2);
		assert_eq!(cache.stats().failures, 1);
		Ok(())
	}

	#[tokio::test]
	async fn rejected_content_is_neither_cached_nor_stored() -> Result<()> {
		let transport = Arc::new(MockTransport::default());
		transport.garbage_once.lock().insert("/color/00ff00".to_string());
		let store = Arc::new(MemoryStore::new());
		let token = CancellationToken::new();
		let cache = FetchCache::with_check(transport.clone(), store.clone(), 8, rejects_markup(), token.clone());
		let key = ResourceKey::from("/color/00ff00");

		let err = cache.resolve(key.clone(), &token).await.unwrap_err();
		assert!(matches!(
			err.downcast_ref::<MosaicError>(),
			Some(MosaicError::Transport { key, .. }) if key == "/color/00ff00"
		));
		assert_eq!(store.get(&key)?, None);
		assert_eq!(cache.stats().failures, 1);

		assert_eq!(cache.resolve(key.clone(), &token).await?, Blob::from("/color/00ff00"));
		assert_eq!(transport.calls(), 2);
		assert_eq!(store.get(&key)?, Some(Blob::from("/color/00ff00")));
		Ok(())
	}

	#[tokio::test]
	async fn rejected_stored_content_is_fetched_again() -> Result<()> {
		let transport = Arc::new(MockTransport::default());
		let store = Arc::new(MemoryStore::new());
		let key = ResourceKey::from("/color/0000ff");
		store.set(&key, &Blob::from("<html>502</html>"))?;

		let token = CancellationToken::new();
		let cache = FetchCache::with_check(transport.clone(), store.clone(), 8, rejects_markup(), token.clone());
		assert_eq!(cache.resolve(key.clone(), &token).await?, Blob::from("/color/0000ff"));

		assert_eq!(transport.calls(), 1);
		assert_eq!(cache.stats().store_hits, 0);
		assert_eq!(store.get(&key)?, Some(Blob::from("/color/0000ff")));
		Ok(())
	}

	#[tokio::test]
	async fn cancellation_ends_pending_requests() {
		let (transport, _gate) = MockTransport::gated();
		let (cache, token) = cache_with(transport, 8);

		let pending = cache.submit(ResourceKey::from("/color/010101"));
		token.cancel();
		let err = pending.wait(&token).await.unwrap_err();
		assert!(MosaicError::is_cancelled(&err));

		// the scheduler is gone, new requests are cancelled as well
		let err = cache
			.resolve(ResourceKey::from("/color/020202"), &CancellationToken::new())
			.await
			.unwrap_err();
		assert!(MosaicError::is_cancelled(&err));
	}
}
