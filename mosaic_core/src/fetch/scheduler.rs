use super::{ContentCheck, FetchStats};
use crate::{Blob, MosaicError, ResourceKey, ResourceStore, SharedTransport};
use anyhow::Context;
use futures::{FutureExt, StreamExt, future::BoxFuture, stream::FuturesUnordered};
use parking_lot::Mutex;
use std::{
	collections::{HashMap, VecDeque},
	sync::Arc,
};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

pub(super) type Reply = Result<Blob, MosaicError>;
pub(super) type Waiter = oneshot::Sender<Reply>;

pub(super) struct Request {
	pub key: ResourceKey,
	pub waiter: Waiter,
}

type Completion = (ResourceKey, anyhow::Result<Blob>);

/// Owner of all fetch bookkeeping. Runs as one task, requests arrive over a channel.
pub(super) struct Scheduler {
	transport: SharedTransport,
	store: Arc<dyn ResourceStore>,
	limit: usize,
	check: Option<ContentCheck>,
	memory: HashMap<ResourceKey, Blob>,
	/// Waiters of every key with an outstanding transport call, in registration order.
	in_flight: HashMap<ResourceKey, Vec<Waiter>>,
	queue: VecDeque<Request>,
	active: usize,
	fetches: FuturesUnordered<BoxFuture<'static, Completion>>,
	stats: Arc<Mutex<FetchStats>>,
}

impl Scheduler {
	pub fn new(
		transport: SharedTransport,
		store: Arc<dyn ResourceStore>,
		limit: usize,
		check: Option<ContentCheck>,
		stats: Arc<Mutex<FetchStats>>,
	) -> Scheduler {
		Scheduler {
			transport,
			store,
			limit,
			check,
			memory: HashMap::new(),
			in_flight: HashMap::new(),
			queue: VecDeque::new(),
			active: 0,
			fetches: FuturesUnordered::new(),
			stats,
		}
	}

	/// Serves requests until every handle is dropped and all transport calls have finished,
	/// or until `token` is cancelled. Cancelling drops in-flight calls and their waiters.
	pub async fn run(mut self, mut requests: mpsc::UnboundedReceiver<Request>, token: CancellationToken) {
		let mut open = true;
		while open || !self.fetches.is_empty() {
			tokio::select! {
				biased;
				() = token.cancelled() => {
					log::debug!(
						"fetch scheduler cancelled with {} transport calls in flight and {} requests queued",
						self.active,
						self.queue.len()
					);
					return;
				}
				request = requests.recv(), if open => match request {
					Some(request) => {
						self.stats.lock().requests += 1;
						self.admit(request);
					}
					None => open = false,
				},
				Some((key, result)) = self.fetches.next(), if !self.fetches.is_empty() => {
					self.complete(key, result);
				}
			}
		}
		log::trace!("fetch scheduler finished: {}", self.stats.lock());
	}

	fn admit(&mut self, request: Request) {
		let Request { key, waiter } = request;

		if let Some(content) = self.memory.get(&key) {
			self.stats.lock().memory_hits += 1;
			let _ = waiter.send(Ok(content.clone()));
			return;
		}

		if let Some(waiters) = self.in_flight.get_mut(&key) {
			self.stats.lock().coalesced += 1;
			waiters.push(waiter);
			return;
		}

		match self.store.get(&key) {
			Ok(Some(content)) => match self.verify(&content) {
				Ok(()) => {
					self.stats.lock().store_hits += 1;
					self.memory.insert(key, content.clone());
					let _ = waiter.send(Ok(content));
					return;
				}
				// fetched again below, the fresh content replaces the stored one
				Err(err) => log::warn!("ignoring stored '{key}': {err:#}"),
			},
			Ok(None) => {}
			Err(err) => log::warn!("reading '{key}' from the store failed: {err:#}"),
		}

		if self.active >= self.limit {
			self.stats.lock().queued += 1;
			self.queue.push_back(Request { key, waiter });
			return;
		}

		self.start(key, waiter);
	}

	fn start(&mut self, key: ResourceKey, waiter: Waiter) {
		self.active += 1;
		{
			let mut stats = self.stats.lock();
			stats.transport_calls += 1;
			stats.peak_in_flight = stats.peak_in_flight.max(self.active);
		}
		log::trace!("fetching '{key}' ({}/{} slots in use)", self.active, self.limit);

		self.in_flight.insert(key.clone(), vec![waiter]);
		let transport = self.transport.clone();
		let check = self.check.clone();
		self.fetches.push(
			async move {
				let result = transport.fetch(&key).await.and_then(|content| {
					if let Some(check) = &check {
						check(&content).context("unusable content")?;
					}
					Ok(content)
				});
				(key, result)
			}
			.boxed(),
		);
	}

	fn verify(&self, content: &Blob) -> anyhow::Result<()> {
		match &self.check {
			Some(check) => check(content),
			None => Ok(()),
		}
	}

	fn complete(&mut self, key: ResourceKey, result: anyhow::Result<Blob>) {
		self.active -= 1;
		let waiters = self.in_flight.remove(&key).unwrap_or_default();

		match result {
			Ok(content) => {
				if let Err(err) = self.store.set(&key, &content) {
					log::warn!("writing '{key}' to the store failed: {err:#}");
				}
				for waiter in waiters {
					let _ = waiter.send(Ok(content.clone()));
				}
				self.memory.insert(key, content);
			}
			Err(err) => {
				// nothing is cached, the next request for this key fetches again
				self.stats.lock().failures += 1;
				log::warn!("fetching '{key}' failed: {err:#}");
				let error = MosaicError::Transport {
					key: key.to_string(),
					message: format!("{err:#}"),
				};
				for waiter in waiters {
					let _ = waiter.send(Err(error.clone()));
				}
			}
		}

		self.pump();
	}

	/// Re-admits queued requests, oldest first, while there is free capacity.
	fn pump(&mut self) {
		while self.active < self.limit {
			let Some(request) = self.queue.pop_front() else {
				break;
			};
			self.admit(request);
		}
	}
}
