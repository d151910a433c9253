//! In-memory result store with request de-duplication and tag invalidation.
//!
//! One `Store` holds one kind of value (list pages or single records) for
//! one resource. Entries are keyed by the digest of a [`ResourceKey`].
//! Identical fetches share one in-flight request; invalidating a tag marks
//! every entry that provides it stale and wakes subscribed queries through
//! a `watch` channel.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, trace};

use super::keys::{ResourceKey, Tag};
use crate::api::ApiError;

/// How long an entry nobody subscribes to survives.
pub const KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, ApiError>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
  Pending,
  Resolved,
  Error,
}

struct Inflight<V> {
  request: u64,
  epoch: u64,
  future: SharedFetch<V>,
}

struct Entry<V> {
  description: String,
  value: Option<V>,
  status: EntryStatus,
  base_tags: Vec<Tag>,
  tags: Vec<Tag>,
  stale: bool,
  epoch: u64,
  subscribers: usize,
  idle_since: Option<Instant>,
  inflight: Option<Inflight<V>>,
  settled: u64,
}

impl<V> Entry<V> {
  fn new(key: &ResourceKey) -> Self {
    let base_tags = key.base_tags();
    Self {
      description: key.description(),
      value: None,
      status: EntryStatus::Pending,
      tags: base_tags.clone(),
      base_tags,
      stale: false,
      epoch: 0,
      subscribers: 0,
      idle_since: Some(Instant::now()),
      inflight: None,
      settled: 0,
    }
  }

  fn is_fresh(&self) -> bool {
    self.status == EntryStatus::Resolved && !self.stale && self.value.is_some()
  }

  fn current_inflight(&self) -> Option<&Inflight<V>> {
    self.inflight.as_ref().filter(|i| i.epoch == self.epoch)
  }

  fn is_collectable(&self, keep_unused_for: Duration) -> bool {
    self.subscribers == 0
      && self.inflight.is_none()
      && self
        .idle_since
        .map(|t| t.elapsed() >= keep_unused_for)
        .unwrap_or(false)
  }
}

struct StoreInner<V> {
  name: &'static str,
  entries: Mutex<HashMap<String, Entry<V>>>,
  generation: watch::Sender<u64>,
  provides: fn(&V) -> Vec<Tag>,
  keep_unused_for: Duration,
  next_request: AtomicU64,
}

impl<V> StoreInner<V> {
  fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<V>>> {
    // A panic while holding the lock leaves plain data behind; keep going.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }
}

/// The part of a store a [`Subscription`] needs, without the value type.
trait Subscribable: Send + Sync {
  fn needs_refetch(&self, hash: &str) -> bool;
  fn unsubscribe(&self, hash: &str);
}

impl<V: Send + Sync> Subscribable for StoreInner<V> {
  fn needs_refetch(&self, hash: &str) -> bool {
    self
      .lock()
      .get(hash)
      .map(|e| e.stale && e.current_inflight().is_none())
      .unwrap_or(false)
  }

  fn unsubscribe(&self, hash: &str) {
    if let Some(entry) = self.lock().get_mut(hash) {
      entry.subscribers = entry.subscribers.saturating_sub(1);
      if entry.subscribers == 0 {
        entry.idle_since = Some(Instant::now());
      }
    }
  }
}

/// A consumer's interest in one entry. Keeps the entry alive and reports
/// when an invalidation made it stale. Dropping it unsubscribes.
pub struct Subscription {
  hash: String,
  store: Arc<dyn Subscribable>,
  generation: watch::Receiver<u64>,
}

impl Subscription {
  /// True once after an invalidation left this entry stale with no fresh
  /// request on the way.
  pub fn needs_refetch(&mut self) -> bool {
    match self.generation.has_changed() {
      Ok(true) => {
        self.generation.borrow_and_update();
        self.store.needs_refetch(&self.hash)
      }
      _ => false,
    }
  }
}

impl Drop for Subscription {
  fn drop(&mut self) {
    self.store.unsubscribe(&self.hash);
  }
}

impl std::fmt::Debug for Subscription {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("hash", &self.hash)
      .finish_non_exhaustive()
  }
}

pub struct Store<V>(Arc<StoreInner<V>>);

impl<V> Clone for Store<V> {
  fn clone(&self) -> Self {
    Self(Arc::clone(&self.0))
  }
}

impl<V> Store<V>
where
  V: Clone + Send + Sync + 'static,
{
  /// `provides` lists the tags a settled value carries on top of the
  /// key's own tags.
  pub fn new(name: &'static str, provides: fn(&V) -> Vec<Tag>) -> Self {
    let (generation, _) = watch::channel(0);
    Self(Arc::new(StoreInner {
      name,
      entries: Mutex::new(HashMap::new()),
      generation,
      provides,
      keep_unused_for: KEEP_UNUSED_FOR,
      next_request: AtomicU64::new(1),
    }))
  }

  /// Return the cached value for `key`, or run `fetcher`.
  ///
  /// A fresh value is returned without a request unless `force` is set.
  /// If a request for the same key and epoch is already in flight, this
  /// call waits on it instead of issuing another. A result that settles
  /// after an invalidation is stored but stays stale.
  pub async fn fetch<F, Fut>(&self, key: &ResourceKey, force: bool, fetcher: F) -> Result<V, ApiError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
  {
    let hash = key.cache_hash();

    let (request, epoch, future) = {
      let mut entries = self.0.lock();
      collect(&mut entries, self.0.keep_unused_for);

      let entry = entries.entry(hash.clone()).or_insert_with(|| Entry::new(key));

      if !force && entry.is_fresh() {
        if let Some(value) = &entry.value {
          trace!(store = self.0.name, key = %entry.description, "cache hit");
          return Ok(value.clone());
        }
      }

      match entry.current_inflight() {
        Some(inflight) => {
          debug!(store = self.0.name, key = %entry.description, "joining in-flight request");
          (inflight.request, inflight.epoch, inflight.future.clone())
        }
        None => {
          let request = self.0.next_request.fetch_add(1, Ordering::Relaxed);
          let future = fetcher().boxed().shared();
          debug!(store = self.0.name, key = %entry.description, request, force, "fetching");
          entry.inflight = Some(Inflight {
            request,
            epoch: entry.epoch,
            future: future.clone(),
          });
          if entry.value.is_none() {
            entry.status = EntryStatus::Pending;
          }
          (request, entry.epoch, future)
        }
      }
    };

    let result = future.await;
    self.settle(key, &hash, request, epoch, &result);
    result
  }

  /// Record the outcome of `request`. Every waiter calls this; only the
  /// first call for a request applies, and an older request never
  /// overwrites a newer one.
  fn settle(
    &self,
    key: &ResourceKey,
    hash: &str,
    request: u64,
    epoch: u64,
    result: &Result<V, ApiError>,
  ) {
    let mut entries = self.0.lock();
    let entry = entries
      .entry(hash.to_string())
      .or_insert_with(|| Entry::new(key));

    if entry.inflight.as_ref().map(|i| i.request) == Some(request) {
      entry.inflight = None;
    }
    if request <= entry.settled {
      return;
    }
    entry.settled = request;

    match result {
      Ok(value) => {
        let mut tags = entry.base_tags.clone();
        tags.extend((self.0.provides)(value));
        entry.tags = tags;
        entry.value = Some(value.clone());
        entry.status = EntryStatus::Resolved;
      }
      Err(e) => {
        debug!(store = self.0.name, key = %entry.description, "fetch failed: {}", e);
        entry.status = EntryStatus::Error;
      }
    }
    entry.stale = epoch != entry.epoch;

    if entry.subscribers == 0 {
      entry.idle_since = Some(Instant::now());
    }
  }

  /// Mark every entry providing any of `tags` stale and notify
  /// subscribers. Returns how many entries were affected.
  pub fn invalidate(&self, tags: &[Tag]) -> usize {
    let mut affected = 0;
    {
      let mut entries = self.0.lock();
      for entry in entries.values_mut() {
        if entry.tags.iter().any(|t| tags.contains(t)) {
          entry.stale = true;
          entry.epoch += 1;
          affected += 1;
        }
      }
    }

    if affected > 0 {
      debug!(store = self.0.name, ?tags, affected, "invalidated");
      self.0.generation.send_modify(|g| *g += 1);
    }
    affected
  }

  /// Register interest in `key`. The entry is kept until the returned
  /// subscription is dropped.
  pub fn subscribe(&self, key: &ResourceKey) -> Subscription {
    let hash = key.cache_hash();
    {
      let mut entries = self.0.lock();
      collect(&mut entries, self.0.keep_unused_for);
      let entry = entries.entry(hash.clone()).or_insert_with(|| Entry::new(key));
      entry.subscribers += 1;
      entry.idle_since = None;
    }

    let mut generation = self.0.generation.subscribe();
    generation.borrow_and_update();

    Subscription {
      hash,
      store: self.0.clone(),
      generation,
    }
  }
}

/// Inspection helpers for tests.
#[cfg(test)]
impl<V: Clone> Store<V> {
  /// Only valid before the store is shared.
  pub fn with_keep_unused_for(self, keep_unused_for: Duration) -> Self {
    match Arc::try_unwrap(self.0) {
      Ok(mut inner) => {
        inner.keep_unused_for = keep_unused_for;
        Self(Arc::new(inner))
      }
      Err(shared) => Self(shared),
    }
  }

  /// Drop entries that have been unused for longer than `keep_unused_for`.
  pub fn collect_garbage(&self) -> usize {
    collect(&mut self.0.lock(), self.0.keep_unused_for)
  }

  pub fn peek(&self, key: &ResourceKey) -> Option<V> {
    self
      .0
      .lock()
      .get(&key.cache_hash())
      .and_then(|e| e.value.clone())
  }

  pub fn status(&self, key: &ResourceKey) -> Option<EntryStatus> {
    self.0.lock().get(&key.cache_hash()).map(|e| e.status)
  }

  pub fn is_stale(&self, key: &ResourceKey) -> bool {
    self
      .0
      .lock()
      .get(&key.cache_hash())
      .map(|e| e.stale)
      .unwrap_or(false)
  }

  pub fn subscriber_count(&self, key: &ResourceKey) -> usize {
    self
      .0
      .lock()
      .get(&key.cache_hash())
      .map(|e| e.subscribers)
      .unwrap_or(0)
  }

  pub fn len(&self) -> usize {
    self.0.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn collect<V>(entries: &mut HashMap<String, Entry<V>>, keep_unused_for: Duration) -> usize {
  let before = entries.len();
  entries.retain(|_, e| !e.is_collectable(keep_unused_for));
  let removed = before - entries.len();
  if removed > 0 {
    trace!(removed, "evicted unused cache entries");
  }
  removed
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::ListQuery;
  use std::sync::atomic::AtomicU32;

  fn numbers() -> Store<Vec<u32>> {
    Store::new("numbers", |v: &Vec<u32>| {
      v.iter()
        .map(|n| Tag::Item("numbers", n.to_string()))
        .collect()
    })
  }

  fn page(n: u32) -> ResourceKey {
    ResourceKey::list("numbers", ListQuery::default().with_page(n))
  }

  fn counting(
    calls: &Arc<AtomicU32>,
    value: Vec<u32>,
  ) -> impl Future<Output = Result<Vec<u32>, ApiError>> + Send + 'static {
    let calls = calls.clone();
    async move {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(value)
    }
  }

  #[tokio::test]
  async fn test_fresh_value_is_served_from_cache() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    let first = store.fetch(&page(1), false, || counting(&calls, vec![1, 2])).await;
    let second = store.fetch(&page(1), false, || counting(&calls, vec![9])).await;

    assert_eq!(first, Ok(vec![1, 2]));
    assert_eq!(second, Ok(vec![1, 2]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_force_bypasses_fresh_value() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    let forced = store.fetch(&page(1), true, || counting(&calls, vec![2])).await;

    assert_eq!(forced, Ok(vec![2]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_concurrent_identical_fetches_share_one_request() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    let slow = |calls: &Arc<AtomicU32>| {
      let calls = calls.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok::<_, ApiError>(vec![7])
      }
    };

    let key = page(1);
    let (a, b) = tokio::join!(
      store.fetch(&key, false, || slow(&calls)),
      store.fetch(&key, false, || slow(&calls)),
    );

    assert_eq!(a, Ok(vec![7]));
    assert_eq!(b, Ok(vec![7]));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_distinct_keys_fetch_separately() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    store.fetch(&page(2), false, || counting(&calls, vec![2])).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.len(), 2);
  }

  #[tokio::test]
  async fn test_invalidate_by_list_tag_marks_stale() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    assert!(!store.is_stale(&page(1)));

    assert_eq!(store.invalidate(&[Tag::List("numbers")]), 1);
    assert!(store.is_stale(&page(1)));

    // Stale data is never served as fresh
    let refetched = store.fetch(&page(1), false, || counting(&calls, vec![3])).await;
    assert_eq!(refetched, Ok(vec![3]));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(!store.is_stale(&page(1)));
  }

  #[tokio::test]
  async fn test_invalidate_by_provided_item_tag() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1, 2])).await.unwrap();
    store.fetch(&page(2), false, || counting(&calls, vec![3])).await.unwrap();

    assert_eq!(store.invalidate(&[Tag::Item("numbers", "2".to_string())]), 1);
    assert!(store.is_stale(&page(1)));
    assert!(!store.is_stale(&page(2)));
  }

  #[tokio::test]
  async fn test_invalidate_unrelated_tag_is_noop() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));
    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();

    assert_eq!(store.invalidate(&[Tag::List("other")]), 0);
    assert!(!store.is_stale(&page(1)));
  }

  #[tokio::test]
  async fn test_result_settled_after_invalidation_stays_stale() {
    let store = numbers();
    let key = page(1);

    let fetch = store.fetch(&key, false, || async {
      tokio::time::sleep(Duration::from_millis(30)).await;
      Ok::<_, ApiError>(vec![1])
    });
    let invalidate = async {
      tokio::time::sleep(Duration::from_millis(5)).await;
      store.invalidate(&[Tag::List("numbers")]);
    };
    let (result, _) = tokio::join!(fetch, invalidate);

    assert_eq!(result, Ok(vec![1]));
    assert!(store.is_stale(&key));
  }

  #[tokio::test]
  async fn test_error_keeps_previous_value() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    let err = store
      .fetch(&page(1), true, || async {
        Err::<Vec<u32>, _>(ApiError::Network("down".to_string()))
      })
      .await;

    assert!(err.is_err());
    assert_eq!(store.status(&page(1)), Some(EntryStatus::Error));
    assert_eq!(store.peek(&page(1)), Some(vec![1]));
  }

  #[tokio::test]
  async fn test_subscription_reports_invalidation_once() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));
    let mut subscription = store.subscribe(&page(1));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    assert!(!subscription.needs_refetch());

    store.invalidate(&[Tag::List("numbers")]);
    assert!(subscription.needs_refetch());
    assert!(!subscription.needs_refetch());
  }

  #[tokio::test]
  async fn test_subscription_ignores_other_entries() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));
    let mut subscription = store.subscribe(&page(2));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    store.fetch(&page(2), false, || counting(&calls, vec![2])).await.unwrap();
    store.invalidate(&[Tag::Item("numbers", "1".to_string())]);

    assert!(!subscription.needs_refetch());
  }

  #[tokio::test]
  async fn test_unsubscribed_entries_are_collected() {
    let store = numbers().with_keep_unused_for(Duration::ZERO);
    let calls = Arc::new(AtomicU32::new(0));

    let subscription = store.subscribe(&page(1));
    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    assert_eq!(store.subscriber_count(&page(1)), 1);
    assert_eq!(store.collect_garbage(), 0);

    drop(subscription);
    assert_eq!(store.subscriber_count(&page(1)), 0);
    assert_eq!(store.collect_garbage(), 1);
    assert!(store.is_empty());
  }

  #[tokio::test]
  async fn test_unused_entries_survive_keep_window() {
    let store = numbers();
    let calls = Arc::new(AtomicU32::new(0));

    store.fetch(&page(1), false, || counting(&calls, vec![1])).await.unwrap();
    assert_eq!(store.collect_garbage(), 0);
    assert_eq!(store.peek(&page(1)), Some(vec![1]));
  }
}
