//! Poll-based handles for async reads and writes.
//!
//! `Query<T>` runs a fetcher on the tokio runtime and hands the outcome
//! back through a channel that the UI drains on every tick. It keeps the
//! last good value while a refetch is in flight or after a failure, so a
//! list never flashes empty. When built from the cache it also carries a
//! [`Subscription`] and refetches by itself after an invalidation.
//!
//! ```ignore
//! let mut query = api.use_list(ListQuery::default());
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//! ```

use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};

use crate::api::ApiError;
use crate::cache::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Not started
  Idle,
  /// A request is in flight
  Loading,
  /// The latest request succeeded
  Loaded,
  /// The latest request failed
  Error,
}

/// A factory for fetch futures. The flag asks the cache to bypass a fresh
/// entry.
type FetcherFn<T> = Box<dyn Fn(bool) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

pub struct Query<T> {
  status: QueryStatus,
  data: Option<T>,
  error: Option<ApiError>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, ApiError>>>,
  fetched_at: Option<Instant>,
  subscription: Option<Subscription>,
}

impl<T: Send + 'static> Query<T> {
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn(bool) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      fetcher: Box::new(move |force| fetcher(force).boxed()),
      receiver: None,
      fetched_at: None,
      subscription: None,
    }
  }

  /// Refetch automatically when the subscribed cache entry is invalidated.
  pub fn with_subscription(mut self, subscription: Subscription) -> Self {
    self.subscription = Some(subscription);
    self
  }

  #[cfg(test)]
  pub fn status(&self) -> QueryStatus {
    self.status
  }

  /// The latest successful value, kept across refetches and failures.
  pub fn data(&self) -> Option<&T> {
    self.data.as_ref()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.error.as_ref()
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  #[cfg(test)]
  /// Loading with nothing to show yet.
  pub fn is_initial_loading(&self) -> bool {
    self.is_loading() && self.data.is_none()
  }

  pub fn is_success(&self) -> bool {
    self.status == QueryStatus::Loaded
  }

  #[cfg(test)]
  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  /// Start fetching unless a request is already in flight. A fresh cache
  /// entry answers without touching the network.
  pub fn fetch(&mut self) {
    if self.is_loading() {
      return;
    }
    self.start_fetch(false);
  }

  /// Fetch again, bypassing fresh cache state. Whatever data is shown
  /// stays until the new result arrives.
  pub fn refetch(&mut self) {
    // Drop the receiver so a slower earlier response is ignored
    self.receiver = None;
    self.start_fetch(true);
  }

  /// Drain a finished fetch and react to invalidations.
  ///
  /// Returns `true` if the state changed. Call this on every tick.
  pub fn poll(&mut self) -> bool {
    let mut changed = false;

    if let Some(subscription) = &mut self.subscription {
      if subscription.needs_refetch() {
        self.receiver = None;
        self.start_fetch(false);
        changed = true;
      }
    }

    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return changed,
    };

    match receiver.try_recv() {
      Ok(Ok(data)) => {
        self.data = Some(data);
        self.error = None;
        self.status = QueryStatus::Loaded;
        self.fetched_at = Some(Instant::now());
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.error = Some(error);
        self.status = QueryStatus::Error;
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => changed,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending
        self.error = Some(ApiError::Network("request was cancelled".to_string()));
        self.status = QueryStatus::Error;
        self.receiver = None;
        true
      }
    }
  }

  fn start_fetch(&mut self, force: bool) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.status = QueryStatus::Loading;

    let future = (self.fetcher)(force);
    tokio::spawn(async move {
      let result = future.await;
      // Receiver may have been dropped by a refetch
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("status", &self.status)
      .field("data", &self.data)
      .field("error", &self.error)
      .field("fetched_at", &self.fetched_at)
      .finish_non_exhaustive()
  }
}

/// A single write in flight. Unlike a query it is never cached or retried.
pub struct Mutation<T> {
  receiver: Option<oneshot::Receiver<Result<T, ApiError>>>,
}

impl<T> Default for Mutation<T> {
  fn default() -> Self {
    Self { receiver: None }
  }
}

impl<T: Send + 'static> Mutation<T> {
  pub fn spawn<Fut>(future: Fut) -> Self
  where
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(future.await);
    });
    Self { receiver: Some(rx) }
  }

  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// The outcome, once. `None` while pending or when nothing was started.
  pub fn poll(&mut self) -> Option<Result<T, ApiError>> {
    let receiver = self.receiver.as_mut()?;
    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.receiver = None;
        Some(Err(ApiError::Network("request was cancelled".to_string())))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{ResourceKey, Store, Tag};
  use crate::api::ListQuery;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test]
  async fn test_query_success() {
    let mut query = Query::new(|_| async { Ok(vec![1, 2, 3]) });

    assert_eq!(query.status(), QueryStatus::Idle);

    query.fetch();
    assert!(query.is_loading());
    assert!(query.is_initial_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_query_error() {
    let mut query: Query<i32> =
      Query::new(|_| async { Err(ApiError::Network("connection refused".to_string())) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(query.poll());
    assert!(query.is_error());
    assert_eq!(
      query.error(),
      Some(&ApiError::Network("connection refused".to_string()))
    );
  }

  #[tokio::test]
  async fn test_refetch_keeps_previous_data_visible() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move |_| {
      let counter = counter_clone.clone();
      async move {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        if n > 0 {
          tokio::time::sleep(Duration::from_millis(50)).await;
        }
        Ok(n)
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    query.refetch();
    assert!(query.is_loading());
    assert!(!query.is_initial_loading());
    assert_eq!(query.data(), Some(&0));

    tokio::time::sleep(Duration::from_millis(100)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_error_keeps_previous_data() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move |_| {
      let counter = counter_clone.clone();
      async move {
        match counter.fetch_add(1, Ordering::SeqCst) {
          0 => Ok("first"),
          _ => Err(ApiError::Http {
            status: 500,
            message: None,
          }),
        }
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    query.refetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();

    assert!(query.is_error());
    assert_eq!(query.data(), Some(&"first"));
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move |_| {
      let counter = counter_clone.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(42)
      }
    });

    query.fetch();
    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_ignores_pending_response() {
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let mut query = Query::new(move |_| {
      let counter = counter_clone.clone();
      async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(counter.fetch_add(1, Ordering::SeqCst))
      }
    });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;

    query.refetch();
    tokio::time::sleep(Duration::from_millis(100)).await;

    query.poll();
    // Only the second fetch is received
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_refetch_passes_force() {
    let mut query = Query::new(|force| async move { Ok(force) });

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&false));

    query.refetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&true));
  }

  #[tokio::test]
  async fn test_invalidation_triggers_refetch() {
    let store: Store<u32> = Store::new("numbers", |_| Vec::new());
    let key = ResourceKey::list("numbers", ListQuery::default());
    let calls = Arc::new(AtomicU32::new(0));

    let fetcher_store = store.clone();
    let fetcher_key = key.clone();
    let fetcher_calls = calls.clone();
    let mut query = Query::new(move |force| {
      let store = fetcher_store.clone();
      let key = fetcher_key.clone();
      let calls = fetcher_calls.clone();
      async move {
        store
          .fetch(&key, force, move || async move {
            Ok(calls.fetch_add(1, Ordering::SeqCst))
          })
          .await
      }
    })
    .with_subscription(store.subscribe(&key));

    query.fetch();
    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&0));

    // Nothing changed: polling does not refetch
    assert!(!query.poll());

    store.invalidate(&[Tag::List("numbers")]);
    assert!(query.poll());
    assert!(query.is_loading());

    tokio::time::sleep(Duration::from_millis(10)).await;
    query.poll();
    assert_eq!(query.data(), Some(&1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_mutation_reports_once() {
    let mut mutation = Mutation::spawn(async { Ok(7) });
    assert!(mutation.is_pending());

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(mutation.poll(), Some(Ok(7)));
    assert!(!mutation.is_pending());
    assert_eq!(mutation.poll(), None);
  }

  #[test]
  fn test_idle_mutation() {
    let mut mutation: Mutation<()> = Mutation::default();
    assert!(!mutation.is_pending());
    assert_eq!(mutation.poll(), None);
  }
}
