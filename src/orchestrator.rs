//! Fetch orchestrator - decides between cache and source for a fetch key.

use crate::controller::FetchController;
use crate::error::Result;
use crate::key::{CanonicalKey, KeyNormalizer};
use crate::observability::{FetchMetrics, NoOpMetrics};
use crate::options::FetchOptions;
use crate::source::{identity, source_fn, transform_fn, FetchSource, Transform};
use crate::state::{reduce, FetchAction, FetchState};
use crate::store::CacheStore;
use crate::strategy::FetchStrategy;
use futures::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Fetch source and transform fused into one call.
type Pipeline<K, P, T> = Arc<dyn Fn(K, Option<P>) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Builder for [`FetchOrchestrator`].
///
/// Starts with the identity transform, so the published type is the raw
/// response type until [`transform`](Self::transform) is called.
///
/// # Example
///
/// ```no_run
/// use fetch_kit::{FetchBuilder, FetchOptions};
/// use std::time::Duration;
///
/// # async fn demo() -> fetch_kit::Result<()> {
/// let orchestrator = FetchBuilder::new(("posts", 1u32), |key: (&'static str, u32), _params: Option<()>| async move {
///     Ok::<_, String>(format!(r#"{{"page":{}}}"#, key.1))
/// })
/// .transform(|raw: String| raw.parse::<serde_json::Value>())
/// .options(FetchOptions::default().with_ttl(Duration::from_secs(30)))
/// .build();
///
/// orchestrator.refetch(None).await?;
/// assert!(orchestrator.state().data.is_some());
/// # Ok(())
/// # }
/// ```
pub struct FetchBuilder<K, P, R, T> {
    key: K,
    source: Arc<dyn FetchSource<K, P, Output = R>>,
    transform: Transform<R, T>,
    options: FetchOptions,
    store: Option<CacheStore>,
    metrics: Arc<dyn FetchMetrics>,
    initial_data: Option<Arc<T>>,
}

impl<K, P, R> FetchBuilder<K, P, R, R>
where
    K: Serialize + Clone + Send + Sync + 'static,
    P: Send + 'static,
    R: Send + Sync + 'static,
{
    /// Start a builder from an async fetch closure.
    ///
    /// Closure errors are captured as `Error::FetchFailure`.
    pub fn new<F, Fut, E>(key: K, fetch: F) -> Self
    where
        F: Fn(K, Option<P>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
        E: fmt::Display + 'static,
    {
        Self::from_source(key, source_fn(fetch))
    }

    /// Start a builder from a [`FetchSource`] implementation.
    pub fn from_source<S>(key: K, source: S) -> Self
    where
        S: FetchSource<K, P, Output = R>,
    {
        FetchBuilder {
            key,
            source: Arc::new(source),
            transform: identity(),
            options: FetchOptions::default(),
            store: None,
            metrics: Arc::new(NoOpMetrics),
            initial_data: None,
        }
    }
}

impl<K, P, R, T> FetchBuilder<K, P, R, T>
where
    K: Serialize + Clone + Send + Sync + 'static,
    P: Send + 'static,
    R: Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Map raw responses before they are published and cached.
    ///
    /// Errors are captured as `Error::TransformFailure`. Resets any
    /// initial data, which is typed by the published value.
    pub fn transform<U, F, E>(self, f: F) -> FetchBuilder<K, P, R, U>
    where
        F: Fn(R) -> std::result::Result<U, E> + Send + Sync + 'static,
        U: Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        FetchBuilder {
            key: self.key,
            source: self.source,
            transform: transform_fn(f),
            options: self.options,
            store: self.store,
            metrics: self.metrics,
            initial_data: None,
        }
    }

    pub fn options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    /// Use `store` instead of [`CacheStore::global`].
    pub fn store(mut self, store: CacheStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Set custom metrics handler.
    pub fn metrics(mut self, metrics: Arc<dyn FetchMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Data published before the first run completes.
    pub fn initial_data(mut self, data: T) -> Self {
        self.initial_data = Some(Arc::new(data));
        self
    }

    pub fn build(self) -> FetchOrchestrator<K, P, T> {
        let source = self.source;
        let transform = self.transform;
        let pipeline: Pipeline<K, P, T> = Arc::new(move |key: K, params: Option<P>| {
            let fetch = source.fetch(key, params);
            let transform = Arc::clone(&transform);
            Box::pin(async move {
                let raw = fetch.await?;
                transform(raw)
            }) as BoxFuture<'static, Result<T>>
        });

        let (key, _) = watch::channel(self.key);
        let (state, _) = watch::channel(FetchState::new(self.initial_data));

        FetchOrchestrator {
            inner: Arc::new(Inner {
                pipeline,
                options: self.options,
                store: self
                    .store
                    .unwrap_or_else(|| CacheStore::global().clone()),
                metrics: self.metrics,
                key,
                state,
                latest_run: AtomicU64::new(0),
            }),
        }
    }

    /// Build and wrap in a [`FetchController`].
    pub fn mount(self) -> FetchController<K, P, T> {
        FetchController::mount(self.build())
    }
}

struct Inner<K, P, T> {
    pipeline: Pipeline<K, P, T>,
    options: FetchOptions,
    store: CacheStore,
    metrics: Arc<dyn FetchMetrics>,
    key: watch::Sender<K>,
    state: watch::Sender<FetchState<T>>,
    latest_run: AtomicU64,
}

/// The fetch state machine for one mounted instance.
///
/// Owns its [`FetchState`] and the current fetch key; shares the
/// [`CacheStore`] with every other orchestrator. Cloning is cheap and
/// clones drive the same instance.
///
/// # Overlapping runs
///
/// Runs are never cancelled. If a run starts while an earlier one is still
/// waiting on its fetch, both publish their outcome and whichever fetch
/// resolves last wins, even when it belongs to an older key. Set
/// [`FetchOptions::discard_stale`] to drop outcomes of superseded runs.
pub struct FetchOrchestrator<K, P, T> {
    inner: Arc<Inner<K, P, T>>,
}

impl<K, P, T> Clone for FetchOrchestrator<K, P, T> {
    fn clone(&self) -> Self {
        FetchOrchestrator {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, P, T> FetchOrchestrator<K, P, T>
where
    K: Serialize + Clone + Send + Sync + 'static,
    P: Send + 'static,
    T: Send + Sync + 'static,
{
    /// Run the fetch for the current key.
    ///
    /// Publishes `loading = true`, then serves a live cache entry (unless
    /// `strategy` is [`FetchStrategy::Hard`] or caching is off) or awaits
    /// the source, transforms, caches and publishes the result. Fetch and
    /// transform failures are published as `error`; `data` is left as is.
    /// `loading` is false once the run returns, unless the run was
    /// superseded under [`FetchOptions::discard_stale`]. A key that fails to
    /// canonicalize puts `status` back to its value before the run.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the current key cannot be
    /// canonicalized. No other error escapes.
    pub async fn run(&self, params: Option<P>, strategy: FetchStrategy) -> Result<()> {
        let seq = self.inner.latest_run.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self.inner.state.borrow().status;
        self.dispatch([FetchAction::SetLoading(true)]);

        let key = self.key();
        let cache_key = match KeyNormalizer::canonicalize(&key) {
            Ok(cache_key) => cache_key,
            Err(e) => {
                if !self.is_superseded(seq) {
                    self.dispatch([FetchAction::Abort(previous)]);
                }
                return Err(e);
            }
        };

        debug!(
            "» Run #{} for key: {} (strategy: {})",
            seq, cache_key, strategy
        );

        let options = &self.inner.options;
        if options.enable_cache && strategy.reads_cache() {
            if let Some(data) = self.inner.store.get::<T>(&cache_key) {
                self.inner.metrics.record_hit(cache_key.as_str());
                self.settle(seq, FetchAction::Resolve(data));
                return Ok(());
            }
        }
        self.inner.metrics.record_miss(cache_key.as_str());

        let timer = Instant::now();
        match (self.inner.pipeline)(key, params).await {
            Ok(data) => {
                let data = Arc::new(data);
                self.inner
                    .metrics
                    .record_fetch(cache_key.as_str(), timer.elapsed());
                if options.enable_cache {
                    self.inner
                        .store
                        .put(&cache_key, Arc::clone(&data), options.ttl);
                }
                info!("✓ Run #{} fetched {} in {:?}", seq, cache_key, timer.elapsed());
                self.settle(seq, FetchAction::Resolve(data));
            }
            Err(e) => {
                self.inner
                    .metrics
                    .record_error(cache_key.as_str(), &e.to_string());
                warn!("✗ Run #{} failed for {}: {}", seq, cache_key, e);
                self.settle(seq, FetchAction::Reject(e));
            }
        }

        Ok(())
    }

    /// Re-run for the current key, serving from cache when possible.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn refetch(&self, params: Option<P>) -> Result<()> {
        self.run(params, FetchStrategy::CacheFirst).await
    }

    /// Re-run for the current key, always calling the source.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub async fn hard_refetch(&self, params: Option<P>) -> Result<()> {
        self.run(params, FetchStrategy::Hard).await
    }

    /// Remove the cache entry for the current key.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the key cannot be canonicalized.
    pub fn invalidate(&self) -> Result<()> {
        let cache_key = self.canonical_key()?;
        self.inner.store.remove(&cache_key);
        Ok(())
    }

    /// Latest published state.
    pub fn state(&self) -> FetchState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified after every published transition.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<T>> {
        self.inner.state.subscribe()
    }

    /// Current fetch key.
    pub fn key(&self) -> K {
        self.inner.key.borrow().clone()
    }

    /// Replace the fetch key used by subsequent runs.
    ///
    /// Does not run anything; see [`FetchController::activate`].
    pub fn set_key(&self, key: K) {
        self.inner.key.send_replace(key);
    }

    /// Canonical form of the current key.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the key cannot be canonicalized.
    pub fn canonical_key(&self) -> Result<CanonicalKey> {
        KeyNormalizer::canonicalize(&*self.inner.key.borrow())
    }

    pub fn options(&self) -> &FetchOptions {
        &self.inner.options
    }

    pub fn store(&self) -> &CacheStore {
        &self.inner.store
    }

    fn is_superseded(&self, seq: u64) -> bool {
        self.inner.options.discard_stale && self.inner.latest_run.load(Ordering::SeqCst) != seq
    }

    /// Publish a terminal outcome and clear `loading` in one step.
    fn settle(&self, seq: u64, outcome: FetchAction<T>) {
        if self.is_superseded(seq) {
            debug!("Run #{} superseded, dropping {:?}", seq, outcome);
            return;
        }
        self.dispatch([outcome, FetchAction::SetLoading(false)]);
    }

    /// Apply a batch of actions and notify subscribers once.
    fn dispatch<I>(&self, actions: I)
    where
        I: IntoIterator<Item = FetchAction<T>>,
    {
        self.inner.state.send_modify(|state| {
            let mut next = std::mem::take(state);
            for action in actions {
                next = reduce(next, action);
            }
            *state = next;
        });
    }
}
