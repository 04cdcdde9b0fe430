//! TemplateService: the orchestrator tying fetch, style resolution, the
//! cache, observers and live reload together.
//!
//! # Synchronization domain
//!
//! One `parking_lot::Mutex` guards the observer registry, the watched
//! location set and every cache commit. It is never held across an `.await`
//! and never held while an observer runs. Each batch's join state is owned
//! by the single task driving that batch, so it needs no lock at all.
//!
//! Cache reads go through [`CacheStore`] and never take the lock.

pub mod cache;
pub mod observer;
pub mod reload;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexSet;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::ServiceConfig;
use crate::error::BatchError;
use crate::fetch::{CachePolicy, ResourceFetcher};
use crate::location::Location;
use crate::resolve::{compile_template, BatchJoin, BatchOutcome, BatchReport, CompiledTemplate};

pub use cache::CacheStore;
pub use observer::{ObserverKey, ObserverRegistry, TemplateObserver};
pub use reload::LiveReloadHandle;

/// Resolves template locations into cached [`CompiledTemplate`]s.
///
/// Cheap to clone; clones share one cache. Dropping the last clone stops
/// live reload.
#[derive(Clone)]
pub struct TemplateService {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    fetcher: Arc<dyn ResourceFetcher>,
    config: ServiceConfig,
    cache: CacheStore,
    generation: AtomicU64,
    reload: CancellationToken,
    domain: Mutex<Domain>,
}

#[derive(Debug, Default)]
struct Domain {
    observers: ObserverRegistry,
    watched: IndexSet<Location>,
    reload_started: bool,
}

impl TemplateService {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, config: ServiceConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                cache: CacheStore::new(),
                generation: AtomicU64::new(0),
                reload: CancellationToken::new(),
                domain: Mutex::new(Domain::default()),
            }),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Resolve every location and cache the results.
    ///
    /// Duplicates are resolved once. Locations are fetched concurrently;
    /// the returned future completes once every location has either been
    /// cached or failed. A failed location keeps its previous cache entry.
    /// An empty input completes on first poll without touching the cache.
    ///
    /// After a successful batch, live reload (if enabled) starts or extends
    /// its watched set with these locations. Must run inside a tokio runtime
    /// when `locations` is non-empty.
    pub async fn resolve_all(
        &self,
        locations: impl IntoIterator<Item = Location>,
    ) -> Result<BatchReport, BatchError> {
        let join = BatchJoin::new(locations);
        if join.is_complete() {
            return Ok(BatchReport::default());
        }
        self.inner.resolve(join).await
    }

    /// Callback form of [`resolve_all`](Self::resolve_all).
    ///
    /// `completion` runs exactly once: immediately on the calling thread for
    /// an empty input, otherwise on a spawned task when the batch finishes.
    pub fn resolve_all_with<F>(&self, locations: impl IntoIterator<Item = Location>, completion: F)
    where
        F: FnOnce(Result<BatchReport, BatchError>) + Send + 'static,
    {
        let join = BatchJoin::new(locations);
        if join.is_complete() {
            completion(Ok(BatchReport::default()));
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let result = inner.resolve(join).await;
            completion(result);
        });
    }

    /// Latest committed template at `location`. Never blocks.
    pub fn compiled_template(&self, location: &Location) -> Option<Arc<CompiledTemplate>> {
        self.inner.cache.get(location)
    }

    /// Every cached location, sorted.
    pub fn cached_locations(&self) -> Vec<Location> {
        self.inner.cache.locations()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.inner.cache
    }

    /// Locations the live-reload loop re-resolves, in the order first seen.
    pub fn watched_locations(&self) -> Vec<Location> {
        self.inner.domain.lock().watched.iter().cloned().collect()
    }

    /// Whether live reload is configured and has not been stopped.
    pub fn is_live_reload_enabled(&self) -> bool {
        self.inner.live_reload_enabled()
    }

    /// Watch `location` for changes on behalf of `observer`.
    ///
    /// The registry holds only a weak reference. Returns `None` without
    /// registering when live reload is disabled or stopped.
    pub fn register_observer<O>(&self, observer: &Arc<O>, location: Location) -> Option<ObserverKey>
    where
        O: TemplateObserver + 'static,
    {
        if !self.inner.live_reload_enabled() {
            tracing::debug!(%location, "templates.observer.register_ignored");
            return None;
        }
        let weak: Weak<O> = Arc::downgrade(observer);
        let key = self.inner.domain.lock().observers.register(weak, location);
        Some(key)
    }

    /// Stop notifying `observer` about `location`. No-op if it was not registered.
    pub fn unregister_observer<O>(&self, observer: &Arc<O>, location: &Location) -> bool
    where
        O: TemplateObserver + 'static,
    {
        let weak: Weak<O> = Arc::downgrade(observer);
        let weak: Weak<dyn TemplateObserver> = weak;
        self.inner.domain.lock().observers.unregister(&weak, location)
    }

    /// Remove a registration by the key [`register_observer`](Self::register_observer) returned.
    pub fn remove_observer(&self, key: ObserverKey) -> bool {
        self.inner.domain.lock().observers.remove(key)
    }

    /// Notify every live observer at `location`. Returns how many ran.
    pub fn notify(&self, location: &Location) -> usize {
        self.inner.notify(location)
    }

    /// Handle that stops the live-reload loop. Valid before the loop starts;
    /// cancelling it early keeps the loop from ever starting.
    pub fn live_reload_handle(&self) -> LiveReloadHandle {
        LiveReloadHandle::new(self.inner.reload.clone())
    }

    /// Stop live reload for good. Later observer registrations are ignored.
    pub fn stop_live_reload(&self) {
        self.inner.reload.cancel();
    }
}

impl std::fmt::Debug for TemplateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateService")
            .field("config", &self.inner.config)
            .field("cached", &self.inner.cache.len())
            .field("live_reload", &self.inner.live_reload_enabled())
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn live_reload_enabled(&self) -> bool {
        self.config.live_reload && !self.reload.is_cancelled()
    }

    async fn resolve(self: &Arc<Self>, join: BatchJoin) -> Result<BatchReport, BatchError> {
        let outcome = self.run_batch(join).await;
        if outcome.is_success() {
            self.watch(&outcome.resolved);
        }
        outcome.into_result()
    }

    /// Fan out one task per pending location and fan their results into
    /// `join`. Every task is awaited, so the join completes exactly once.
    pub(crate) async fn run_batch(&self, mut join: BatchJoin) -> BatchOutcome {
        let policy = self.config.cache_policy;
        if policy == CachePolicy::Bypass {
            self.fetcher.clear_cache();
        }
        tracing::debug!(locations = join.total(), ?policy, "templates.batch.start");

        let mut tasks = JoinSet::new();
        for location in join.pending().cloned().collect::<Vec<_>>() {
            let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                let result = compile_template(fetcher, &location, policy).await;
                (location, generation, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((location, generation, Ok(template))) => {
                    self.commit(location.clone(), generation, template);
                    join.resolved(location);
                }
                Ok((location, _, Err(reason))) => {
                    tracing::warn!(%location, error = %reason, "templates.batch.location_failed");
                    join.failed(location, reason);
                }
                // The location stays pending and is aborted by `finish`.
                Err(err) => tracing::error!(error = %err, "templates.batch.task_aborted"),
            }
        }

        let outcome = join.finish();
        tracing::debug!(
            resolved = outcome.resolved.len(),
            failed = outcome.failures.len(),
            "templates.batch.finish"
        );
        outcome
    }

    fn commit(&self, location: Location, generation: u64, template: CompiledTemplate) {
        let _domain = self.domain.lock();
        self.cache.commit(location, generation, Arc::new(template));
    }

    fn watch(self: &Arc<Self>, locations: &[Location]) {
        if !self.live_reload_enabled() || locations.is_empty() {
            return;
        }
        let mut domain = self.domain.lock();
        domain.watched.extend(locations.iter().cloned());
        if !domain.reload_started {
            domain.reload_started = true;
            tracing::info!(
                watched = domain.watched.len(),
                interval_ms = self.config.reload_interval.as_millis() as u64,
                "templates.reload.start"
            );
            reload::spawn(
                Arc::downgrade(self),
                self.reload.clone(),
                self.config.reload_interval,
            );
        }
    }

    pub(crate) fn notify(&self, location: &Location) -> usize {
        let observers = self.domain.lock().observers.live_at(location);
        for observer in &observers {
            observer.on_template_changed();
        }
        observers.len()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.reload.cancel();
    }
}
