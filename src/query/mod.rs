//! Query cache: keyed, deduplicated, stale-while-revalidate reads.
//!
//! - Concurrent reads of one key share a single in-flight request.
//! - A value is fresh for `stale_time`; after that the next read refetches
//!   while `peek` keeps serving the old value.
//! - Entries nobody has read for `gc_time` are evicted by `collect_garbage`.
//! - Transient failures retry up to `retry` times; 401/403/404 never retry.
//! - Each dispatch gets a generation number. A response is stored only if it
//!   is newer than the stored value and was dispatched after the last
//!   invalidation of its key, so a slow stale response never overwrites a
//!   newer one.

use chrono::{DateTime, Utc};
use futures::future::{FutureExt, LocalBoxFuture, Shared};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use crate::client::ApiError;
use crate::config::QuerySettings;
use crate::time::{Clock, SystemClock};

pub mod keys;
pub mod resources;

pub use resources::Resources;

/// Ordered key segments, e.g. `["analytics", "p1", "overview", "today", ""]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct QueryOptions {
    /// Skip the read entirely until prerequisites hold
    pub enabled: bool,
    pub stale_time: Duration,
    pub gc_time: Duration,
    pub retry: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self::from_settings(&QuerySettings::default())
    }
}

impl QueryOptions {
    pub fn from_settings(settings: &QuerySettings) -> Self {
        Self {
            enabled: true,
            stale_time: settings.stale_time(),
            gc_time: settings.gc_time(),
            retry: settings.retry,
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }
}

/// Delay before retry number `n` (0-based): `min(1s * 2^n, 30s)`.
pub fn default_retry_delay(attempt: u32) -> Duration {
    let millis = 1000u64.saturating_mul(1u64 << attempt.min(16));
    Duration::from_millis(millis.min(30_000))
}

/// What a view renders: loading flag, last data, last error.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryResult<T> {
    pub is_loading: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self::loading()
    }
}

impl<T> QueryResult<T> {
    pub fn loading() -> Self {
        Self {
            is_loading: true,
            data: None,
            error: None,
        }
    }

    pub fn from_result(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => Self {
                is_loading: false,
                data: Some(data),
                error: None,
            },
            // A disabled query is not an error, it is waiting on prerequisites
            Err(ApiError::Disabled) => Self::loading(),
            Err(error) => Self {
                is_loading: false,
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Value read without triggering a fetch.
#[derive(Clone, Debug, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub is_stale: bool,
    pub updated_at: DateTime<Utc>,
}

type Value = Rc<dyn Any>;
type InFlight = Shared<LocalBoxFuture<'static, Result<Value, ApiError>>>;

struct Entry {
    value: Option<Value>,
    updated_at: Option<DateTime<Utc>>,
    value_generation: u64,
    /// Responses dispatched at or before this generation are discarded
    min_generation: u64,
    invalidated: bool,
    error: Option<ApiError>,
    in_flight: Option<(u64, InFlight)>,
    last_used: DateTime<Utc>,
}

impl Entry {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            value: None,
            updated_at: None,
            value_generation: 0,
            min_generation: 0,
            invalidated: false,
            error: None,
            in_flight: None,
            last_used: now,
        }
    }

    fn is_stale(&self, now: DateTime<Utc>, stale_time: Duration) -> bool {
        match self.updated_at {
            _ if self.invalidated => true,
            Some(updated_at) => elapsed(updated_at, now) >= stale_time,
            None => true,
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

type Listener = Rc<dyn Fn()>;

struct CacheInner {
    entries: RefCell<HashMap<QueryKey, Entry>>,
    generation: Cell<u64>,
    defaults: QueryOptions,
    clock: Rc<dyn Clock>,
    retry_delay: Rc<dyn Fn(u32) -> Duration>,
    listeners: RefCell<Vec<Listener>>,
}

impl CacheInner {
    fn next_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn settle(&self, key: &QueryKey, generation: u64, outcome: &Result<Value, ApiError>) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };
        if matches!(entry.in_flight, Some((g, _)) if g == generation) {
            entry.in_flight = None;
        }
        if generation <= entry.min_generation || generation <= entry.value_generation {
            tracing::debug!("Discarding superseded response for {}", key);
            return;
        }
        match outcome {
            Ok(value) => {
                entry.value = Some(value.clone());
                entry.updated_at = Some(self.clock.now());
                entry.value_generation = generation;
                entry.invalidated = false;
                entry.error = None;
            }
            Err(e) => {
                entry.error = Some(e.clone());
            }
        }
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: Value) -> Result<T, ApiError> {
    value
        .downcast::<T>()
        .map(|v| (*v).clone())
        .map_err(|_| ApiError::Decode(format!("cached value for {} has a different type", key)))
}

/// Process-wide query cache. Clones share state.
#[derive(Clone)]
pub struct QueryCache {
    inner: Rc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(QueryOptions::default())
    }
}

impl QueryCache {
    pub fn new(defaults: QueryOptions) -> Self {
        Self::with_clock(defaults, Rc::new(SystemClock))
    }

    pub fn with_clock(defaults: QueryOptions, clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(CacheInner {
                entries: RefCell::new(HashMap::new()),
                generation: Cell::new(0),
                defaults,
                clock,
                retry_delay: Rc::new(default_retry_delay),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Replace the retry backoff (tests use zero delay).
    pub fn with_retry_delay(self, delay: impl Fn(u32) -> Duration + 'static) -> Self {
        let inner = match Rc::try_unwrap(self.inner) {
            Ok(mut inner) => {
                inner.retry_delay = Rc::new(delay);
                inner
            }
            Err(shared) => {
                tracing::warn!("Retry delay must be set before the cache is shared");
                return Self { inner: shared };
            }
        };
        Self {
            inner: Rc::new(inner),
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.inner.defaults.clone()
    }

    /// Called after invalidations and direct writes, so views can refetch.
    pub fn subscribe(&self, listener: impl Fn() + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, ApiError>
    where
        T: Clone + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        let options = self.options();
        self.fetch_with(key, &options, fetcher).await
    }

    pub async fn fetch_with<T, F, Fut>(
        &self,
        key: QueryKey,
        options: &QueryOptions,
        fetcher: F,
    ) -> Result<T, ApiError>
    where
        T: Clone + 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        if !options.enabled {
            return Err(ApiError::Disabled);
        }

        let now = self.inner.clock.now();
        let pending = {
            let mut entries = self.inner.entries.borrow_mut();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.last_used = now;

            if !entry.is_stale(now, options.stale_time) {
                if let Some(value) = entry.value.clone() {
                    drop(entries);
                    return downcast(&key, value);
                }
            }

            match &entry.in_flight {
                Some((_, in_flight)) => in_flight.clone(),
                None => {
                    let generation = self.inner.next_generation();
                    tracing::debug!("Fetching {} (generation {})", key, generation);
                    let in_flight = Self::dispatch(
                        self.inner.clone(),
                        key.clone(),
                        generation,
                        options.retry,
                        fetcher,
                    )
                    .boxed_local()
                    .shared();
                    entry.in_flight = Some((generation, in_flight.clone()));
                    in_flight
                }
            }
        };

        let value = pending.await?;
        downcast(&key, value)
    }

    async fn dispatch<T, F, Fut>(
        inner: Rc<CacheInner>,
        key: QueryKey,
        generation: u64,
        retry: u32,
        fetcher: F,
    ) -> Result<Value, ApiError>
    where
        T: 'static,
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, ApiError>> + 'static,
    {
        let mut failures = 0u32;
        let outcome = loop {
            match fetcher().await {
                Ok(value) => break Ok(Rc::new(value) as Value),
                Err(e) if e.is_retryable() && failures < retry => {
                    let delay = (inner.retry_delay)(failures);
                    failures += 1;
                    tracing::warn!(
                        "Query {} failed ({}), retry {}/{} in {:?}",
                        key,
                        e,
                        failures,
                        retry,
                        delay
                    );
                    crate::time::sleep(delay).await;
                }
                Err(e) => {
                    if failures > 0 || !e.is_retryable() {
                        tracing::warn!("Query {} failed: {}", key, e);
                    }
                    break Err(e);
                }
            }
        };
        inner.settle(&key, generation, &outcome);
        outcome
    }

    /// Cached value without fetching; `is_stale` says a refetch is due.
    pub fn peek<T: Clone + 'static>(&self, key: &QueryKey) -> Option<Cached<T>> {
        let now = self.inner.clock.now();
        let entries = self.inner.entries.borrow();
        let entry = entries.get(key)?;
        let value = entry.value.clone()?;
        let updated_at = entry.updated_at?;
        let value = downcast(key, value).ok()?;
        Some(Cached {
            value,
            is_stale: entry.is_stale(now, self.inner.defaults.stale_time),
            updated_at,
        })
    }

    /// Last error recorded for `key`, cleared by the next success.
    pub fn error(&self, key: &QueryKey) -> Option<ApiError> {
        self.inner
            .entries
            .borrow()
            .get(key)
            .and_then(|e| e.error.clone())
    }

    pub fn is_fetching(&self, key: &QueryKey) -> bool {
        self.inner
            .entries
            .borrow()
            .get(key)
            .is_some_and(|e| e.in_flight.is_some())
    }

    /// Write a value directly (e.g. the response of a mutation).
    pub fn set_data<T: 'static>(&self, key: QueryKey, value: T) {
        let now = self.inner.clock.now();
        let generation = self.inner.next_generation();
        {
            let mut entries = self.inner.entries.borrow_mut();
            let entry = entries.entry(key).or_insert_with(|| Entry::new(now));
            entry.value = Some(Rc::new(value));
            entry.updated_at = Some(now);
            entry.value_generation = generation;
            entry.invalidated = false;
            entry.error = None;
            entry.last_used = now;
        }
        self.inner.notify();
    }

    /// Mark every entry under `prefix` stale and detach its in-flight request.
    /// Returns how many entries matched.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let cutoff = self.inner.generation.get();
        let count = {
            let mut entries = self.inner.entries.borrow_mut();
            let mut count = 0;
            for (key, entry) in entries.iter_mut() {
                if key.starts_with(prefix) {
                    entry.invalidated = true;
                    entry.min_generation = cutoff;
                    entry.in_flight = None;
                    count += 1;
                }
            }
            count
        };
        tracing::debug!("Invalidated {} entries under {}", count, prefix);
        self.inner.notify();
        count
    }

    /// Drop every entry under `prefix`.
    pub fn remove(&self, prefix: &QueryKey) -> usize {
        let count = {
            let mut entries = self.inner.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|key, _| !key.starts_with(prefix));
            before - entries.len()
        };
        self.inner.notify();
        count
    }

    /// Drop everything, e.g. on sign-out.
    pub fn clear(&self) {
        self.inner.entries.borrow_mut().clear();
        self.inner.notify();
    }

    /// Evict entries not read for `gc_time` and not currently fetching.
    pub fn collect_garbage(&self) -> usize {
        let now = self.inner.clock.now();
        let gc_time = self.inner.defaults.gc_time;
        let mut entries = self.inner.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, e| e.in_flight.is_some() || elapsed(e.last_used, now) < gc_time);
        let evicted = before - entries.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} unused query entries", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a mutation; on success invalidate every prefix in `invalidates`.
    pub async fn mutate<T, Fut>(&self, operation: Fut, invalidates: &[QueryKey]) -> Result<T, ApiError>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let result = operation.await?;
        for prefix in invalidates {
            self.invalidate(prefix);
        }
        Ok(result)
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::time::ManualClock;

    fn key(parts: &[&str]) -> QueryKey {
        QueryKey::new(parts.iter().copied())
    }

    fn cache_with_clock() -> (QueryCache, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::default());
        let cache = QueryCache::with_clock(QueryOptions::default(), clock.clone())
            .with_retry_delay(|_| Duration::ZERO);
        (cache, clock)
    }

    fn counting_fetcher(
        calls: Rc<Cell<u32>>,
        value: &'static str,
    ) -> impl Fn() -> LocalBoxFuture<'static, Result<String, ApiError>> {
        move || {
            let calls = calls.clone();
            async move {
                calls.set(calls.get() + 1);
                crate::time::sleep(Duration::from_millis(5)).await;
                Ok(value.to_string())
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn concurrent_reads_share_one_request() {
        let (cache, _) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));

        let (a, b) = futures::join!(
            cache.fetch(key(&["projects"]), counting_fetcher(calls.clone(), "x")),
            cache.fetch(key(&["projects"]), counting_fetcher(calls.clone(), "y")),
        );

        assert_eq!(calls.get(), 1);
        assert_eq!(a.unwrap(), "x");
        assert_eq!(b.unwrap(), "x");
    }

    #[tokio::test]
    async fn fresh_values_are_served_from_cache_until_stale() {
        let (cache, clock) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        let k = key(&["projects"]);

        cache
            .fetch(k.clone(), counting_fetcher(calls.clone(), "v1"))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(299));
        cache
            .fetch(k.clone(), counting_fetcher(calls.clone(), "v2"))
            .await
            .unwrap();
        assert_eq!(calls.get(), 1);

        clock.advance(Duration::from_secs(2));
        let stale = cache.peek::<String>(&k).unwrap();
        assert!(stale.is_stale);
        assert_eq!(stale.value, "v1");

        let refreshed = cache
            .fetch(k.clone(), counting_fetcher(calls.clone(), "v2"))
            .await
            .unwrap();
        assert_eq!(refreshed, "v2");
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn disabled_query_never_calls_fetcher() {
        let (cache, _) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        let options = cache.options().enabled(false);

        let result = cache
            .fetch_with(key(&["p"]), &options, counting_fetcher(calls.clone(), "v"))
            .await;
        assert_eq!(result, Err(ApiError::Disabled));
        assert_eq!(calls.get(), 0);
        assert!(QueryResult::from_result(result).is_loading);
    }

    fn failing_fetcher(
        calls: Rc<Cell<u32>>,
        error: ApiError,
    ) -> impl Fn() -> LocalBoxFuture<'static, Result<String, ApiError>> {
        move || {
            let calls = calls.clone();
            let error = error.clone();
            async move {
                calls.set(calls.get() + 1);
                Err(error)
            }
            .boxed_local()
        }
    }

    #[tokio::test]
    async fn non_retryable_statuses_are_attempted_once() {
        for status in [401, 403, 404] {
            let (cache, _) = cache_with_clock();
            let calls = Rc::new(Cell::new(0));
            let error = ApiError::Http {
                status,
                message: String::new(),
            };
            let result = cache
                .fetch(key(&["k"]), failing_fetcher(calls.clone(), error.clone()))
                .await;
            assert_eq!(result, Err(error.clone()));
            assert_eq!(calls.get(), 1, "status {} retried", status);
            assert_eq!(cache.error(&key(&["k"])), Some(error));
        }
    }

    #[tokio::test]
    async fn transient_failures_retry_three_times() {
        let (cache, _) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        let error = ApiError::Http {
            status: 503,
            message: String::new(),
        };
        let result = cache
            .fetch(key(&["k"]), failing_fetcher(calls.clone(), error))
            .await;
        assert!(result.is_err());
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn retry_then_success() {
        let (cache, _) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let fetcher = move || {
            let counter = counter.clone();
            async move {
                counter.set(counter.get() + 1);
                if counter.get() < 3 {
                    Err(ApiError::Network("reset".into()))
                } else {
                    Ok(7u32)
                }
            }
        };
        assert_eq!(cache.fetch(key(&["k"]), fetcher).await, Ok(7));
        assert_eq!(calls.get(), 3);
        assert_eq!(cache.error(&key(&["k"])), None);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_under_prefix_only() {
        let (cache, _) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        let goals_p1 = key(&["goals", "p1", "today"]);
        let goals_p2 = key(&["goals", "p2", "today"]);
        let projects = key(&["projects"]);

        for k in [&goals_p1, &goals_p2, &projects] {
            cache
                .fetch(k.clone(), counting_fetcher(calls.clone(), "v"))
                .await
                .unwrap();
        }
        assert_eq!(calls.get(), 3);

        assert_eq!(cache.invalidate(&key(&["goals", "p1"])), 1);
        for k in [&goals_p1, &goals_p2, &projects] {
            cache
                .fetch(k.clone(), counting_fetcher(calls.clone(), "v"))
                .await
                .unwrap();
        }
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn response_started_before_invalidation_is_not_stored() {
        let (cache, _) = cache_with_clock();
        let k = key(&["projects"]);

        let slow = {
            let cache = cache.clone();
            let k = k.clone();
            async move {
                cache
                    .fetch(k, || async {
                        crate::time::sleep(Duration::from_millis(30)).await;
                        Ok::<_, ApiError>("old".to_string())
                    })
                    .await
            }
        };
        let newer = {
            let cache = cache.clone();
            let k = k.clone();
            async move {
                crate::time::sleep(Duration::from_millis(5)).await;
                cache.invalidate(&k);
                cache
                    .fetch(k, || async { Ok::<_, ApiError>("new".to_string()) })
                    .await
            }
        };

        let (old, new) = futures::join!(slow, newer);
        assert_eq!(old.unwrap(), "old");
        assert_eq!(new.unwrap(), "new");

        // The slow response settled last but must not win
        assert_eq!(cache.peek::<String>(&k).unwrap().value, "new");
    }

    #[tokio::test]
    async fn garbage_collection_evicts_unused_entries() {
        let (cache, clock) = cache_with_clock();
        let calls = Rc::new(Cell::new(0));
        cache
            .fetch(key(&["a"]), counting_fetcher(calls.clone(), "v"))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(400));
        cache
            .fetch(key(&["b"]), counting_fetcher(calls.clone(), "v"))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(300));

        assert_eq!(cache.collect_garbage(), 1);
        assert!(cache.peek::<String>(&key(&["a"])).is_none());
        assert!(cache.peek::<String>(&key(&["b"])).is_some());
    }

    #[tokio::test]
    async fn mutate_invalidates_and_notifies() {
        let (cache, _) = cache_with_clock();
        let notified = Rc::new(Cell::new(0));
        let counter = notified.clone();
        cache.subscribe(move || counter.set(counter.get() + 1));

        cache.set_data(key(&["projects"]), vec!["p1".to_string()]);
        let out = cache
            .mutate(async { Ok::<_, ApiError>(1) }, &[key(&["projects"])])
            .await;
        assert_eq!(out, Ok(1));
        assert!(cache.peek::<Vec<String>>(&key(&["projects"])).unwrap().is_stale);
        assert_eq!(notified.get(), 2);

        // Failed mutation leaves the cache alone
        cache.set_data(key(&["goals"]), 1u8);
        let failed = cache
            .mutate(
                async { Err::<(), _>(ApiError::Network("down".into())) },
                &[key(&["goals"])],
            )
            .await;
        assert!(failed.is_err());
        assert!(!cache.peek::<u8>(&key(&["goals"])).unwrap().is_stale);
    }

    #[test]
    fn retry_delay_backs_off_and_caps() {
        assert_eq!(default_retry_delay(0), Duration::from_secs(1));
        assert_eq!(default_retry_delay(1), Duration::from_secs(2));
        assert_eq!(default_retry_delay(2), Duration::from_secs(4));
        assert_eq!(default_retry_delay(10), Duration::from_secs(30));
    }

    #[test]
    fn key_prefixes() {
        let k = key(&["analytics", "p1", "overview"]);
        assert!(k.starts_with(&key(&["analytics"])));
        assert!(k.starts_with(&key(&["analytics", "p1"])));
        assert!(!k.starts_with(&key(&["analytics", "p2"])));
        assert_eq!(k.to_string(), "[analytics, p1, overview]");
    }
}
