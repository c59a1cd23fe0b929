use std::{
    collections::HashMap,
    fmt,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::{sync::broadcast, time::sleep};
use tracing::{debug, warn};

use crate::{cache_keys::QueryKey, error::Error};

/// Maximum age of a cached result before the next access refreshes it
pub const STALE_TIME: Duration = Duration::from_secs(5 * 60);

/// Extra attempts made for a failing read query
pub const RETRY: u32 = 1;

pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Idle entries not queried for this long are dropped
pub const GC_TIME: Duration = Duration::from_secs(5 * 60);

pub const UPDATES_CAPACITY: usize = 64;

pub type QueryOutput<T> = Result<T, Arc<Error>>;

type InFlight<T> = Shared<BoxFuture<'static, QueryOutput<T>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub stale_time: Duration,
    pub retry: u32,
    pub retry_delay: Duration,
    pub gc_time: Duration,
}

impl QueryOptions {
    pub fn without_retry(self) -> Self {
        QueryOptions { retry: 0, ..self }
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            stale_time: STALE_TIME,
            retry: RETRY,
            retry_delay: RETRY_DELAY,
            gc_time: GC_TIME,
        }
    }
}

/// Snapshot of a query as seen by a view.
#[derive(Debug, Clone)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    /// No data yet and a fetch is running
    pub is_loading: bool,
    pub is_fetching: bool,
    pub is_error: bool,
    pub error: Option<Arc<Error>>,
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        QueryResult {
            data: None,
            is_loading: false,
            is_fetching: false,
            is_error: false,
            error: None,
        }
    }
}

struct CacheEntry<T> {
    data: Option<T>,
    data_updated_at: Option<Instant>,
    error: Option<Arc<Error>>,
    invalidated: bool,
    in_flight: Option<InFlight<T>>,
    /// Sequence number of the last fetch issued for this key
    issued: u64,
    /// Sequence number of the last fetch whose result was applied
    applied: u64,
    /// Fetches numbered below this were issued before an invalidation
    valid_from: u64,
    last_queried: Instant,
}

impl<T> Default for CacheEntry<T> {
    fn default() -> Self {
        CacheEntry {
            data: None,
            data_updated_at: None,
            error: None,
            invalidated: false,
            in_flight: None,
            issued: 0,
            applied: 0,
            valid_from: 0,
            last_queried: Instant::now(),
        }
    }
}

impl<T: Clone> CacheEntry<T> {
    fn is_stale(&self, stale_time: Duration) -> bool {
        match self.data_updated_at {
            Some(updated_at) => {
                self.invalidated || updated_at.elapsed() >= stale_time
            },
            None => true,
        }
    }

    fn is_collectable(&self, gc_time: Duration) -> bool {
        self.in_flight.is_none() && self.last_queried.elapsed() >= gc_time
    }

    fn snapshot(&self) -> QueryResult<T> {
        QueryResult {
            data: self.data.clone(),
            is_loading: self.data.is_none() && self.in_flight.is_some(),
            is_fetching: self.in_flight.is_some(),
            is_error: self.error.is_some(),
            error: self.error.clone(),
        }
    }
}

struct Inner<T> {
    entries: Mutex<HashMap<QueryKey, CacheEntry<T>>>,
    options: QueryOptions,
    updates: broadcast::Sender<QueryKey>,
}

/// Keyed query cache with staleness, request de-duplication and
/// stale-while-revalidate reads. Cloning yields another handle to the
/// same store. Fetches run on the ambient tokio runtime.
pub struct QueryCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        QueryCache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> QueryCache<T> {
    pub fn new(options: QueryOptions) -> Self {
        let (updates, _) = broadcast::channel(UPDATES_CAPACITY);
        QueryCache::with_updates(options, updates)
    }

    /// Cache publishing settled keys on an existing channel, so several
    /// caches can share one subscription.
    pub fn with_updates(
        options: QueryOptions,
        updates: broadcast::Sender<QueryKey>,
    ) -> Self {
        QueryCache {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                options,
                updates,
            }),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CacheEntry<T>>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current state of `key` right away. A missing or stale
    /// entry starts a fetch, or joins the one already running.
    pub fn query<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryResult<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let mut entries = self.entries();
        self.sweep(&mut entries, key);
        let entry = entries.entry(key.clone()).or_default();
        entry.last_queried = Instant::now();

        if entry.is_stale(self.inner.options.stale_time) {
            self.start_fetch(key, entry, fetcher);
        } else {
            debug!("Query {} served from cache", key);
        }

        entry.snapshot()
    }

    /// Resolves with fresh cached data, or with the outcome of the
    /// (possibly shared) fetch for `key`.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryOutput<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        let in_flight = {
            let mut entries = self.entries();
            self.sweep(&mut entries, key);
            let entry = entries.entry(key.clone()).or_default();
            entry.last_queried = Instant::now();

            if !entry.is_stale(self.inner.options.stale_time) {
                if let Some(data) = &entry.data {
                    debug!("Query {} served from cache", key);
                    return Ok(data.clone());
                }
            }

            self.start_fetch(key, entry, fetcher)
        };

        in_flight.await
    }

    /// Drops idle entries that have not been queried within `gc_time`.
    pub fn cleanup_expired(&self) -> usize {
        let gc_time = self.inner.options.gc_time;
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_collectable(gc_time));
        before - entries.len()
    }

    fn sweep(
        &self,
        entries: &mut HashMap<QueryKey, CacheEntry<T>>,
        current: &QueryKey,
    ) {
        let gc_time = self.inner.options.gc_time;
        let before = entries.len();
        entries.retain(|key, entry| key == current || !entry.is_collectable(gc_time));
        if entries.len() < before {
            debug!("Collected {} idle queries", before - entries.len());
        }
    }

    /// Current state of `key` without triggering a fetch.
    pub fn peek(&self, key: &QueryKey) -> QueryResult<T> {
        self.entries()
            .get(key)
            .map(CacheEntry::snapshot)
            .unwrap_or_default()
    }

    /// Marks every entry under `prefix` stale. Results of fetches that
    /// were already running are discarded when they arrive.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut entries = self.entries();
        let mut count = 0;

        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                entry.valid_from = entry.issued + 1;
                entry.in_flight = None;
                count += 1;
            }
        }

        debug!("Invalidated {} queries under {}", count, prefix);
        count
    }

    /// Emits the key of every entry that settles, for view refreshes.
    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.inner.updates.subscribe()
    }

    fn start_fetch<F, Fut>(
        &self,
        key: &QueryKey,
        entry: &mut CacheEntry<T>,
        fetcher: F,
    ) -> InFlight<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Error>> + Send + 'static,
    {
        if let Some(in_flight) = &entry.in_flight {
            debug!("Query {} joined in-flight fetch", key);
            return in_flight.clone();
        }

        entry.issued += 1;
        let seq = entry.issued;
        if entry.data.is_none() {
            entry.error = None;
        }
        debug!("Query {} fetching (#{})", key, seq);

        let cache = self.clone();
        let key = key.clone();
        let options = self.inner.options;
        let in_flight = async move {
            let result = run_with_retry(&key, options, fetcher)
                .await
                .map_err(Arc::new);
            cache.settle(&key, seq, &result);
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some(in_flight.clone());
        tokio::spawn(in_flight.clone());
        in_flight
    }

    fn settle(&self, key: &QueryKey, seq: u64, result: &QueryOutput<T>) {
        {
            let mut entries = self.entries();
            let Some(entry) = entries.get_mut(key) else {
                return;
            };

            if entry.issued == seq {
                entry.in_flight = None;
            }

            if seq <= entry.applied || seq < entry.valid_from {
                debug!("Query {} discarded superseded result #{}", key, seq);
                return;
            }
            entry.applied = seq;

            match result {
                Ok(data) => {
                    entry.data = Some(data.clone());
                    entry.data_updated_at = Some(Instant::now());
                    entry.error = None;
                    entry.invalidated = false;
                },
                Err(e) => {
                    warn!("Query {} failed: {}", key, e);
                    entry.error = Some(Arc::clone(e));
                },
            }
        }

        let _ = self.inner.updates.send(key.clone());
    }
}

async fn run_with_retry<T, F, Fut>(
    key: &QueryKey,
    options: QueryOptions,
    fetcher: F,
) -> Result<T, Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(data) => return Ok(data),
            Err(e) if attempt < options.retry => {
                attempt += 1;
                warn!(
                    "Query {} failed, retry {}/{}: {}",
                    key, attempt, options.retry, e
                );
                if !options.retry_delay.is_zero() {
                    sleep(options.retry_delay).await;
                }
            },
            Err(e) => return Err(e),
        }
    }
}

impl<T> fmt::Debug for QueryCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("options", &self.inner.options)
            .finish()
    }
}
