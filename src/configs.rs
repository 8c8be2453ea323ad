//! The `Configs` facade: construction, cached reads and refresh.
//!
//! Construction validates the active file set once. Reads check freshness
//! against the configured TTL and refresh lazily; there is no background
//! work. Refreshes are single-flight: callers that find the value stale while
//! another refresh is running wait for it instead of starting their own.

use crate::config::{CacheState, FileSet, Options, lookup, resolve, validate};
use crate::error::{ConfigsError, RefreshError, RefreshResult};
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Layered configuration handle. Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct Configs {
    inner: Arc<Inner>,
}

struct Inner {
    options: Options,
    file_set: FileSet,
    state: ArcSwap<CacheState>,
    refresh_lock: Mutex<()>,
}

impl Configs {
    /// Build from defaults adjusted by `configure`.
    ///
    /// ```no_run
    /// use layered_configs::{Configs, config::Resolver};
    ///
    /// let configs = Configs::create(|opt| {
    ///     opt.path_delimiter = "/".to_string();
    ///     opt.resolvers = vec![
    ///         Resolver::new("development", "configs")
    ///             .files(["common.yaml", "config.development.yaml"]),
    ///     ];
    /// })?;
    /// # Ok::<(), layered_configs::ConfigsError>(())
    /// ```
    pub fn create<F>(configure: F) -> Result<Self, ConfigsError>
    where
        F: FnOnce(&mut Options),
    {
        let mut options = Options::default();
        configure(&mut options);
        Self::new(options)
    }

    /// Build from explicit options.
    pub fn new(options: Options) -> Result<Self, ConfigsError> {
        let options = options.normalized();
        let file_set = validate(&options)?;

        info!(
            environment = %file_set.environment,
            directory = %file_set.directory.display(),
            files = file_set.files.len(),
            ttl_ms = options.cache_expiry_time.as_millis() as u64,
            "Configs ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                options,
                file_set,
                state: ArcSwap::from_pointee(CacheState::default()),
                refresh_lock: Mutex::new(()),
            }),
        })
    }

    /// Value at `key`, or `None` when the path does not resolve.
    ///
    /// An empty key returns the whole merged mapping.
    pub async fn get(&self, key: &str) -> RefreshResult<Option<Value>> {
        let snapshot = self.snapshot().await?;
        Ok(lookup(&snapshot, key, &self.inner.options.path_delimiter).cloned())
    }

    /// Typed read. An unresolved path deserializes from `null`, so
    /// `Option<T>` yields `None` while other types report a mismatch.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> RefreshResult<T> {
        let value = self.get(key).await?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// The current merged mapping, refreshed first if stale.
    ///
    /// The returned snapshot is never mutated; later refreshes swap in a new one.
    pub async fn snapshot(&self) -> RefreshResult<Arc<Value>> {
        let requested_at = Instant::now();
        if let Some(value) = self.fresh_value(requested_at) {
            return Ok(value);
        }
        self.refresh(requested_at).await
    }

    /// Force the next read to refresh. The current value stays readable
    /// until then.
    pub fn invalidate(&self) {
        self.inner.state.rcu(|state| state.expired());
        debug!("Config cache invalidated");
    }

    /// When the cached value was last refreshed, if ever.
    pub fn last_refreshed(&self) -> Option<Instant> {
        self.inner.state.load().refreshed_at
    }

    pub fn environment(&self) -> &str {
        &self.inner.file_set.environment
    }

    pub fn directory(&self) -> &Path {
        &self.inner.file_set.directory
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.inner.file_set.files
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    fn ttl(&self) -> Duration {
        self.inner.options.cache_expiry_time
    }

    fn fresh_value(&self, now: Instant) -> Option<Arc<Value>> {
        let state = self.inner.state.load();
        if state.is_stale(self.ttl(), now) {
            return None;
        }
        state.value.clone()
    }

    async fn refresh(&self, requested_at: Instant) -> RefreshResult<Arc<Value>> {
        let _guard = self.inner.refresh_lock.lock().await;

        // A refresh that began after this request is as good as our own.
        let state = self.inner.state.load_full();
        if let (Some(value), Some(at)) = (&state.value, state.refreshed_at)
            && (at >= requested_at || !state.is_stale(self.ttl(), Instant::now()))
        {
            return Ok(Arc::clone(value));
        }

        let started = Instant::now();
        let result = match self.inner.options.refresh_timeout {
            Some(limit) => tokio::time::timeout(limit, resolve(&self.inner.file_set))
                .await
                .unwrap_or_else(|_| Err(RefreshError::Timeout(limit))),
            None => resolve(&self.inner.file_set).await,
        };

        let value = match result {
            Ok(value) => value,
            Err(e) => {
                // Nothing is committed, so the next read retries.
                warn!(environment = %self.environment(), error = %e, "Config refresh failed");
                return Err(e);
            }
        };

        let snapshot = Arc::new(value);
        let next = Arc::new(CacheState {
            value: Some(Arc::clone(&snapshot)),
            refreshed_at: Some(started),
        });
        // Only `invalidate` swaps the state outside this lock. If it ran while
        // we were resolving, keep the new value but leave it stale.
        let previous = self.inner.state.compare_and_swap(&state, next);
        let invalidated = !Arc::ptr_eq(&*previous, &state);
        drop(previous);
        if invalidated {
            self.inner.state.store(Arc::new(CacheState {
                value: Some(Arc::clone(&snapshot)),
                refreshed_at: None,
            }));
            debug!(environment = %self.environment(), "Invalidated during refresh");
        }

        debug!(
            environment = %self.environment(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Config refreshed"
        );
        Ok(snapshot)
    }
}

impl std::fmt::Debug for Configs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configs")
            .field("options", &self.inner.options)
            .field("file_set", &self.inner.file_set)
            .finish()
    }
}
