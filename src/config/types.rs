//! Options, resolvers and the data-source seam.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default time-to-live of the merged value (60 seconds).
pub const DEFAULT_CACHE_EXPIRY_TIME: Duration = Duration::from_secs(60);

/// Default separator for lookup keys.
pub const DEFAULT_PATH_DELIMITER: &str = ".";

/// Environment variable selecting the active resolver.
pub const ENVIRONMENT_VAR: &str = "APP_ENV";

/// Environment used when [`ENVIRONMENT_VAR`] is unset or empty.
pub const DEFAULT_ENVIRONMENT: &str = "development";

/// File suffixes accepted by the validator.
pub const SUPPORTED_EXTENSIONS: [&str; 2] = [".yaml", ".yml"];

/// Supplies the interpolation context for a refresh.
///
/// Called once per refresh, before any file is read. The returned value is
/// normally an object; anything else simply resolves no placeholders.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> anyhow::Result<Value>;
}

/// A fixed context.
#[async_trait]
impl DataSource for Value {
    async fn fetch(&self) -> anyhow::Result<Value> {
        Ok(self.clone())
    }
}

/// Adapts an async closure into a [`DataSource`]. See [`from_fn`].
pub struct FnSource<F>(F);

/// Build a data source from a closure returning a future.
///
/// ```
/// use layered_configs::config::{from_fn, DataSource};
/// use serde_json::json;
///
/// let source = from_fn(|| async { Ok::<_, anyhow::Error>(json!({"version": "v1.2.3"})) });
/// # let _ = &source as &dyn DataSource;
/// ```
pub fn from_fn<F, Fut>(f: F) -> FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    FnSource(f)
}

#[async_trait]
impl<F, Fut> DataSource for FnSource<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn fetch(&self) -> anyhow::Result<Value> {
        (self.0)().await
    }
}

/// One configuration set, selected by environment.
#[derive(Clone)]
pub struct Resolver {
    /// Environment name this resolver answers to.
    pub environment: String,
    /// Directory holding the files, relative to the application root.
    pub directory: String,
    /// File names in merge order; later files override earlier ones.
    pub files: Vec<String>,
    /// Optional interpolation context.
    pub data_source: Option<Arc<dyn DataSource>>,
}

impl Resolver {
    pub fn new(environment: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            directory: directory.into(),
            files: Vec::new(),
            data_source: None,
        }
    }

    /// Append a file (builder pattern).
    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.files.push(name.into());
        self
    }

    /// Append several files (builder pattern).
    pub fn files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the data source (builder pattern).
    pub fn with_data_source(mut self, source: impl DataSource + 'static) -> Self {
        self.data_source = Some(Arc::new(source));
        self
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("environment", &self.environment)
            .field("directory", &self.directory)
            .field("files", &self.files)
            .field("data_source", &self.data_source.is_some())
            .finish()
    }
}

/// Loader options. Start from [`Options::default`] and override fields.
#[derive(Debug, Clone)]
pub struct Options {
    /// How long a merged value stays fresh. Zero refreshes on every read.
    pub cache_expiry_time: Duration,
    /// Separator for lookup keys. Empty falls back to the default.
    pub path_delimiter: String,
    /// Candidate resolvers; the first matching the environment wins.
    pub resolvers: Vec<Resolver>,
    /// Application root; `None` uses the current working directory.
    pub root: Option<PathBuf>,
    /// Explicit environment; `None` reads [`ENVIRONMENT_VAR`].
    pub environment: Option<String>,
    /// Upper bound for one refresh. `None` waits indefinitely.
    pub refresh_timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cache_expiry_time: DEFAULT_CACHE_EXPIRY_TIME,
            path_delimiter: DEFAULT_PATH_DELIMITER.to_string(),
            resolvers: Vec::new(),
            root: None,
            environment: None,
            refresh_timeout: None,
        }
    }
}

impl Options {
    /// Re-apply defaults for options left empty.
    pub fn normalized(mut self) -> Self {
        if self.path_delimiter.is_empty() {
            self.path_delimiter = DEFAULT_PATH_DELIMITER.to_string();
        }
        if self.environment.as_deref() == Some("") {
            self.environment = None;
        }
        self
    }

    /// The environment used to pick a resolver.
    pub fn active_environment(&self) -> String {
        if let Some(env) = &self.environment {
            return env.clone();
        }
        std::env::var(ENVIRONMENT_VAR)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }

    /// The root resolver directories are joined to.
    pub fn root_dir(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// The first resolver registered for `environment`.
    pub fn find_resolver(&self, environment: &str) -> Option<&Resolver> {
        self.resolvers.iter().find(|r| r.environment == environment)
    }
}
