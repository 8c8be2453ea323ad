//! Construction-time validation of the active file set.
//!
//! Checks run in a fixed order and stop at the first failure: resolver
//! lookup, directory, non-empty file list, then per file (in declared order)
//! existence followed by extension.

use super::types::{DataSource, Options, SUPPORTED_EXTENSIONS};
use crate::error::ConfigsError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A validated set of files for one environment.
///
/// Paths are resolved once here and re-read on every refresh.
#[derive(Clone)]
pub struct FileSet {
    pub environment: String,
    pub directory: PathBuf,
    pub files: Vec<PathBuf>,
    pub data_source: Option<Arc<dyn DataSource>>,
}

impl std::fmt::Debug for FileSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSet")
            .field("environment", &self.environment)
            .field("directory", &self.directory)
            .field("files", &self.files)
            .field("data_source", &self.data_source.is_some())
            .finish()
    }
}

/// Select the resolver for the active environment and validate it.
pub fn validate(options: &Options) -> Result<FileSet, ConfigsError> {
    let environment = options.active_environment();
    let resolver = options
        .find_resolver(&environment)
        .ok_or_else(ConfigsError::resolver_not_found)?;

    let directory = join_under_root(&options.root_dir(), &resolver.directory);
    if !directory.is_dir() {
        return Err(ConfigsError::directory_missing(&resolver.directory));
    }

    if resolver.files.is_empty() {
        return Err(ConfigsError::no_files(&environment));
    }

    let mut files = Vec::with_capacity(resolver.files.len());
    for file in &resolver.files {
        let path = directory.join(file);
        if !path.is_file() {
            return Err(ConfigsError::file_missing(file));
        }

        let ext = extension_of(file);
        if !SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ConfigsError::unsupported_extension(&ext));
        }

        files.push(path);
    }

    debug!(
        environment = %environment,
        directory = %directory.display(),
        files = files.len(),
        "Validated config file set"
    );

    Ok(FileSet {
        environment,
        directory,
        files,
        data_source: resolver.data_source.clone(),
    })
}

/// Resolver directories always live under the root, even when written with
/// a leading separator.
fn join_under_root(root: &Path, directory: &str) -> PathBuf {
    let relative = directory.trim_start_matches(['/', '\\']);
    if relative.is_empty() {
        root.to_path_buf()
    } else {
        root.join(relative)
    }
}

/// Suffix including the dot, or empty when there is none.
fn extension_of(file: &str) -> String {
    Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_default()
}
