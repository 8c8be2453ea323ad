//! Error types for construction and refresh.
//!
//! Construction failures are a closed set of kinds so callers can branch on
//! [`ConfigsError::kind`] instead of matching message text. Refresh failures
//! carry the collaborator's own error as their source.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::TemplateError;

/// Error kinds for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ResolverError,
    DirectoryError,
    FilesError,
    FileError,
    ExtensionError,
}

impl ErrorKind {
    /// The kind's name, as exposed to callers and printed by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::ResolverError => "ResolverError",
            ErrorKind::DirectoryError => "DirectoryError",
            ErrorKind::FilesError => "FilesError",
            ErrorKind::FileError => "FileError",
            ErrorKind::ExtensionError => "ExtensionError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Construction-time failure. None of these are retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigsError {
    /// No resolver matches the active environment.
    #[error("{0}")]
    Resolver(String),

    /// The resolver's directory does not exist under the root.
    #[error("{0}")]
    Directory(String),

    /// The resolver declares no files.
    #[error("{0}")]
    Files(String),

    /// A declared file is missing.
    #[error("{0}")]
    File(String),

    /// A declared file has an unsupported suffix.
    #[error("{0}")]
    Extension(String),
}

impl ConfigsError {
    pub fn resolver_not_found() -> Self {
        Self::Resolver("Resolver not found".to_string())
    }

    pub fn directory_missing(directory: &str) -> Self {
        Self::Directory(format!("Directory {} does not exist", directory))
    }

    pub fn no_files(environment: &str) -> Self {
        Self::Files(format!(
            "No config files provided for {} env",
            environment
        ))
    }

    pub fn file_missing(file: &str) -> Self {
        Self::File(format!("Config file {} does not exist", file))
    }

    pub fn unsupported_extension(ext: &str) -> Self {
        Self::Extension(format!(
            "Unsupported file extension {}. Only .yaml and .yml are supported.",
            ext
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigsError::Resolver(_) => ErrorKind::ResolverError,
            ConfigsError::Directory(_) => ErrorKind::DirectoryError,
            ConfigsError::Files(_) => ErrorKind::FilesError,
            ConfigsError::File(_) => ErrorKind::FileError,
            ConfigsError::Extension(_) => ErrorKind::ExtensionError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ConfigsError::Resolver(m)
            | ConfigsError::Directory(m)
            | ConfigsError::Files(m)
            | ConfigsError::File(m)
            | ConfigsError::Extension(m) => m,
        }
    }
}

/// Failure while refreshing the merged value during a read.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// The data source rejected.
    #[error("data source failed: {0}")]
    DataSource(#[source] anyhow::Error),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The rendered document is a scalar or sequence rather than a mapping.
    #[error("{} does not contain a mapping at the top level", path.display())]
    NotAMapping { path: PathBuf },

    /// The value at the requested key does not fit the caller's type.
    #[error("value does not match the requested type: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("refresh timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type for reads.
pub type RefreshResult<T> = std::result::Result<T, RefreshError>;
