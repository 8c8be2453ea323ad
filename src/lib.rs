//! Layered Configs Library
//!
//! Loads an ordered list of YAML files, interpolates runtime data into them,
//! merges the results and serves cached, delimiter-addressed lookups.

pub mod cli;
pub mod config;
pub mod configs;
pub mod error;
pub mod format;
pub mod logging;

pub use configs::Configs;
pub use error::{ConfigsError, ErrorKind, RefreshError, RefreshResult};
