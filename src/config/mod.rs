//! Layered configuration pipeline.
//!
//! Turns a resolver's ordered files into one merged mapping:
//! 1. **Validate** - pick the resolver for the environment and check its files
//! 2. **Render** - interpolate `${{ name }}` placeholders from the data source
//! 3. **Parse** - read each rendered file as YAML
//! 4. **Merge** - shallow top-level merge, later files winning
//!
//! ## Lookups
//! Keys are split on the configured delimiter and walk objects by property
//! and arrays by index.
//!
//! ## Environment Variables
//! - `APP_ENV` - Selects the active resolver (default: `development`)

mod cache;
mod files;
mod loader;
mod lookup;
mod merge;
mod template;
mod types;

pub use cache::{CacheState, is_stale};
pub use files::{FileSet, validate};
pub use loader::{render_and_parse, resolve};
pub use lookup::lookup;
pub use merge::{shallow_merge, shallow_merge_all};
pub use template::{CLOSE_TAG, OPEN_TAG, TemplateError, render};
pub use types::*;
