//! Render, parse and merge the files of a validated set.
//!
//! Each file is rendered on its raw text first, then parsed, then merged
//! onto the files before it. Merging parsed mappings keeps independent
//! documents from corrupting each other.

use super::files::FileSet;
use super::merge::shallow_merge;
use super::template::render;
use crate::error::{RefreshError, RefreshResult};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, trace};

/// Produce a fresh merged mapping for `file_set`.
///
/// Errors from the data source, the filesystem, the renderer or the parser
/// abort the whole run; there is no partial result.
pub async fn resolve(file_set: &FileSet) -> RefreshResult<Value> {
    let context = match &file_set.data_source {
        Some(source) => source.fetch().await.map_err(RefreshError::DataSource)?,
        None => Value::Object(Map::new()),
    };

    let mut merged = Map::new();
    for path in &file_set.files {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RefreshError::Io {
                path: path.clone(),
                source,
            })?;

        let parsed = render_and_parse(path, &content, &context)?;
        trace!(file = %path.display(), keys = parsed.len(), "Merging config file");
        merged = shallow_merge(merged, parsed);
    }

    debug!(
        environment = %file_set.environment,
        files = file_set.files.len(),
        keys = merged.len(),
        "Resolved config"
    );

    Ok(Value::Object(merged))
}

/// Render one file's text and parse it into a mapping.
///
/// An empty document contributes nothing.
pub fn render_and_parse(path: &Path, content: &str, context: &Value) -> RefreshResult<Map<String, Value>> {
    let rendered = render(content, context).map_err(|source| RefreshError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    if rendered.trim().is_empty() {
        return Ok(Map::new());
    }

    let parsed: Value = serde_yaml::from_str(&rendered).map_err(|source| RefreshError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match parsed {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        _ => Err(RefreshError::NotAMapping {
            path: path.to_path_buf(),
        }),
    }
}
