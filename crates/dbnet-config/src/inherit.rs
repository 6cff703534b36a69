//! `_base_` inheritance.
//!
//! A document may list base documents under `_base_`. Bases are merged in
//! order, then the document itself is merged on top: mappings merge key by
//! key, every other value is replaced. A mapping carrying `_delete_ = true`
//! replaces the inherited mapping instead of merging into it.

use crate::document;
use crate::error::{ConfigError, ConfigResult};
use crate::path::FieldPath;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const BASE_KEY: &str = "_base_";
pub const DELETE_KEY: &str = "_delete_";

/// Resolve `_base_` includes of `doc`, whose relative base paths are
/// interpreted against `dir`. `origin` is the document's own file, if any,
/// and seeds cycle detection.
pub fn resolve(doc: Value, dir: &Path, origin: Option<&Path>) -> ConfigResult<Value> {
    let mut stack: Vec<PathBuf> = origin.map(canonical).into_iter().collect();
    resolve_inner(doc, dir, &mut stack)
}

fn resolve_inner(mut doc: Value, dir: &Path, stack: &mut Vec<PathBuf>) -> ConfigResult<Value> {
    let bases = match doc.as_object_mut().and_then(|root| root.remove(BASE_KEY)) {
        None => return Ok(strip_markers(doc)),
        Some(value) => base_list(value)?,
    };

    let mut merged = Value::Object(Map::new());
    for (idx, rel) in bases.iter().enumerate() {
        let path = dir.join(rel);
        if !path.is_file() {
            return Err(ConfigError::PathNotFound {
                path: FieldPath::key(BASE_KEY).index(idx),
                target: PathBuf::from(rel),
            });
        }
        let key = canonical(&path);
        if stack.contains(&key) {
            let mut chain = stack.clone();
            chain.push(key);
            return Err(ConfigError::BaseCycle { chain });
        }

        debug!(base = %path.display(), "Merging base config");
        let base_doc = document::read(&path)?;
        let base_dir = path.parent().map_or_else(|| dir.to_path_buf(), Path::to_path_buf);
        stack.push(key);
        let resolved = resolve_inner(base_doc, &base_dir, stack)?;
        stack.pop();
        merged = merge(merged, resolved);
    }

    Ok(merge(merged, doc))
}

fn base_list(value: Value) -> ConfigResult<Vec<String>> {
    let path = FieldPath::key(BASE_KEY);
    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::String(s) => Ok(s),
                other => Err(ConfigError::mismatch(
                    path.index(idx),
                    "string",
                    document::describe(&other),
                )),
            })
            .collect(),
        other => Err(ConfigError::mismatch(
            path,
            "string or list of strings",
            document::describe(&other),
        )),
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Merge `child` over `base`.
#[must_use]
pub fn merge(base: Value, child: Value) -> Value {
    match (base, child) {
        (Value::Object(mut base), Value::Object(mut child)) => {
            if child.remove(DELETE_KEY) == Some(Value::Bool(true)) {
                return strip_markers(Value::Object(child));
            }
            for (key, value) in child {
                let merged = match base.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => strip_markers(value),
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, child) => strip_markers(child),
    }
}

/// Remove leftover `_delete_` markers.
fn strip_markers(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| k != DELETE_KEY)
                .map(|(k, v)| (k, strip_markers(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_markers).collect()),
        other => other,
    }
}
