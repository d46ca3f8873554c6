//! Turns one product JSON file into tagged `ProductRecord`s.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::error::{PipelineError, Result};

pub const CATEGORY_FIELD: &str = "category";

/// Which entry fields identify a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFields {
    pub key: String,
    // Used when `key` is absent, e.g. feeds that call it `id`
    pub fallback: Option<String>,
}

impl Default for KeyFields {
    fn default() -> Self {
        Self {
            key: "sku".to_string(),
            fallback: Some("id".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub sku: String,
    pub attributes: Map<String, Value>,
    pub category: String,
    pub source_file: PathBuf,
}

/// Accepted top-level shapes of a product file.
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySet {
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl EntrySet {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(EntrySet::List(items)),
            Value::Object(map) => Some(EntrySet::Map(map)),
            _ => None,
        }
    }

    /// Uniform sequence of (map key, entry); list entries carry no key.
    pub fn into_entries(self) -> Vec<(Option<String>, Value)> {
        match self {
            EntrySet::List(items) => items.into_iter().map(|v| (None, v)).collect(),
            EntrySet::Map(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingKey,
    NotAnObject,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingKey => f.write_str("entry has no usable sku"),
            SkipReason::NotAnObject => f.write_str("entry is not a JSON object"),
        }
    }
}

/// An entry dropped during extraction. Recoverable; reported as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub file: PathBuf,
    pub index: usize,
    pub reason: SkipReason,
}

/// All records taken from one file, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct FileBatch {
    pub path: PathBuf,
    pub category: String,
    pub records: Vec<ProductRecord>,
    pub skipped: Vec<SkippedEntry>,
}

/// Category label of a file: its name without directory and final extension.
pub fn category_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Strings are used verbatim, numbers by their JSON text. Anything else is no key.
fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_key(obj: &mut Map<String, Value>, keys: &KeyFields, map_key: Option<&str>) -> Option<String> {
    if let Some(sku) = obj.shift_remove(&keys.key).as_ref().and_then(key_text) {
        return Some(sku);
    }
    if let Some(fallback) = &keys.fallback {
        if let Some(sku) = obj.get(fallback).and_then(key_text) {
            obj.shift_remove(fallback);
            return Some(sku);
        }
    }
    map_key.filter(|k| !k.is_empty()).map(str::to_owned)
}

/// Read and extract one file. Any read or parse failure fails the whole file.
pub fn extract_file(path: &Path, keys: &KeyFields) -> Result<FileBatch> {
    let raw = fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    extract_str(path, &raw, keys)
}

/// Extract records from already-read file contents.
pub fn extract_str(path: &Path, raw: &str, keys: &KeyFields) -> Result<FileBatch> {
    let value: Value = serde_json::from_str(raw).map_err(|e| PipelineError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let entries = EntrySet::from_value(value).ok_or_else(|| PipelineError::Parse {
        path: path.to_path_buf(),
        message: "top-level JSON must be an array or an object".to_string(),
    })?;

    let category = category_for(path);
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for (index, (map_key, entry)) in entries.into_entries().into_iter().enumerate() {
        let Value::Object(mut obj) = entry else {
            warn!("{}: entry {index} skipped, {}", path.display(), SkipReason::NotAnObject);
            skipped.push(SkippedEntry {
                file: path.to_path_buf(),
                index,
                reason: SkipReason::NotAnObject,
            });
            continue;
        };

        let Some(sku) = take_key(&mut obj, keys, map_key.as_deref()) else {
            warn!("{}: entry {index} skipped, {}", path.display(), SkipReason::MissingKey);
            skipped.push(SkippedEntry {
                file: path.to_path_buf(),
                index,
                reason: SkipReason::MissingKey,
            });
            continue;
        };

        // category comes from the file name only
        obj.shift_remove(CATEGORY_FIELD);
        debug!("{}: sku={sku} ({} attributes)", path.display(), obj.len());

        records.push(ProductRecord {
            sku,
            attributes: obj,
            category: category.clone(),
            source_file: path.to_path_buf(),
        });
    }

    Ok(FileBatch {
        path: path.to_path_buf(),
        category,
        records,
        skipped,
    })
}
