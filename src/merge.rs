//! Last-write-wins fold of file batches into one table keyed by sku.

use std::collections::HashMap;
use std::path::PathBuf;

use log::{info, warn};
use serde_json::Value;

use crate::extract::{FileBatch, ProductRecord, CATEGORY_FIELD};

pub const SKU_COLUMN: &str = "sku";

/// A record that replaced an earlier one with the same sku.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub sku: String,
    pub previous: PathBuf,
    pub current: PathBuf,
}

/// Product records, exactly one per sku.
///
/// Rows keep the position of the first record seen for their sku; the content
/// is always the latest record written. Field names are remembered from every
/// record written, including ones later replaced.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    records: Vec<ProductRecord>,
    index: HashMap<String, usize>,
    fields: Vec<String>,
}

impl MergedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `record`, returning the record it replaced, if any.
    pub fn upsert(&mut self, record: ProductRecord) -> Option<ProductRecord> {
        for name in record.attributes.keys() {
            if !self.fields.contains(name) {
                self.fields.push(name.clone());
            }
        }
        match self.index.get(&record.sku) {
            Some(&pos) => Some(std::mem::replace(&mut self.records[pos], record)),
            None => {
                self.index.insert(record.sku.clone(), self.records.len());
                self.records.push(record);
                None
            }
        }
    }

    pub fn get(&self, sku: &str) -> Option<&ProductRecord> {
        self.index.get(sku).map(|&pos| &self.records[pos])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    /// Attribute names across all records written, in first-seen order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Output header: sku, the required fields, every other attribute in
    /// first-seen order, then category.
    pub fn columns(&self, required: &[String]) -> Vec<String> {
        let mut columns = vec![SKU_COLUMN.to_string()];
        let reserved = |name: &str| name == SKU_COLUMN || name == CATEGORY_FIELD;

        for name in required {
            if !reserved(name.as_str()) && !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        for name in &self.fields {
            if !reserved(name.as_str()) && !columns.contains(name) {
                columns.push(name.clone());
            }
        }
        columns.push(CATEGORY_FIELD.to_string());
        columns
    }

    /// Required fields that no record carried.
    pub fn missing_required<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|name| !self.fields.contains(*name))
            .map(String::as_str)
            .collect()
    }

    /// Render one record against `columns`; absent attributes are blank.
    pub fn render_row(record: &ProductRecord, columns: &[String]) -> Vec<String> {
        columns
            .iter()
            .map(|column| match column.as_str() {
                SKU_COLUMN => record.sku.clone(),
                CATEGORY_FIELD => record.category.clone(),
                name => record.attributes.get(name).map(cell_text).unwrap_or_default(),
            })
            .collect()
    }
}

/// CSV text of a JSON value. Null is the empty field.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Default)]
pub struct MergeOutcome {
    pub table: MergedTable,
    pub replacements: Vec<Replacement>,
    pub records_seen: usize,
}

/// Fold batches in the given order. Later batches overwrite earlier ones.
pub fn merge_batches<I>(batches: I) -> MergeOutcome
where
    I: IntoIterator<Item = FileBatch>,
{
    let mut outcome = MergeOutcome::default();

    for batch in batches {
        for record in batch.records {
            outcome.records_seen += 1;
            let sku = record.sku.clone();
            let current = record.source_file.clone();
            if let Some(old) = outcome.table.upsert(record) {
                warn!(
                    "duplicate sku={sku}: {} replaces {}",
                    current.display(),
                    old.source_file.display()
                );
                outcome.replacements.push(Replacement {
                    sku,
                    previous: old.source_file,
                    current,
                });
            }
        }
    }

    info!(
        "merged {} records into {} unique skus ({} replaced)",
        outcome.records_seen,
        outcome.table.len(),
        outcome.replacements.len()
    );
    outcome
}
