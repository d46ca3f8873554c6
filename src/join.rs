//! Left join of an input table against the merged product table.
//!
//! Keys compare as exact strings: no trimming, no case folding, and no
//! numeric normalisation (`007` does not match `7`).

use log::{info, warn};

use crate::error::{PipelineError, Result};
use crate::merge::MergedTable;
use crate::table::Table;

pub const DEFAULT_JOIN_COLUMN: &str = "product_sku";
pub const COLLISION_SUFFIX: &str = "_merged";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub column: String,
    // Fall back to the first header containing "sku" when `column` is absent
    pub detect: bool,
}

impl Default for JoinSpec {
    fn default() -> Self {
        Self {
            column: DEFAULT_JOIN_COLUMN.to_string(),
            detect: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub table: Table,
    pub join_column: String,
    pub matched: usize,
}

/// Index of the join column in `input`, or `Schema` when there is none.
pub fn resolve_join_column(input: &Table, spec: &JoinSpec) -> Result<usize> {
    if let Some(idx) = input.column_index(&spec.column) {
        return Ok(idx);
    }
    if spec.detect {
        if let Some(idx) = input
            .headers
            .iter()
            .position(|h| h.to_lowercase().contains("sku"))
        {
            warn!(
                "Using '{}' for joining instead of '{}'",
                input.headers[idx], spec.column
            );
            return Ok(idx);
        }
    }
    Err(PipelineError::Schema {
        column: spec.column.clone(),
        available: input.headers.clone(),
    })
}

// Merged columns that clash with an input header get a suffix until unique.
fn joined_headers(input: &[String], merged: &[String]) -> Vec<String> {
    let mut headers = input.to_vec();
    for name in merged {
        let mut candidate = name.clone();
        while headers.contains(&candidate) {
            candidate.push_str(COLLISION_SUFFIX);
        }
        headers.push(candidate);
    }
    headers
}

/// One output row per input row, in input order.
///
/// Matching rows get the product's rendered columns, unmatched rows get
/// empty fields. Products absent from the input are dropped.
pub fn left_join(
    input: &Table,
    merged: &MergedTable,
    merged_columns: &[String],
    spec: &JoinSpec,
) -> Result<JoinOutcome> {
    let key_idx = resolve_join_column(input, spec)?;
    let blank = vec![String::new(); merged_columns.len()];

    let mut matched = 0usize;
    let mut rows = Vec::with_capacity(input.rows.len());
    for row in &input.rows {
        let key = row.get(key_idx).map(String::as_str).unwrap_or_default();
        let product = match merged.get(key) {
            Some(record) => {
                matched += 1;
                MergedTable::render_row(record, merged_columns)
            }
            None => blank.clone(),
        };
        let mut joined = row.clone();
        joined.extend(product);
        rows.push(joined);
    }

    info!(
        "Joined {} input rows on '{}' ({} matched, {} unmatched)",
        rows.len(),
        input.headers[key_idx],
        matched,
        rows.len() - matched
    );

    Ok(JoinOutcome {
        table: Table {
            headers: joined_headers(&input.headers, merged_columns),
            rows,
        },
        join_column: input.headers[key_idx].clone(),
        matched,
    })
}
