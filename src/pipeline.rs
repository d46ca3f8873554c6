//! Discover → extract → merge → join, end to end.
//!
//! Both output tables are built in memory before either file is written, so a
//! failing run leaves any previous outputs untouched.

use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::discover::{find_json_files, sort_paths};
use crate::error::{PipelineError, Result};
use crate::extract::{extract_file, FileBatch, KeyFields};
use crate::join::left_join;
use crate::merge::{merge_batches, MergeOutcome, MergedTable};
use crate::table::{read_csv, write_csv, Table};

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub json_files: usize,
    pub records_extracted: usize,
    pub entries_skipped: usize,
    pub duplicates_replaced: usize,
    pub merged_rows: usize,
    pub input_csv: PathBuf,
    pub join_column: String,
    pub input_rows: usize,
    pub joined_rows: usize,
    pub matched_rows: usize,
    pub merged_output: PathBuf,
    pub joined_output: PathBuf,
}

/// The merged product set and the columns it is written with.
#[derive(Debug)]
pub struct MergeRun {
    pub files: Vec<PathBuf>,
    pub entries_skipped: usize,
    pub outcome: MergeOutcome,
    pub columns: Vec<String>,
}

impl MergeRun {
    pub fn to_table(&self) -> Table {
        let rows = self
            .outcome
            .table
            .records()
            .iter()
            .map(|r| MergedTable::render_row(r, &self.columns))
            .collect();
        Table {
            headers: self.columns.clone(),
            rows,
        }
    }
}

/// Find the input CSV: the configured path, else the first file with the same
/// name under `search_root` in path order.
pub fn locate_input_csv(configured: &Path, search_root: &Path) -> Result<PathBuf> {
    if configured.is_file() {
        return Ok(configured.to_path_buf());
    }
    warn!("{} not found", configured.display());

    let Some(wanted) = configured.file_name() else {
        return Err(PipelineError::NotFound(configured.to_path_buf()));
    };
    if !search_root.is_dir() {
        return Err(PipelineError::NotFound(configured.to_path_buf()));
    }

    let mut hits: Vec<PathBuf> = WalkDir::new(search_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == wanted)
        .map(|e| e.into_path())
        .collect();
    sort_paths(&mut hits);

    match hits.into_iter().next() {
        Some(found) => {
            info!("Found {} at: {}", wanted.to_string_lossy(), found.display());
            Ok(found)
        }
        None => Err(PipelineError::NotFound(configured.to_path_buf())),
    }
}

/// Extract every file in order. The first unreadable or malformed file aborts.
pub fn extract_all(files: &[PathBuf], keys: &KeyFields) -> Result<Vec<FileBatch>> {
    files
        .iter()
        .map(|path| {
            let batch = extract_file(path, keys)?;
            info!("Processed {}: {} records", path.display(), batch.records.len());
            Ok(batch)
        })
        .collect()
}

/// Discover, extract and merge the product files under `data_dir`.
pub fn merge_directory(
    data_dir: &Path,
    keys: &KeyFields,
    required_fields: &[String],
) -> Result<MergeRun> {
    let files = find_json_files(data_dir)?;
    if files.is_empty() {
        warn!("No JSON files found under {}", data_dir.display());
    } else {
        info!("Found {} JSON files:", files.len());
        for file in &files {
            info!(" - {}", file.display());
        }
    }

    let batches = extract_all(&files, keys)?;
    let entries_skipped = batches.iter().map(|b| b.skipped.len()).sum();
    let outcome = merge_batches(batches);

    for name in outcome.table.missing_required(required_fields) {
        warn!("Required column '{name}' not found in data. Creating empty column.");
    }
    let columns = outcome.table.columns(required_fields);

    Ok(MergeRun {
        files,
        entries_skipped,
        outcome,
        columns,
    })
}

/// Run the whole pipeline and write both output tables.
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    let input_csv = locate_input_csv(&config.input_csv, &config.search_root)?;
    let merge = merge_directory(&config.data_dir, &config.keys, &config.required_fields)?;

    let input = read_csv(&input_csv)?;
    let joined = left_join(&input, &merge.outcome.table, &merge.columns, &config.join)?;

    write_csv(&config.merged_output, &merge.to_table())?;
    write_csv(&config.joined_output, &joined.table)?;

    info!("Input rows: {}, Output rows: {}", input.len(), joined.table.len());

    Ok(RunSummary {
        json_files: merge.files.len(),
        records_extracted: merge.outcome.records_seen,
        entries_skipped: merge.entries_skipped,
        duplicates_replaced: merge.outcome.replacements.len(),
        merged_rows: merge.outcome.table.len(),
        input_csv,
        join_column: joined.join_column,
        input_rows: input.len(),
        joined_rows: joined.table.len(),
        matched_rows: joined.matched,
        merged_output: config.merged_output.clone(),
        joined_output: config.joined_output.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn configured_csv_is_used_when_present() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("input.csv");
        fs::write(&csv, "product_sku\n").unwrap();
        assert_eq!(locate_input_csv(&csv, dir.path()).unwrap(), csv);
    }

    #[test]
    fn missing_csv_is_searched_for_by_name() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("b/input.csv"), "product_sku\n").unwrap();
        fs::write(dir.path().join("a/input.csv"), "product_sku\n").unwrap();

        let found = locate_input_csv(&dir.path().join("input.csv"), dir.path()).unwrap();
        assert_eq!(found, dir.path().join("a/input.csv"));
    }

    #[test]
    fn unfound_csv_is_not_found() {
        let dir = TempDir::new().unwrap();
        let wanted = dir.path().join("input.csv");
        assert!(matches!(
            locate_input_csv(&wanted, dir.path()),
            Err(PipelineError::NotFound(p)) if p == wanted
        ));
    }

    #[test]
    fn merge_directory_reports_skips_and_required_columns() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("garden.json"),
            r#"[{"sku": "G1", "name": "Rake"}, {"name": "orphan"}]"#,
        )
        .unwrap();

        let required = vec!["name".to_string(), "brand".to_string()];
        let run = merge_directory(dir.path(), &KeyFields::default(), &required).unwrap();
        assert_eq!(run.files.len(), 1);
        assert_eq!(run.entries_skipped, 1);
        assert_eq!(run.columns, vec!["sku", "name", "brand", "category"]);
        assert_eq!(run.to_table().rows, vec![vec!["G1", "Rake", "", "garden"]]);
    }
}
