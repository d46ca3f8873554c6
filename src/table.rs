//! Plain string tables and their CSV I/O.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Writer};
use log::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read a headed CSV file verbatim.
///
/// Short rows are padded with empty fields to the header width; rows wider
/// than the header are `RowWidth` errors.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .iter()
        .map(str::to_owned)
        .collect();

    let width = headers.len();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| PipelineError::csv(path, e))?;
        if record.len() > width {
            return Err(PipelineError::RowWidth {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                expected: width,
                found: record.len(),
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_owned).collect();
        row.resize(width, String::new());
        rows.push(row);
    }

    info!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(Table { headers, rows })
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

fn write_rows(staging: &Path, table: &Table) -> Result<()> {
    let mut writer = Writer::from_path(staging).map_err(|e| PipelineError::csv(staging, e))?;
    writer
        .write_record(&table.headers)
        .map_err(|e| PipelineError::csv(staging, e))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| PipelineError::csv(staging, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(staging, e))
}

/// Write `table` to `path`. The file only appears once fully written.
pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let staging = staging_path(path);

    if let Err(e) = write_rows(&staging, table) {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    fs::rename(&staging, path).map_err(|e| PipelineError::io(path, e))?;

    info!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}
