/*
cargo run --bin merge_join

cargo run --bin merge_join -- \
    --data-dir   data \
    --input-csv  input.csv \
    --merged-output merged_output.csv \
    --joined-output joined_output.csv

PRODUCT_MERGE_DATA_DIR=fixtures/data cargo run --bin merge_join -- --summary-json
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use product_merge::config::{
    DEFAULT_DATA_DIR, DEFAULT_INPUT_CSV, DEFAULT_JOINED_OUTPUT, DEFAULT_MERGED_OUTPUT,
};
use product_merge::join::DEFAULT_JOIN_COLUMN;
use product_merge::logging::init_logging;
use product_merge::{run, JoinSpec, KeyFields, PipelineConfig};

/// Merge product JSON files and left-join the input CSV against them.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Directory searched recursively for product *.json files
    #[arg(long, env = "PRODUCT_MERGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// CSV whose rows are enriched with product data
    #[arg(long, env = "PRODUCT_MERGE_INPUT_CSV", default_value = DEFAULT_INPUT_CSV)]
    input_csv: PathBuf,

    /// Where to look for the input CSV by name when --input-csv is missing
    #[arg(long, default_value = ".")]
    search_root: PathBuf,

    #[arg(long, env = "PRODUCT_MERGE_MERGED_OUTPUT", default_value = DEFAULT_MERGED_OUTPUT)]
    merged_output: PathBuf,

    #[arg(long, env = "PRODUCT_MERGE_JOINED_OUTPUT", default_value = DEFAULT_JOINED_OUTPUT)]
    joined_output: PathBuf,

    /// Input CSV column compared against sku
    #[arg(long, env = "PRODUCT_MERGE_JOIN_COLUMN", default_value = DEFAULT_JOIN_COLUMN)]
    join_column: String,

    /// Use the first *sku* header when --join-column is absent
    #[arg(long)]
    detect_join_column: bool,

    /// JSON field identifying a product
    #[arg(long, default_value = "sku")]
    key_field: String,

    /// Field used as the key when --key-field is absent (empty to disable)
    #[arg(long, default_value = "id")]
    fallback_key_field: String,

    /// Columns always present in the merged output (repeatable)
    #[arg(long = "required-field", default_values_t = ["name".to_string(), "brand".to_string()])]
    required_fields: Vec<String>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            input_csv: self.input_csv.clone(),
            search_root: self.search_root.clone(),
            merged_output: self.merged_output.clone(),
            joined_output: self.joined_output.clone(),
            keys: KeyFields {
                key: self.key_field.clone(),
                fallback: Some(self.fallback_key_field.clone()).filter(|f| !f.is_empty()),
            },
            join: JoinSpec {
                column: self.join_column.clone(),
                detect: self.detect_join_column,
            },
            required_fields: self.required_fields.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = init_logging(&cli.log_dir, "merge_join", cli.log_level)?;
    info!("=== merge_join started, logging to {} ===", log_path.display());

    let config = cli.pipeline_config();
    let summary = run(&config).context("merge_join failed")?;

    info!(
        "{} files, {} records ({} skipped, {} replaced) -> {} products",
        summary.json_files,
        summary.records_extracted,
        summary.entries_skipped,
        summary.duplicates_replaced,
        summary.merged_rows
    );
    info!(
        "Joined {} rows on '{}' ({} matched) -> {}",
        summary.joined_rows,
        summary.join_column,
        summary.matched_rows,
        summary.joined_output.display()
    );

    if cli.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}
