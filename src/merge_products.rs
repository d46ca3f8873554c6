/*
cargo run --bin merge_products -- --data-dir data --output merged_output.csv

cargo run --bin merge_products -- \
    --data-dir data/catalogue \
    --output   catalogue_merged.csv \
    --required-field name --required-field brand --required-field price
*/

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use product_merge::config::{DEFAULT_DATA_DIR, DEFAULT_MERGED_OUTPUT};
use product_merge::logging::init_logging;
use product_merge::pipeline::merge_directory;
use product_merge::table::write_csv;
use product_merge::KeyFields;

/// Merge product JSON files into one CSV, one row per sku (later files win).
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "PRODUCT_MERGE_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[arg(short, long, env = "PRODUCT_MERGE_MERGED_OUTPUT", default_value = DEFAULT_MERGED_OUTPUT)]
    output: PathBuf,

    #[arg(long, default_value = "sku")]
    key_field: String,

    // Empty disables the fallback
    #[arg(long, default_value = "id")]
    fallback_key_field: String,

    #[arg(long = "required-field", default_values_t = ["name".to_string(), "brand".to_string()])]
    required_fields: Vec<String>,

    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_dir, "merge_products", cli.log_level)?;

    let keys = KeyFields {
        key: cli.key_field.clone(),
        fallback: Some(cli.fallback_key_field.clone()).filter(|f| !f.is_empty()),
    };
    let merged = merge_directory(&cli.data_dir, &keys, &cli.required_fields)
        .with_context(|| format!("merging {}", cli.data_dir.display()))?;

    write_csv(&cli.output, &merged.to_table())
        .with_context(|| format!("writing {}", cli.output.display()))?;

    info!(
        "Merged {} file(s) into {} ({} products, {} duplicates replaced)",
        merged.files.len(),
        cli.output.display(),
        merged.outcome.table.len(),
        merged.outcome.replacements.len()
    );
    Ok(())
}
