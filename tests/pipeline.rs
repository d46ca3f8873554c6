//! End-to-end runs over temporary data directories.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use product_merge::table::read_csv;
use product_merge::{run, PipelineConfig, PipelineError};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Fixture: two categories sharing sku X1, a nested file, and an input CSV.
fn fixture() -> (TempDir, PipelineConfig) {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "data/a.json",
        r#"[{"sku": "X1", "name": "Old radio", "brand": "Acme"},
            {"sku": "A2", "name": "Lamp", "brand": "Lux"}]"#,
    );
    write(
        root,
        "data/b.json",
        r#"[{"sku": "X1", "name": "New radio", "brand": "Acme", "price": 30}]"#,
    );
    write(
        root,
        "data/nested/electronics.json",
        r#"{"E9": {"name": "Cable", "category": "wrong"}, "E10": {"brand": "Wired"}}"#,
    );
    write(
        root,
        "input.csv",
        "order_id,product_sku,qty\n1,X1,2\n2,E9,1\n3,NOPE,5\n4,X1,1\n",
    );

    let config = PipelineConfig::rooted_at(root);
    (dir, config)
}

#[test]
fn joined_output_has_one_row_per_input_row() {
    let (_dir, config) = fixture();
    let summary = run(&config).unwrap();

    let input = read_csv(&config.input_csv).unwrap();
    let joined = read_csv(&config.joined_output).unwrap();
    assert_eq!(joined.len(), input.len());
    assert_eq!(summary.input_rows, 4);
    assert_eq!(summary.joined_rows, 4);
    assert_eq!(summary.matched_rows, 3);
}

#[test]
fn merged_output_skus_are_unique() {
    let (_dir, config) = fixture();
    run(&config).unwrap();

    let merged = read_csv(&config.merged_output).unwrap();
    let sku_idx = merged.column_index("sku").unwrap();
    let skus: HashSet<&str> = merged.rows.iter().map(|r| r[sku_idx].as_str()).collect();
    assert_eq!(skus.len(), merged.len());
    assert_eq!(merged.len(), 4);
}

#[test]
fn alphabetically_later_file_wins() {
    let (_dir, config) = fixture();
    let summary = run(&config).unwrap();
    assert_eq!(summary.duplicates_replaced, 1);

    let merged = read_csv(&config.merged_output).unwrap();
    assert_eq!(
        merged.headers,
        vec!["sku", "name", "brand", "price", "category"]
    );
    let x1 = merged.rows.iter().find(|r| r[0] == "X1").unwrap();
    assert_eq!(x1, &vec!["X1", "New radio", "Acme", "30", "b"]);
}

#[test]
fn category_comes_from_file_stem() {
    let (_dir, config) = fixture();
    run(&config).unwrap();

    let merged = read_csv(&config.merged_output).unwrap();
    let cat_idx = merged.column_index("category").unwrap();
    let e9 = merged.rows.iter().find(|r| r[0] == "E9").unwrap();
    assert_eq!(e9[cat_idx], "electronics");
}

#[test]
fn unmatched_rows_keep_blank_product_fields() {
    let (_dir, config) = fixture();
    run(&config).unwrap();

    let joined = read_csv(&config.joined_output).unwrap();
    assert_eq!(
        joined.headers,
        vec!["order_id", "product_sku", "qty", "sku", "name", "brand", "price", "category"]
    );
    assert_eq!(joined.rows[2], vec!["3", "NOPE", "5", "", "", "", "", ""]);
    assert_eq!(
        joined.rows[1],
        vec!["2", "E9", "1", "E9", "Cable", "", "", "electronics"]
    );
}

#[test]
fn rerun_is_byte_identical() {
    let (_dir, config) = fixture();
    run(&config).unwrap();
    let merged_first = fs::read(&config.merged_output).unwrap();
    let joined_first = fs::read(&config.joined_output).unwrap();

    run(&config).unwrap();
    assert_eq!(fs::read(&config.merged_output).unwrap(), merged_first);
    assert_eq!(fs::read(&config.joined_output).unwrap(), joined_first);
}

#[test]
fn malformed_json_writes_no_output() {
    let (dir, config) = fixture();
    write(dir.path(), "data/zz_broken.json", "[{\"sku\": \"B1\",");

    match run(&config) {
        Err(PipelineError::Parse { path, .. }) => {
            assert!(path.ends_with("zz_broken.json"))
        }
        other => panic!("expected Parse, got {other:?}"),
    }
    assert!(!config.merged_output.exists());
    assert!(!config.joined_output.exists());
}

#[test]
fn failed_run_leaves_previous_outputs_untouched() {
    let (dir, config) = fixture();
    run(&config).unwrap();
    let before = fs::read(&config.merged_output).unwrap();

    write(dir.path(), "input.csv", "order_id,item\n1,X1\n");
    assert!(matches!(run(&config), Err(PipelineError::Schema { .. })));
    assert_eq!(fs::read(&config.merged_output).unwrap(), before);
}

#[test]
fn missing_data_dir_is_not_found() {
    let (dir, mut config) = fixture();
    config.data_dir = dir.path().join("no_such_dir");

    match run(&config) {
        Err(PipelineError::NotFound(p)) => assert_eq!(p, config.data_dir),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(!config.merged_output.exists());
}

#[test]
fn empty_data_dir_still_joins_every_row() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("data")).unwrap();
    write(dir.path(), "input.csv", "product_sku\nX1\nX2\n");
    let config = PipelineConfig::rooted_at(dir.path());

    let summary = run(&config).unwrap();
    assert_eq!(summary.json_files, 0);
    assert_eq!(summary.merged_rows, 0);

    let merged = read_csv(&config.merged_output).unwrap();
    assert_eq!(merged.headers, vec!["sku", "name", "brand", "category"]);
    assert!(merged.is_empty());

    let joined = read_csv(&config.joined_output).unwrap();
    assert_eq!(joined.rows, vec![
        vec!["X1", "", "", "", ""],
        vec!["X2", "", "", "", ""],
    ]);
}

#[test]
fn skipped_entries_are_counted_not_fatal() {
    let (dir, config) = fixture();
    write(dir.path(), "data/c.json", r#"[{"name": "no sku"}, {"id": 77, "name": "by id"}]"#);

    let summary = run(&config).unwrap();
    assert_eq!(summary.entries_skipped, 1);

    let merged = read_csv(&config.merged_output).unwrap();
    assert!(merged.rows.iter().any(|r| r[0] == "77" && r[1] == "by id"));
}

#[test]
fn short_input_rows_are_kept() {
    let (dir, config) = fixture();
    write(dir.path(), "input.csv", "order_id,product_sku,note\n1,X1,hi\n2,X1\n");

    let summary = run(&config).unwrap();
    assert_eq!(summary.joined_rows, 2);

    let joined = read_csv(&config.joined_output).unwrap();
    assert_eq!(
        joined.rows[1],
        vec!["2", "X1", "", "X1", "New radio", "Acme", "30", "b"]
    );
}

#[test]
fn fields_only_in_replaced_records_stay_in_headers() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "data/a.json", r#"[{"sku": "X1", "colour": "red"}]"#);
    write(dir.path(), "data/b.json", r#"[{"sku": "X1", "name": "n"}]"#);
    write(dir.path(), "input.csv", "product_sku\nX1\n");
    let config = PipelineConfig::rooted_at(dir.path());

    run(&config).unwrap();

    let merged = read_csv(&config.merged_output).unwrap();
    assert_eq!(merged.headers, vec!["sku", "name", "brand", "colour", "category"]);
    assert_eq!(merged.rows, vec![vec!["X1", "n", "", "", "b"]]);

    let joined = read_csv(&config.joined_output).unwrap();
    assert_eq!(
        joined.headers,
        vec!["product_sku", "sku", "name", "brand", "colour", "category"]
    );
}
