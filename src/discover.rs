//! Recursive discovery of product JSON files.
//!
//! The order returned here decides which record survives deduplication, so it
//! comes from `path_sort_key` and never from the order the filesystem yields.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{PipelineError, Result};

// Archive and OS metadata folders that never hold product data
pub const EXCLUDED_DIRS: &[&str] = &["_MACOSX", "__MACOSX", ".DS_Store"];

pub const JSON_EXTENSION: &str = "json";

/// Sort key for a discovered path: the full path as text with `/` separators.
pub fn path_sort_key(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Sort paths in place by `path_sort_key`.
pub fn sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by_cached_key(|p| path_sort_key(p));
}

fn is_excluded(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| EXCLUDED_DIRS.contains(&name))
            .unwrap_or(false)
}

// Symlinked files count, symlinked directories are not descended into.
fn is_json_file(entry: &DirEntry) -> bool {
    let is_file = entry.file_type().is_file()
        || (entry.path_is_symlink() && entry.path().is_file());
    is_file
        && entry
            .path()
            .extension()
            .map(|ext| ext == JSON_EXTENSION)
            .unwrap_or(false)
}

/// List every `*.json` file under `root` at any depth, alphabetically by path.
///
/// A missing root is `NotFound`; a root without JSON files yields an empty list.
pub fn find_json_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(PipelineError::NotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            PipelineError::io(path, e.into())
        })?;
        if is_json_file(&entry) {
            debug!("discovered {}", entry.path().display());
            files.push(entry.into_path());
        }
    }

    sort_paths(&mut files);
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "[]").unwrap();
    }

    #[test]
    fn finds_nested_json_sorted_by_full_path() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "b.json");
        touch(dir.path(), "a/z.json");
        touch(dir.path(), "a/deeper/c.json");
        touch(dir.path(), "notes.txt");

        let found = find_json_files(dir.path()).unwrap();
        let rel: Vec<String> = found
            .iter()
            .map(|p| path_sort_key(p.strip_prefix(dir.path()).unwrap()))
            .collect();
        assert_eq!(rel, vec!["a/deeper/c.json", "a/z.json", "b.json"]);
    }

    #[test]
    fn skips_excluded_directories() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "__MACOSX/shadow.json");
        touch(dir.path(), "_MACOSX/shadow.json");
        touch(dir.path(), "real.json");

        let found = find_json_files(dir.path()).unwrap();
        assert_eq!(found, vec![dir.path().join("real.json")]);
    }

    #[test]
    fn extension_match_is_exact() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "upper.JSON");
        touch(dir.path(), "data.jsonl");
        assert!(find_json_files(dir.path()).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_count_but_directory_loops_are_not_followed() {
        use std::os::unix::fs::symlink;

        let dir = TempDir::new().unwrap();
        touch(dir.path(), "store/real.json");
        symlink(dir.path().join("store/real.json"), dir.path().join("alias.json")).unwrap();
        symlink(dir.path(), dir.path().join("store/loop")).unwrap();

        let found = find_json_files(dir.path()).unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("alias.json"), dir.path().join("store/real.json")]
        );
    }

    #[test]
    fn missing_root_is_not_found() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        match find_json_files(&missing) {
            Err(PipelineError::NotFound(p)) => assert_eq!(p, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn sort_key_ignores_input_order() {
        let mut paths = vec![
            PathBuf::from("data/z/a.json"),
            PathBuf::from("data/b.json"),
            PathBuf::from("data/a.json"),
        ];
        sort_paths(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("data/a.json"),
                PathBuf::from("data/b.json"),
                PathBuf::from("data/z/a.json"),
            ]
        );
    }
}
