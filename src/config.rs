use std::path::PathBuf;

use crate::extract::KeyFields;
use crate::join::JoinSpec;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_INPUT_CSV: &str = "input.csv";
pub const DEFAULT_MERGED_OUTPUT: &str = "merged_output.csv";
pub const DEFAULT_JOINED_OUTPUT: &str = "joined_output.csv";

// Fields the merged output always carries, blank when no record has them
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["name", "brand"];

/// Locations and policies for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub input_csv: PathBuf,
    // Walked for a file named like `input_csv` when that path is missing
    pub search_root: PathBuf,
    pub merged_output: PathBuf,
    pub joined_output: PathBuf,
    pub keys: KeyFields,
    pub join: JoinSpec,
    pub required_fields: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            input_csv: PathBuf::from(DEFAULT_INPUT_CSV),
            search_root: PathBuf::from("."),
            merged_output: PathBuf::from(DEFAULT_MERGED_OUTPUT),
            joined_output: PathBuf::from(DEFAULT_JOINED_OUTPUT),
            keys: KeyFields::default(),
            join: JoinSpec::default(),
            required_fields: DEFAULT_REQUIRED_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PipelineConfig {
    /// Resolve every relative location against `base`.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let defaults = Self::default();
        Self {
            data_dir: base.join(defaults.data_dir),
            input_csv: base.join(defaults.input_csv),
            merged_output: base.join(defaults.merged_output),
            joined_output: base.join(defaults.joined_output),
            search_root: base,
            ..defaults
        }
    }
}
