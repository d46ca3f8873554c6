//! Merge scattered product JSON files into one table keyed by sku, then
//! left-join an input CSV against it.

pub mod config;
pub mod discover;
pub mod error;
pub mod extract;
pub mod join;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod table;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use extract::{FileBatch, KeyFields, ProductRecord};
pub use join::JoinSpec;
pub use merge::MergedTable;
pub use pipeline::{run, RunSummary};
pub use table::Table;
