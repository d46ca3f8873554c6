use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, LevelFilter, TermLogger, TerminalMode,
    WriteLogger,
};

/// Log to the terminal and to `<log_dir>/<tool>_<timestamp>.log`.
///
/// Returns the log file path.
pub fn init_logging(log_dir: &Path, tool: &str, level: LevelFilter) -> Result<PathBuf> {
    create_dir_all(log_dir)
        .with_context(|| format!("could not create {}", log_dir.display()))?;
    let ts = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let log_path = log_dir.join(format!("{tool}_{ts}.log"));

    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            ConfigBuilder::new().set_time_level(LevelFilter::Off).build(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(
            level,
            Config::default(),
            File::create(&log_path)
                .with_context(|| format!("could not create {}", log_path.display()))?,
        ),
    ])
    .context("failed to initialise logger")?;

    Ok(log_path)
}
