//! File logger. The terminal is owned by the UI, so nothing is logged to stderr.

use std::fs::{self, File};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target};

use crate::config::{Config, APP_NAME};

/// `<cache dir>/wavedeck/wavedeck.log`.
pub fn default_log_file() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_NAME)
        .join(format!("{APP_NAME}.log"))
}

/// Route `log` output to the configured file. `RUST_LOG` overrides the configured level.
///
/// Returns the log path, or `None` when the file could not be created (logging stays off).
pub fn init(config: &Config) -> Option<PathBuf> {
    let path = config.log_file.clone().unwrap_or_else(default_log_file);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).ok()?;
    }
    let file = File::create(&path).ok()?;
    Builder::from_env(Env::default().default_filter_or(config.log_level.as_str()))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()
        .ok()?;
    Some(path)
}
