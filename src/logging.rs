//! Logger setup.
//!
//! The terminal UI owns stdout/stderr while running, so records go to a file:
//! `logging.file` when configured, otherwise `$XDG_STATE_HOME/segue/segue.log`.
//! `RUST_LOG` overrides `logging.level`.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use env_logger::{Builder, Env, Target};

use crate::config::{LoggingSettings, default_log_path};
use crate::error::Result;

/// Where records will be written, if anywhere.
pub fn log_path(settings: &LoggingSettings) -> Option<PathBuf> {
    settings.file.clone().or_else(default_log_path)
}

/// Install the global logger. Returns the file being written to.
pub fn init(settings: &LoggingSettings) -> Result<Option<PathBuf>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(settings.level.as_str()));
    builder.format_timestamp_millis();

    let path = log_path(settings);
    let target = match &path {
        Some(p) => {
            if let Some(dir) = p.parent() {
                fs::create_dir_all(dir)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(p)?;
            Target::Pipe(Box::new(file))
        }
        None => Target::Stderr,
    };
    builder.target(target).try_init()?;

    log::info!("segue {} starting", env!("CARGO_PKG_VERSION"));
    Ok(path)
}
