//! Track sources.
//!
//! A catalog is either a JSON export of the streaming catalog (album tracks, a raw
//! API page, or a bare array of tracks) or a local directory of audio files.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::CatalogSettings;
use crate::error::Result;
use crate::track::Track;

mod display;
mod json;
mod scan;

pub use display::display_from_fields;
pub use json::{parse, parse_file};
pub use scan::scan;

/// Load tracks from `path`: directories are scanned, anything else is parsed as JSON.
pub fn load(path: &Path, settings: &CatalogSettings) -> Result<Vec<Track>> {
    if path.is_dir() {
        Ok(scan(path, settings))
    } else {
        parse_file(path)
    }
}

/// Catalog to open: the command-line argument, then `catalog.path`, then the
/// current directory.
pub fn resolve_path(arg: Option<String>, settings: &CatalogSettings) -> PathBuf {
    arg.map(PathBuf::from)
        .or_else(|| settings.path.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
