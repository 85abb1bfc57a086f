use std::path::Path;

use lofty::prelude::*;
use url::Url;
use walkdir::WalkDir;

use crate::config::CatalogSettings;
use crate::track::Track;

fn is_audio_file(path: &Path, settings: &CatalogSettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `file://` URL for `path`, falling back to the plain path.
fn source_for(path: &Path) -> String {
    let abs = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    Url::from_file_path(&abs)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| abs.display().to_string())
}

fn read_track(path: &Path) -> Track {
    let source = source_for(path);
    let mut track = Track {
        id: source.clone(),
        title: path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string(),
        source_url: Some(source),
        ..Track::default()
    };

    // Untagged or unreadable files keep the filename as title.
    if let Ok(tagged) = lofty::read_from_path(path) {
        let duration = tagged.properties().duration();
        if !duration.is_zero() {
            track.duration_hint = Some(duration);
        }
        if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
            if let Some(title) = non_empty(tag.title()) {
                track.title = title;
            }
            if let Some(artist) = non_empty(tag.artist()) {
                track.artists = vec![artist];
            }
            track.album = non_empty(tag.album());
        }
    }
    track
}

/// Audio files under `dir`, sorted case-insensitively by display name.
pub fn scan(dir: &Path, settings: &CatalogSettings) -> Vec<Track> {
    let mut walker = WalkDir::new(dir).follow_links(true);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_audio_file(e.path(), settings))
        .map(|e| read_track(e.path()))
        .collect();

    tracks.sort_by_key(|t| t.display().to_lowercase());
    log::info!("scanned {} tracks under {}", tracks.len(), dir.display());
    tracks
}

