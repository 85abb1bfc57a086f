use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::media::local_path;
use crate::track::Track;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    /// Album-tracks response or a full album: `{"tracks": [...]}` / `{"tracks": {"items": [...]}}`.
    Album {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        artists: Vec<RawArtist>,
        tracks: TrackList,
    },
    /// Raw catalog API page.
    Page { items: Vec<RawTrack> },
    Bare(Vec<RawTrack>),
    Single(RawTrack),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TrackList {
    Flat(Vec<RawTrack>),
    Paged { items: Vec<RawTrack> },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTrack {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<RawArtist>,
    #[serde(default)]
    album: Option<RawAlbum>,
    #[serde(default, alias = "duration_ms")]
    duration_ms: Option<u64>,
    #[serde(default, alias = "preview_url")]
    preview_url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawArtist {
    Name(String),
    Object { name: String },
}

impl RawArtist {
    fn into_name(self) -> String {
        match self {
            RawArtist::Name(n) | RawArtist::Object { name: n } => n,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAlbum {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
    },
}

/// Album-level fields inherited by tracks that lack them.
#[derive(Default)]
struct Inherited {
    album: Option<String>,
    artists: Vec<String>,
}

/// Parse a catalog JSON document. Relative local previews resolve against `base`.
pub fn parse(text: &str, base: Option<&Path>) -> Result<Vec<Track>> {
    let doc: Document = serde_json::from_str(text)?;

    let (raw, inherited) = match doc {
        Document::Album {
            name,
            artists,
            tracks,
        } => {
            let items = match tracks {
                TrackList::Flat(v) | TrackList::Paged { items: v } => v,
            };
            let inherited = Inherited {
                album: name,
                artists: artists.into_iter().map(RawArtist::into_name).collect(),
            };
            (items, inherited)
        }
        Document::Page { items } | Document::Bare(items) => (items, Inherited::default()),
        Document::Single(t) => (vec![t], Inherited::default()),
    };

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(i, t)| into_track(i, t, &inherited, base))
        .collect())
}

pub fn parse_file(path: &Path) -> Result<Vec<Track>> {
    let text = fs::read_to_string(path).map_err(|e| catalog_error(path, e))?;
    let tracks = parse(&text, path.parent()).map_err(|e| catalog_error(path, e))?;
    log::info!("loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}

fn catalog_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Catalog {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn into_track(index: usize, raw: RawTrack, inherited: &Inherited, base: Option<&Path>) -> Track {
    let mut artists: Vec<String> = raw
        .artists
        .into_iter()
        .map(RawArtist::into_name)
        .filter(|a| !a.trim().is_empty())
        .collect();
    if artists.is_empty() {
        artists = inherited.artists.clone();
    }

    let album = match raw.album {
        Some(RawAlbum::Name(n)) => Some(n),
        Some(RawAlbum::Object { name }) => name,
        None => None,
    }
    .or_else(|| inherited.album.clone());

    let source_url = raw
        .preview_url
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|s| resolve_source(s, base));

    Track {
        id: raw
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("track-{index}")),
        title: raw.name,
        artists,
        album,
        source_url,
        duration_hint: raw.duration_ms.map(Duration::from_millis),
    }
}

fn resolve_source(source: String, base: Option<&Path>) -> String {
    match (local_path(&source), base) {
        (Some(p), Some(base)) if p.is_relative() => base.join(p).to_string_lossy().into_owned(),
        _ => source,
    }
}
