use std::time::Duration;

/// A playable catalog entry.
///
/// Tracks are supplied by the catalog and never mutated once handed to the
/// coordinator. Playback identity is the `source_url`, not the `id`: two rows that
/// rebuild the same logical track independently still compare as the same source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
    /// Preview stream location. `None` for tracks without a playable preview.
    pub source_url: Option<String>,
    /// Catalog-reported length; the media handle's duration wins once known.
    pub duration_hint: Option<Duration>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_url: Option<&str>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source_url: source_url.map(str::to_string),
            ..Self::default()
        }
    }

    /// True when both tracks resolve to the same (present) audio source.
    pub fn same_source(&self, other: &Track) -> bool {
        self.plays_source(other.source_url.as_deref())
    }

    pub fn plays_source(&self, source: Option<&str>) -> bool {
        matches!((self.source_url.as_deref(), source), (Some(a), Some(b)) if a == b)
    }

    pub fn has_preview(&self) -> bool {
        self.source_url.is_some()
    }

    /// `Artist, Artist - Title`, or just the title when no artist is known.
    pub fn display(&self) -> String {
        let artists: Vec<&str> = self
            .artists
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if artists.is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", artists.join(", "), self.title)
        }
    }
}
