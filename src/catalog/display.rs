use crate::config::TrackDisplayField;
use crate::track::Track;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// This composes metadata fields (artists, title, album) in the configured order and
/// falls back to the title when no parts were produced.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let title = track.title.trim();
    let artists = track
        .artists
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut parts: Vec<String> = Vec::new();
    for f in fields {
        match f {
            TrackDisplayField::Display => parts.push(track.display()),
            TrackDisplayField::Title => {
                if !title.is_empty() {
                    parts.push(title.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if !artists.is_empty() {
                    parts.push(artists.clone());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = track.album.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
                    parts.push(a.to_string());
                }
            }
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
