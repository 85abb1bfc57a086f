use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/segue/config.toml` or `~/.config/segue/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SEGUE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub ui: UiSettings,
    pub catalog: CatalogSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// How often the audio thread reports position while playing (milliseconds).
    pub tick_ms: u64,
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Timeout for fetching a remote preview (seconds).
    pub fetch_timeout_secs: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tick_ms: 250,
            quit_fade_out_ms: 300,
            fetch_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Rate applied to every source until changed.
    pub default_rate: f64,
    /// Rates cycled through with `r`.
    pub rate_presets: Vec<f64>,
    pub start_muted: bool,
    /// Seconds to seek when pressing `H` / `L`.
    pub seek_step_secs: f64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            default_rate: 1.0,
            rate_presets: vec![1.0, 1.5, 2.0],
            start_muted: false,
            seek_step_secs: 10.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Whether the cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,

    /// Which track fields to show in the status "Now:" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show for the status line, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " ~ segue: previews, one at a time ~ ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Display],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// `Artist, Artist - Title`.
    Display,
    Title,
    Artist,
    Album,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON export or directory to open when none is given on the command line.
    pub path: Option<PathBuf>,
    /// File extensions to treat as audio when scanning (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: None,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `env_logger` filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Log file; defaults to `$XDG_STATE_HOME/segue/segue.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
