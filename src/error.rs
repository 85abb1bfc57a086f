//! Error types.
//!
//! `PlaybackError` covers the recoverable failures of the playback core. None of them
//! is fatal: each one degrades to a stopped, track-still-known state. `Error` is the
//! application-level error returned by fallible setup code and by intents sent to a
//! coordinator that has already shut down.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaybackError {
    /// `play()` without a track while nothing was ever selected.
    #[error("no track selected")]
    NoActiveTrack,
    /// The stream could not be fetched or decoded.
    #[error("failed to load {}: {reason}", .source_url.as_deref().unwrap_or("<no preview>"))]
    LoadFailed {
        source_url: Option<String>,
        reason: String,
    },
    /// The platform declined to start playback (e.g. no output device).
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),
    /// A resolution arrived for a source that is no longer selected.
    #[error("stale resolution for {0}")]
    StaleResolution(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("playback coordinator has shut down")]
    Disconnected,
    #[error("config: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("catalog {path}: {reason}")]
    Catalog { path: String, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("fetch: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("logger: {0}")]
    Logger(#[from] log::SetLoggerError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
