use crate::error::PlaybackError;
use crate::track::Track;

pub const MIN_RATE: f64 = 0.25;
pub const MAX_RATE: f64 = 4.0;

/// Snapshot of the player as seen by every observer.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub current_track: Option<Track>,
    pub playing: bool,
    /// A source was selected and neither a start nor a stop has been observed.
    pub loading: bool,
    pub muted: bool,
    pub playback_rate: f64,
    /// Seconds; 0 until the media handle reports it.
    pub duration: f64,
    /// Seconds into the current track.
    pub position: f64,
    /// Last failure for the current track.
    pub fault: Option<PlaybackError>,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            playing: false,
            loading: false,
            muted: false,
            playback_rate: 1.0,
            duration: 0.0,
            position: 0.0,
            fault: None,
        }
    }
}

/// Coarse view of the state machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Loading,
    Playing,
    Paused,
}

impl PlayerState {
    pub fn with_preferences(playback_rate: f64, muted: bool) -> Self {
        Self {
            playback_rate: clamp_rate(playback_rate),
            muted,
            ..Self::default()
        }
    }

    pub fn status(&self) -> PlaybackStatus {
        match (&self.current_track, self.playing, self.loading) {
            (None, _, _) => PlaybackStatus::Idle,
            (Some(_), true, _) => PlaybackStatus::Playing,
            (Some(_), false, true) => PlaybackStatus::Loading,
            (Some(_), false, false) => PlaybackStatus::Paused,
        }
    }

    /// Source of the selected track, if it has one.
    pub fn current_source(&self) -> Option<&str> {
        self.current_track
            .as_ref()
            .and_then(|t| t.source_url.as_deref())
    }

    /// `playing`, optionally scoped to `track`'s source.
    pub fn is_playing(&self, track: Option<&Track>) -> bool {
        match track {
            None => self.playing,
            Some(t) => self.playing && t.plays_source(self.current_source()),
        }
    }

    /// Playing, or a start is pending, optionally scoped to `track`'s source.
    ///
    /// This is what `toggle` decides on: a start that was requested but not yet
    /// confirmed by the handle already counts as playing.
    pub fn is_active(&self, track: Option<&Track>) -> bool {
        let active = self.playing || self.loading;
        match track {
            None => active,
            Some(t) => active && t.plays_source(self.current_source()),
        }
    }

    /// Clamp a seek target into the playable range. While the duration is unknown
    /// only the lower bound applies.
    pub fn clamp_position(&self, seconds: f64) -> f64 {
        let s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if self.duration > 0.0 { s.min(self.duration) } else { s }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    TrackSelected(Track),
    /// Playback of the current source was requested; cleared by `Started` or `Stopped`.
    StartRequested,
    Started,
    Stopped,
    MuteToggled,
    PositionReported(f64),
    DurationReported(f64),
    RateChanged(f64),
    FaultReported(PlaybackError),
}

pub fn clamp_rate(rate: f64) -> f64 {
    if rate.is_finite() {
        rate.clamp(MIN_RATE, MAX_RATE)
    } else {
        1.0
    }
}

/// Apply one event. Pure and total.
pub fn reduce(state: &PlayerState, event: &PlayerEvent) -> PlayerState {
    let mut next = state.clone();
    match event {
        PlayerEvent::TrackSelected(track) => {
            next.loading = track.has_preview();
            next.current_track = Some(track.clone());
            next.position = 0.0;
            next.duration = 0.0;
            next.fault = None;
        }
        PlayerEvent::StartRequested => {
            if !next.playing && next.current_track.as_ref().is_some_and(Track::has_preview) {
                next.loading = true;
                next.fault = None;
            }
        }
        PlayerEvent::Started => {
            // playing without a track is not a reachable state
            if next.current_track.is_some() {
                next.playing = true;
                next.loading = false;
                next.fault = None;
            }
        }
        PlayerEvent::Stopped => {
            next.playing = false;
            next.loading = false;
        }
        PlayerEvent::MuteToggled => {
            next.muted = !next.muted;
        }
        PlayerEvent::PositionReported(seconds) => {
            next.position = next.clamp_position(*seconds);
        }
        PlayerEvent::DurationReported(seconds) => {
            next.duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
            next.position = next.clamp_position(next.position);
        }
        PlayerEvent::RateChanged(rate) => {
            next.playback_rate = clamp_rate(*rate);
        }
        PlayerEvent::FaultReported(err) => {
            next.playing = false;
            next.loading = false;
            next.fault = Some(err.clone());
        }
    }
    next
}

/// Owner of the live `PlayerState`.
#[derive(Debug, Default)]
pub struct Store {
    state: PlayerState,
}

impl Store {
    pub fn new(initial: PlayerState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Apply `event`; returns true when the snapshot changed.
    pub fn dispatch(&mut self, event: &PlayerEvent) -> bool {
        let next = reduce(&self.state, event);
        if next == self.state {
            return false;
        }
        log::trace!("store: {event:?}");
        self.state = next;
        true
    }
}
