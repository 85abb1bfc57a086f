use std::time::Duration;

use crate::error::PlaybackError;
use crate::player::{PlayerEvent, PlayerState};
use crate::track::Track;

use super::{Generation, LoadOutcome, LoadTicket, MediaEvent, MediaHandle};

/// Sole owner of the media handle.
///
/// Returned `PlayerEvent`s are for the caller to feed into the store; the adapter
/// never touches the store itself.
pub struct MediaAdapter<H: MediaHandle> {
    handle: H,
    assigned: Option<LoadTicket>,
    last_generation: Generation,
}

impl<H: MediaHandle> MediaAdapter<H> {
    pub fn new(handle: H) -> Self {
        Self {
            handle,
            assigned: None,
            last_generation: 0,
        }
    }

    pub fn assigned_source(&self) -> Option<&str> {
        self.assigned.as_ref().map(|t| t.source.as_str())
    }

    /// True when `track` can be resumed without a fresh load.
    pub fn is_assigned(&self, track: &Track) -> bool {
        track.plays_source(self.assigned_source())
    }

    /// Load `track` if its source is not the assigned one, then request playback.
    pub fn load_and_play(&mut self, track: &Track) -> Vec<PlayerEvent> {
        let Some(source) = track.source_url.as_deref() else {
            self.handle.unload();
            self.assigned = None;
            let err = PlaybackError::LoadFailed {
                source_url: None,
                reason: format!("\"{}\" has no preview", track.title),
            };
            log::info!("{err}");
            return vec![PlayerEvent::Stopped, PlayerEvent::FaultReported(err)];
        };

        if let Some(ticket) = self.assigned.as_ref().filter(|t| t.source == source) {
            log::debug!("resuming {source} (generation {})", ticket.generation);
            self.handle.play(ticket);
            return Vec::new();
        }

        self.last_generation += 1;
        let ticket = LoadTicket {
            generation: self.last_generation,
            source: source.to_string(),
        };
        log::debug!("loading {source} (generation {})", ticket.generation);
        self.assigned = Some(ticket.clone());
        self.handle.load(ticket);
        Vec::new()
    }

    pub fn pause(&mut self) {
        self.handle.pause();
    }

    /// Clamp, write through, and report the new position.
    pub fn seek_to(&mut self, state: &PlayerState, seconds: f64) -> Option<PlayerEvent> {
        state.current_track.as_ref()?;
        let target = state.clamp_position(seconds);
        if self.assigned.is_some() {
            self.handle.seek(target);
        }
        Some(PlayerEvent::PositionReported(target))
    }

    pub fn seek_by(&mut self, state: &PlayerState, delta: f64) -> Option<PlayerEvent> {
        self.seek_to(state, state.position + delta)
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.handle.set_rate(rate);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.handle.set_muted(muted);
    }

    /// Map handle feedback to store events.
    ///
    /// Feedback for anything but the current assignment of the selected track's
    /// source is rejected as `StaleResolution`.
    pub fn translate(
        &mut self,
        state: &PlayerState,
        event: MediaEvent,
    ) -> Result<Vec<PlayerEvent>, PlaybackError> {
        let current = self
            .assigned
            .as_ref()
            .filter(|t| t.generation == event.generation())
            .filter(|t| Some(t.source.as_str()) == state.current_source())
            .cloned();
        let Some(ticket) = current else {
            let target = match &event {
                MediaEvent::Resolved { ticket, .. } => ticket.source.clone(),
                other => format!("generation {}", other.generation()),
            };
            return Err(PlaybackError::StaleResolution(target));
        };

        let events = match event {
            MediaEvent::Resolved { outcome, .. } => match outcome {
                LoadOutcome::Started => vec![PlayerEvent::Started],
                LoadOutcome::Ready => vec![PlayerEvent::Stopped],
                LoadOutcome::Rejected(reason) => {
                    log::warn!("playback of {} rejected: {reason}", ticket.source);
                    vec![
                        PlayerEvent::Stopped,
                        PlayerEvent::FaultReported(PlaybackError::PlaybackRejected(reason)),
                    ]
                }
                LoadOutcome::FailedToLoad(reason) => {
                    log::warn!("failed to load {}: {reason}", ticket.source);
                    let err = PlaybackError::LoadFailed {
                        source_url: Some(ticket.source),
                        reason,
                    };
                    // the next play of this track gets a fresh load
                    self.assigned = None;
                    vec![PlayerEvent::Stopped, PlayerEvent::FaultReported(err)]
                }
            },
            MediaEvent::PositionTick { seconds, .. } => {
                vec![PlayerEvent::PositionReported(seconds)]
            }
            MediaEvent::DurationKnown { seconds, .. } => {
                vec![PlayerEvent::DurationReported(seconds)]
            }
            MediaEvent::Ended { .. } => {
                vec![PlayerEvent::Stopped, PlayerEvent::PositionReported(0.0)]
            }
            MediaEvent::NativeStarted { .. } => vec![PlayerEvent::Started],
            MediaEvent::NativePaused { .. } => vec![PlayerEvent::Stopped],
        };
        Ok(events)
    }

    pub fn shutdown(&mut self, fade_out: Duration) {
        self.assigned = None;
        self.handle.shutdown(fade_out);
    }
}
