//! Media resource layer.
//!
//! A [`MediaHandle`] is the one thing that actually produces sound. The
//! [`MediaAdapter`] is its only owner: it turns coordinator intents into handle
//! operations and turns the handle's [`MediaEvent`] feedback into store events,
//! dropping feedback that belongs to a source the user already moved away from.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

mod adapter;
mod fetch;
mod load_slot;
mod rodio_handle;

#[cfg(test)]
pub(crate) mod fake;

pub use adapter::MediaAdapter;
pub use fetch::{Fetcher, local_path};
pub use rodio_handle::RodioHandle;

/// Monotonic id of a source assignment on the handle.
pub type Generation = u64;

/// Identifies one load attempt: which assignment, and which source it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: Generation,
    pub source: String,
}

/// Final result of a load-and-play request.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Started,
    /// Loaded, but held paused because a pause arrived while loading.
    Ready,
    /// The platform refused to start playback.
    Rejected(String),
    /// The stream could not be fetched or decoded.
    FailedToLoad(String),
}

/// Feedback from the handle. Everything is tagged with the generation it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    Resolved {
        ticket: LoadTicket,
        outcome: LoadOutcome,
    },
    PositionTick {
        generation: Generation,
        seconds: f64,
    },
    DurationKnown {
        generation: Generation,
        seconds: f64,
    },
    Ended {
        generation: Generation,
    },
    NativeStarted {
        generation: Generation,
    },
    NativePaused {
        generation: Generation,
    },
}

impl MediaEvent {
    pub fn generation(&self) -> Generation {
        match self {
            MediaEvent::Resolved { ticket, .. } => ticket.generation,
            MediaEvent::PositionTick { generation, .. }
            | MediaEvent::DurationKnown { generation, .. }
            | MediaEvent::Ended { generation }
            | MediaEvent::NativeStarted { generation }
            | MediaEvent::NativePaused { generation } => *generation,
        }
    }
}

/// Callback a handle uses to report [`MediaEvent`]s back to its owner.
#[derive(Clone)]
pub struct MediaEvents(Arc<dyn Fn(MediaEvent) + Send + Sync>);

impl MediaEvents {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(MediaEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn emit(&self, event: MediaEvent) {
        (self.0)(event)
    }
}

impl fmt::Debug for MediaEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MediaEvents")
    }
}

/// Platform abstraction over a single playable audio resource.
///
/// Every method returns immediately. Anything slow (fetching, decoding, waiting for
/// the device) happens behind the handle and is reported through [`MediaEvents`].
pub trait MediaHandle {
    /// Replace the current source with `ticket.source` and start it once loaded.
    fn load(&mut self, ticket: LoadTicket);
    /// Resume the source assigned under `ticket`.
    fn play(&mut self, ticket: &LoadTicket);
    /// Pause the assigned source, or cancel the autostart of a load in flight.
    ///
    /// Always acknowledged with `NativePaused` for the assigned generation, even when
    /// nothing was audible yet.
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_rate(&mut self, rate: f64);
    fn set_muted(&mut self, muted: bool);
    /// Drop the current source without assigning a new one.
    fn unload(&mut self);
    /// Release the resource, fading out over `fade_out`.
    fn shutdown(&mut self, fade_out: Duration);
}
