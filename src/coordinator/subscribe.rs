use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crate::error::Result;
use crate::player::PlayerState;
use crate::track::Track;

use super::{Coordinator, Msg};

/// `(prev, next) -> bool`: whether a transition is worth a notification.
pub type Relevance = Box<dyn Fn(&PlayerState, &PlayerState) -> bool + Send>;

/// Dispatcher-side end of a subscription.
pub(crate) struct Subscriber {
    id: u64,
    tx: Sender<Arc<PlayerState>>,
    relevance: Relevance,
}

impl Subscriber {
    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn is_relevant(&self, prev: &PlayerState, next: &PlayerState) -> bool {
        (self.relevance)(prev, next)
    }

    /// False once the receiving side is gone.
    pub(crate) fn deliver(&self, snapshot: Arc<PlayerState>) -> bool {
        self.tx.send(snapshot).is_ok()
    }
}

/// Receiver of published snapshots. Dropping it unregisters the subscriber.
pub struct Subscription {
    id: u64,
    rx: Receiver<Arc<PlayerState>>,
    control: Sender<Msg>,
}

pub(crate) fn pair(id: u64, relevance: Relevance, control: Sender<Msg>) -> (Subscriber, Subscription) {
    let (tx, rx) = mpsc::channel();
    (
        Subscriber { id, tx, relevance },
        Subscription { id, rx, control },
    )
}

impl Subscription {
    /// Next snapshot, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Arc<PlayerState>> {
        match self.rx.recv_timeout(timeout) {
            Ok(s) => Some(s),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Newest pending snapshot, discarding older ones.
    pub fn try_latest(&self) -> Option<Arc<PlayerState>> {
        self.rx.try_iter().last()
    }

    /// All pending snapshots in publish order.
    pub fn drain(&self) -> Vec<Arc<PlayerState>> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.control.send(Msg::Unsubscribe(self.id));
    }
}

/// What a single track's row shows: selected, playing, loading, failed.
fn row_view(state: &PlayerState, track: &Track) -> (bool, bool, bool, bool) {
    let selected = track.plays_source(state.current_source());
    (
        selected,
        selected && state.playing,
        selected && state.loading,
        selected && state.fault.is_some(),
    )
}

/// The coordinator scoped to one track, for per-row play buttons.
#[derive(Clone)]
pub struct TrackBinding {
    coordinator: Coordinator,
    track: Track,
}

impl TrackBinding {
    pub(crate) fn new(coordinator: Coordinator, track: Track) -> Self {
        Self { coordinator, track }
    }

    /// True only while this track's source is the one playing.
    pub fn is_playing(&self) -> bool {
        self.coordinator.is_playing(Some(&self.track))
    }

    pub fn play(&self) -> Result<()> {
        self.coordinator.play(Some(&self.track))
    }

    pub fn toggle(&self) -> Result<()> {
        self.coordinator.toggle(Some(&self.track))
    }

    /// Notified only when this row's view changes.
    pub fn subscribe(&self) -> Result<Subscription> {
        let track = self.track.clone();
        self.coordinator.subscribe_with(Box::new(move |prev, next| {
            row_view(prev, &track) != row_view(next, &track)
        }))
    }
}
