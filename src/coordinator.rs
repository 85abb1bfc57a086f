//! Playback coordinator.
//!
//! The one façade every UI element talks to. Each intent becomes a message on a
//! single channel drained by the dispatch thread, which owns the [`Store`] and the
//! [`MediaAdapter`]. Media handle feedback arrives on the same channel, so every
//! state transition is applied in enqueue order on one thread.
//!
//! [`Store`]: crate::player::Store
//! [`MediaAdapter`]: crate::media::MediaAdapter

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::media::{MediaEvent, MediaEvents, MediaHandle};
use crate::player::PlayerState;
use crate::track::Track;

mod dispatch;
mod subscribe;

pub use subscribe::{Relevance, Subscription, TrackBinding};

use dispatch::Dispatcher;
use subscribe::Subscriber;

/// Latest published snapshot, shared with every `Coordinator` clone.
pub type SnapshotHandle = Arc<Mutex<Arc<PlayerState>>>;

#[derive(Debug, Clone)]
pub(crate) enum Intent {
    Play(Option<Track>),
    Pause,
    Toggle(Option<Track>),
    Seek(f64),
    SeekBy(f64),
    SetRate(f64),
    ToggleMute,
}

pub(crate) enum Msg {
    Intent(Intent),
    Media(MediaEvent),
    Subscribe(Subscriber),
    Unsubscribe(u64),
    /// Reply once everything queued before it has been applied.
    Settle(Sender<()>),
    Shutdown { fade_out: Duration },
}

#[derive(Clone)]
pub struct Coordinator {
    tx: Sender<Msg>,
    snapshot: SnapshotHandle,
    next_subscription: Arc<AtomicU64>,
    join: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Coordinator {
    /// Start the dispatch thread.
    ///
    /// `make_handle` runs on that thread and receives the callback the handle must
    /// use for its feedback. The initial rate and mute preference are applied to the
    /// handle before any intent is processed.
    pub fn spawn<H, F>(initial: PlayerState, make_handle: F) -> Result<Self>
    where
        H: MediaHandle + 'static,
        F: FnOnce(MediaEvents) -> H + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<Msg>();
        let snapshot: SnapshotHandle = Arc::new(Mutex::new(Arc::new(initial.clone())));

        let feedback_tx = tx.clone();
        let shared = snapshot.clone();
        let join = thread::Builder::new()
            .name("segue-dispatch".into())
            .spawn(move || {
                let events = MediaEvents::new(move |event| {
                    // Only fails once the dispatcher is gone; nothing left to inform.
                    let _ = feedback_tx.send(Msg::Media(event));
                });
                Dispatcher::new(initial, make_handle(events), shared).run(rx);
            })?;

        Ok(Self {
            tx,
            snapshot,
            next_subscription: Arc::new(AtomicU64::new(1)),
            join: Arc::new(Mutex::new(Some(join))),
        })
    }

    fn send(&self, msg: Msg) -> Result<()> {
        self.tx.send(msg).map_err(|_| Error::Disconnected)
    }

    fn intent(&self, intent: Intent) -> Result<()> {
        self.send(Msg::Intent(intent))
    }

    /// Select and start `track`, or resume the current track when `None`.
    pub fn play(&self, track: Option<&Track>) -> Result<()> {
        self.intent(Intent::Play(track.cloned()))
    }

    /// Stop playback, or cancel a start that is still loading. The snapshot shows
    /// it paused as soon as the intent is applied.
    pub fn pause(&self) -> Result<()> {
        self.intent(Intent::Pause)
    }

    /// Pause if `track` (or anything, when `None`) is playing or starting,
    /// otherwise play it. A toggle that arrives while an earlier pause is still
    /// unconfirmed by the handle does nothing.
    pub fn toggle(&self, track: Option<&Track>) -> Result<()> {
        self.intent(Intent::Toggle(track.cloned()))
    }

    /// Seek the current track to `seconds`, clamped to `[0, duration]`.
    ///
    /// Like every intent this is queued; `snapshot().position` shows the clamped
    /// target only once the intent has been applied, so call `settle()` first
    /// when reading it back.
    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.intent(Intent::Seek(seconds))
    }

    /// Seek relative to the position the dispatch thread holds when it applies
    /// the intent. Same read-back rule as `seek`.
    pub fn seek_by(&self, delta: f64) -> Result<()> {
        self.intent(Intent::SeekBy(delta))
    }

    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.intent(Intent::SetRate(rate))
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.intent(Intent::ToggleMute)
    }

    pub fn is_playing(&self, track: Option<&Track>) -> bool {
        self.snapshot().is_playing(track)
    }

    pub fn snapshot(&self) -> Arc<PlayerState> {
        match self.snapshot.lock() {
            Ok(s) => s.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Block until every message sent before this call has been applied.
    pub fn settle(&self) -> Result<()> {
        let (tx, rx) = mpsc::channel();
        self.send(Msg::Settle(tx))?;
        rx.recv().map_err(|_| Error::Disconnected)
    }

    /// Observe every snapshot change.
    pub fn subscribe(&self) -> Result<Subscription> {
        self.subscribe_with(Box::new(|_, _| true))
    }

    /// Observe snapshot changes accepted by `relevance(prev, next)`.
    pub fn subscribe_with(&self, relevance: Relevance) -> Result<Subscription> {
        let id = self.next_subscription.fetch_add(1, Ordering::Relaxed);
        let (subscriber, subscription) = subscribe::pair(id, relevance, self.tx.clone());
        self.send(Msg::Subscribe(subscriber))?;
        Ok(subscription)
    }

    /// Scoped view of the coordinator for a single track.
    pub fn bind(&self, track: Track) -> TrackBinding {
        TrackBinding::new(self.clone(), track)
    }

    /// Stop dispatching, fade out and release the media handle. Idempotent.
    pub fn shutdown(&self, fade_out: Duration) {
        if self.send(Msg::Shutdown { fade_out }).is_err() {
            log::debug!("coordinator already shut down");
        }
        let join = match self.join.lock() {
            Ok(mut j) => j.take(),
            Err(_) => None,
        };
        if let Some(j) = join {
            if j.join().is_err() {
                log::error!("dispatch thread panicked");
            }
        }
    }
}
