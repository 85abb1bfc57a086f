use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crate::error::PlaybackError;
use crate::media::{LoadOutcome, MediaAdapter, MediaEvent, MediaHandle};
use crate::player::{PlayerEvent, PlayerState, Store, clamp_rate};
use crate::track::Track;

use super::subscribe::Subscriber;
use super::{Intent, Msg, SnapshotHandle};

/// Owner of the store and the adapter; lives on the dispatch thread.
pub(super) struct Dispatcher<H: MediaHandle> {
    store: Store,
    adapter: MediaAdapter<H>,
    shared: SnapshotHandle,
    published: Arc<PlayerState>,
    subscribers: Vec<Subscriber>,
    /// A pause was sent and the handle has not acknowledged it yet.
    pause_pending: bool,
}

impl<H: MediaHandle> Dispatcher<H> {
    pub(super) fn new(initial: PlayerState, handle: H, shared: SnapshotHandle) -> Self {
        let mut adapter = MediaAdapter::new(handle);
        adapter.set_rate(initial.playback_rate);
        adapter.set_muted(initial.muted);

        Self {
            published: Arc::new(initial.clone()),
            store: Store::new(initial),
            adapter,
            shared,
            subscribers: Vec::new(),
            pause_pending: false,
        }
    }

    pub(super) fn run(mut self, rx: Receiver<Msg>) {
        while let Ok(msg) = rx.recv() {
            match msg {
                Msg::Intent(intent) => {
                    log::debug!("intent {intent:?}");
                    if let Err(e) = self.intent(intent) {
                        log::info!("{e}");
                    }
                }
                Msg::Media(event) => self.media(event),
                Msg::Subscribe(subscriber) => {
                    if subscriber.deliver(self.published.clone()) {
                        self.subscribers.push(subscriber);
                    }
                }
                Msg::Unsubscribe(id) => self.subscribers.retain(|s| s.id() != id),
                Msg::Settle(reply) => {
                    let _ = reply.send(());
                }
                Msg::Shutdown { fade_out } => {
                    self.adapter.shutdown(fade_out);
                    break;
                }
            }
            self.publish();
        }
        log::debug!("dispatch thread exiting");
    }

    fn apply(&mut self, event: PlayerEvent) {
        self.store.dispatch(&event);
    }

    fn apply_all(&mut self, events: Vec<PlayerEvent>) {
        for event in events {
            self.apply(event);
        }
    }

    fn intent(&mut self, intent: Intent) -> Result<(), PlaybackError> {
        match intent {
            Intent::Play(track) => self.play(track)?,
            Intent::Pause => self.pause(),
            Intent::Toggle(track) => self.toggle(track)?,
            Intent::Seek(seconds) => {
                if let Some(event) = self.adapter.seek_to(self.store.state(), seconds) {
                    self.apply(event);
                }
            }
            Intent::SeekBy(delta) => {
                if let Some(event) = self.adapter.seek_by(self.store.state(), delta) {
                    self.apply(event);
                }
            }
            Intent::SetRate(rate) => {
                let rate = clamp_rate(rate);
                self.adapter.set_rate(rate);
                self.apply(PlayerEvent::RateChanged(rate));
            }
            Intent::ToggleMute => {
                self.apply(PlayerEvent::MuteToggled);
                self.adapter.set_muted(self.store.state().muted);
            }
        }
        Ok(())
    }

    fn play(&mut self, track: Option<Track>) -> Result<(), PlaybackError> {
        let track = match track {
            Some(t) => t,
            None => self
                .store
                .state()
                .current_track
                .clone()
                .ok_or(PlaybackError::NoActiveTrack)?,
        };

        self.pause_pending = false;

        // Resuming the assigned source keeps the position; anything else is a
        // fresh selection.
        let resumes = track.plays_source(self.store.state().current_source())
            && self.adapter.is_assigned(&track);
        if resumes {
            self.apply(PlayerEvent::StartRequested);
        } else {
            self.apply(PlayerEvent::TrackSelected(track.clone()));
        }

        let events = self.adapter.load_and_play(&track);
        self.apply_all(events);
        Ok(())
    }

    /// Pause or play, decided on the store as this thread sees it.
    ///
    /// A requested start already counts as playing. While a pause is still
    /// unacknowledged, a further toggle of the same source is absorbed: the
    /// handle may not have stopped yet, and a second transition would race it.
    fn toggle(&mut self, track: Option<Track>) -> Result<(), PlaybackError> {
        let state = self.store.state();
        let same_source = track
            .as_ref()
            .is_none_or(|t| t.plays_source(state.current_source()));
        if self.pause_pending && same_source {
            log::debug!("toggle absorbed by pending pause");
            return Ok(());
        }
        if state.is_active(track.as_ref()) {
            self.pause();
            Ok(())
        } else {
            self.play(track)
        }
    }

    /// Applied right away; the handle's acknowledgement clears `pause_pending`.
    fn pause(&mut self) {
        let state = self.store.state();
        if state.playing || state.loading {
            self.adapter.pause();
            self.apply(PlayerEvent::Stopped);
            self.pause_pending = true;
        }
    }

    fn media(&mut self, event: MediaEvent) {
        let acknowledges_pause = matches!(
            &event,
            MediaEvent::NativePaused { .. } | MediaEvent::Ended { .. }
        ) || matches!(
            &event,
            MediaEvent::Resolved { outcome, .. } if *outcome != LoadOutcome::Started
        );

        match self.adapter.translate(self.store.state(), event) {
            Ok(mut events) => {
                if self.pause_pending {
                    if acknowledges_pause {
                        self.pause_pending = false;
                    } else {
                        // sent before the handle saw the pause
                        events.retain(|e| *e != PlayerEvent::Started);
                    }
                }
                self.apply_all(events);
            }
            Err(e) => log::debug!("discarded: {e}"),
        }
    }

    fn publish(&mut self) {
        if *self.published == *self.store.state() {
            return;
        }
        let prev = std::mem::replace(&mut self.published, Arc::new(self.store.state().clone()));
        let next = self.published.clone();

        if let Ok(mut shared) = self.shared.lock() {
            *shared = next.clone();
        }
        self.subscribers
            .retain(|s| !s.is_relevant(&prev, &next) || s.deliver(next.clone()));
    }
}
