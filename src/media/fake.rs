//! Scriptable in-memory `MediaHandle` for tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{LoadTicket, MediaEvent, MediaEvents, MediaHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(LoadTicket),
    Play(LoadTicket),
    Pause,
    Seek(f64),
    SetRate(f64),
    SetMuted(bool),
    Unload,
    Shutdown,
}

/// Test-side view of a `FakeHandle`: recorded calls plus the event channel.
#[derive(Clone)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    events: Arc<Mutex<Option<MediaEvents>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            events: Arc::new(Mutex::new(None)),
        }
    }

    pub fn handle(&self, events: MediaEvents) -> FakeHandle {
        *self.events.lock().unwrap() = Some(events);
        FakeHandle {
            calls: self.calls.clone(),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<LoadTicket> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Load(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn last_load(&self) -> LoadTicket {
        self.loads().pop().expect("no load recorded")
    }

    pub fn emit(&self, event: MediaEvent) {
        let events = self.events.lock().unwrap().clone();
        events.expect("handle not created yet").emit(event);
    }
}

pub struct FakeHandle {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl FakeHandle {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl MediaHandle for FakeHandle {
    fn load(&mut self, ticket: LoadTicket) {
        self.record(Call::Load(ticket));
    }

    fn play(&mut self, ticket: &LoadTicket) {
        self.record(Call::Play(ticket.clone()));
    }

    fn pause(&mut self) {
        self.record(Call::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.record(Call::Seek(seconds));
    }

    fn set_rate(&mut self, rate: f64) {
        self.record(Call::SetRate(rate));
    }

    fn set_muted(&mut self, muted: bool) {
        self.record(Call::SetMuted(muted));
    }

    fn unload(&mut self) {
        self.record(Call::Unload);
    }

    fn shutdown(&mut self, _fade_out: Duration) {
        self.record(Call::Shutdown);
    }
}
