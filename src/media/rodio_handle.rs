//! `MediaHandle` backed by a `rodio` sink living on its own audio thread.
//!
//! The handle side only sends commands; the thread decodes sources, drives the
//! sink, and reports back through `MediaEvents`. Fetching happens on short-lived
//! worker threads that post their bytes back onto the command channel, so the
//! thread never blocks on the network and a newer load always wins. Position
//! ticks and end-of-stream detection ride on the command channel's receive timeout.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::config::AudioSettings;

use super::fetch::Fetcher;
use super::load_slot::{LoadSlot, Resume, plan_resume};
use super::{LoadOutcome, LoadTicket, MediaEvent, MediaEvents, MediaHandle};

enum HandleCmd {
    Load(LoadTicket),
    Play(LoadTicket),
    Pause,
    Seek(f64),
    SetRate(f64),
    SetMuted(bool),
    Unload,
    /// Sent by a fetch worker, never by the handle.
    Fetched {
        ticket: LoadTicket,
        bytes: Result<Vec<u8>, String>,
    },
    Quit { fade_out_ms: u64 },
}

impl fmt::Debug for HandleCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleCmd::Load(t) => write!(f, "Load({})", t.source),
            HandleCmd::Play(t) => write!(f, "Play({})", t.source),
            HandleCmd::Pause => f.write_str("Pause"),
            HandleCmd::Seek(s) => write!(f, "Seek({s})"),
            HandleCmd::SetRate(r) => write!(f, "SetRate({r})"),
            HandleCmd::SetMuted(m) => write!(f, "SetMuted({m})"),
            HandleCmd::Unload => f.write_str("Unload"),
            HandleCmd::Fetched { ticket, .. } => write!(f, "Fetched({})", ticket.source),
            HandleCmd::Quit { fade_out_ms } => write!(f, "Quit({fade_out_ms}ms)"),
        }
    }
}

pub struct RodioHandle {
    tx: Sender<HandleCmd>,
    join: Option<JoinHandle<()>>,
}

impl RodioHandle {
    pub fn spawn(settings: &AudioSettings, events: MediaEvents) -> Self {
        let (tx, rx) = mpsc::channel::<HandleCmd>();
        let tick = Duration::from_millis(settings.tick_ms.max(10));
        let fetcher = Fetcher::new(Duration::from_secs(settings.fetch_timeout_secs));

        let worker_tx = tx.clone();
        let join = thread::Builder::new()
            .name("segue-audio".into())
            .spawn(move || AudioThread::new(events, fetcher, worker_tx).run(rx, tick))
            .map_err(|e| log::error!("failed to spawn audio thread: {e}"))
            .ok();

        Self { tx, join }
    }

    fn send(&self, cmd: HandleCmd) {
        if let Err(e) = self.tx.send(cmd) {
            log::warn!("audio thread is gone, dropping {:?}", e.0);
        }
    }
}

impl MediaHandle for RodioHandle {
    fn load(&mut self, ticket: LoadTicket) {
        self.send(HandleCmd::Load(ticket));
    }

    fn play(&mut self, ticket: &LoadTicket) {
        self.send(HandleCmd::Play(ticket.clone()));
    }

    fn pause(&mut self) {
        self.send(HandleCmd::Pause);
    }

    fn seek(&mut self, seconds: f64) {
        self.send(HandleCmd::Seek(seconds));
    }

    fn set_rate(&mut self, rate: f64) {
        self.send(HandleCmd::SetRate(rate));
    }

    fn set_muted(&mut self, muted: bool) {
        self.send(HandleCmd::SetMuted(muted));
    }

    fn unload(&mut self) {
        self.send(HandleCmd::Unload);
    }

    fn shutdown(&mut self, fade_out: Duration) {
        self.send(HandleCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for RodioHandle {
    fn drop(&mut self) {
        // The audio thread holds a sender for its fetch workers, so it never sees
        // the channel disconnect on its own.
        if self.join.is_some() {
            let _ = self.tx.send(HandleCmd::Quit { fade_out_ms: 0 });
        }
    }
}

/// A decoded source currently assigned to the sink.
struct Loaded {
    ticket: LoadTicket,
    bytes: Arc<[u8]>,
    hint: Option<String>,
    sink: Sink,
}

struct AudioThread {
    events: MediaEvents,
    fetcher: Fetcher,
    /// Handed to fetch workers so their results queue behind newer commands.
    worker_tx: Sender<HandleCmd>,
    stream: Option<OutputStream>,
    slot: LoadSlot,
    current: Option<Loaded>,
    playing: bool,
    rate: f64,
    muted: bool,
}

impl AudioThread {
    fn new(events: MediaEvents, fetcher: Fetcher, worker_tx: Sender<HandleCmd>) -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut s) => {
                // rodio logs to stderr when the stream is dropped; the TUI owns stderr.
                s.log_on_drop(false);
                Some(s)
            }
            Err(e) => {
                log::error!("no audio output device: {e}");
                None
            }
        };

        Self {
            events,
            fetcher,
            worker_tx,
            stream,
            slot: LoadSlot::default(),
            current: None,
            playing: false,
            rate: 1.0,
            muted: false,
        }
    }

    fn run(mut self, rx: Receiver<HandleCmd>, tick: Duration) {
        loop {
            match rx.recv_timeout(tick) {
                Ok(HandleCmd::Quit { fade_out_ms }) => {
                    self.slot.cancel();
                    if let Some(loaded) = self.current.take() {
                        if self.playing {
                            fade_out_sink(&loaded.sink, fade_out_ms, self.volume());
                        }
                        loaded.sink.stop();
                    }
                    break;
                }
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => self.tick(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        log::debug!("audio thread exiting");
    }

    fn handle(&mut self, cmd: HandleCmd) {
        match cmd {
            HandleCmd::Load(ticket) => self.load(ticket),
            HandleCmd::Play(ticket) => self.play(ticket),
            HandleCmd::Pause => self.pause(),
            HandleCmd::Seek(seconds) => {
                if !self.slot.seek(seconds) {
                    self.seek(seconds);
                }
            }
            HandleCmd::SetRate(rate) => {
                self.rate = rate;
                if let Some(loaded) = &self.current {
                    loaded.sink.set_speed(rate as f32);
                }
            }
            HandleCmd::SetMuted(muted) => {
                self.muted = muted;
                let volume = self.volume();
                if let Some(loaded) = &self.current {
                    loaded.sink.set_volume(volume);
                }
            }
            HandleCmd::Unload => {
                self.slot.cancel();
                self.stop_current();
            }
            HandleCmd::Fetched { ticket, bytes } => self.fetched(ticket, bytes),
            HandleCmd::Quit { .. } => {}
        }
    }

    fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { 1.0 }
    }

    fn stop_current(&mut self) {
        if let Some(old) = self.current.take() {
            old.sink.stop();
        }
        self.playing = false;
    }

    /// Silence the old source right away and fetch the new one off this thread.
    fn load(&mut self, ticket: LoadTicket) {
        self.stop_current();

        if self.stream.is_none() {
            self.slot.cancel();
            self.resolve(ticket, LoadOutcome::Rejected("no audio output device".into()));
            return;
        }

        self.slot.begin(ticket.clone());
        let fetcher = self.fetcher.clone();
        let tx = self.worker_tx.clone();
        let worker_ticket = ticket.clone();
        let spawned = thread::Builder::new()
            .name("segue-fetch".into())
            .spawn(move || {
                let bytes = fetcher
                    .fetch(&worker_ticket.source)
                    .map_err(|e| e.to_string());
                // Only fails once the audio thread has quit.
                let _ = tx.send(HandleCmd::Fetched {
                    ticket: worker_ticket,
                    bytes,
                });
            });
        if let Err(e) = spawned {
            self.slot.cancel();
            self.resolve(ticket, LoadOutcome::FailedToLoad(format!("fetch worker: {e}")));
        }
    }

    /// Bytes for `ticket` arrived. Ignored unless it is still the latest load.
    fn fetched(&mut self, ticket: LoadTicket, bytes: Result<Vec<u8>, String>) {
        let Some(pending) = self.slot.finish(&ticket) else {
            log::debug!("dropping superseded fetch of {}", ticket.source);
            return;
        };
        let bytes: Arc<[u8]> = match bytes {
            Ok(b) => b.into(),
            Err(reason) => {
                self.resolve(ticket, LoadOutcome::FailedToLoad(reason));
                return;
            }
        };
        let Some(stream) = self.stream.as_ref() else {
            self.resolve(ticket, LoadOutcome::Rejected("no audio output device".into()));
            return;
        };
        let hint = extension_hint(&ticket.source);

        let (sink, duration) = match create_sink_at(stream, &bytes, hint.as_deref(), pending.start_at) {
            Ok(v) => v,
            Err(reason) => {
                self.resolve(ticket, LoadOutcome::FailedToLoad(reason));
                return;
            }
        };
        sink.set_speed(self.rate as f32);
        sink.set_volume(self.volume());

        let generation = ticket.generation;
        if let Some(d) = duration {
            self.events.emit(MediaEvent::DurationKnown {
                generation,
                seconds: d.as_secs_f64(),
            });
        }
        if !pending.start_at.is_zero() {
            self.events.emit(MediaEvent::PositionTick {
                generation,
                seconds: pending.start_at.as_secs_f64(),
            });
        }

        if pending.autostart {
            sink.play();
            self.playing = true;
        }
        self.current = Some(Loaded {
            ticket: ticket.clone(),
            bytes,
            hint,
            sink,
        });

        if pending.autostart {
            log::info!("playing {}", ticket.source);
            self.resolve(ticket, LoadOutcome::Started);
            self.emit_native(true);
        } else {
            log::debug!("loaded {} held paused", ticket.source);
            self.resolve(ticket, LoadOutcome::Ready);
        }
    }

    fn play(&mut self, ticket: LoadTicket) {
        if self.slot.resume(&ticket) {
            return;
        }
        let loaded = self.current.as_ref().map(|l| &l.ticket);
        let ended = self.current.as_ref().is_some_and(|l| l.sink.empty());
        match plan_resume(loaded, &ticket, ended) {
            // never loaded here (or dropped after a failure): start over
            Resume::Load => {
                self.load(ticket);
                return;
            }
            Resume::Rebuild => self.rebuild_at(Duration::ZERO),
            Resume::Continue => {}
        }
        if let Some(loaded) = &self.current {
            loaded.sink.play();
            if !self.playing {
                self.playing = true;
                self.emit_native(true);
            }
        }
    }

    /// Always acknowledged, so the owner can tell its pause was seen.
    fn pause(&mut self) {
        if let Some(generation) = self.slot.hold() {
            self.events.emit(MediaEvent::NativePaused { generation });
            return;
        }
        if let Some(loaded) = &self.current {
            loaded.sink.pause();
            self.playing = false;
            self.emit_native(false);
        }
    }

    fn seek(&mut self, seconds: f64) {
        let target = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or_default();
        if self.current.as_ref().is_some_and(|l| l.sink.empty()) {
            self.rebuild_at(target);
            return;
        }
        if let Some(loaded) = &self.current {
            if let Err(e) = loaded.sink.try_seek(target) {
                log::warn!("seek in {} failed: {e}", loaded.ticket.source);
            }
        }
    }

    /// Replace the sink with a fresh, paused one starting at `start_at`.
    fn rebuild_at(&mut self, start_at: Duration) {
        let (Some(stream), Some(loaded)) = (self.stream.as_ref(), self.current.as_mut()) else {
            return;
        };
        match create_sink_at(stream, &loaded.bytes, loaded.hint.as_deref(), start_at) {
            Ok((sink, _)) => {
                sink.set_speed(self.rate as f32);
                sink.set_volume(if self.muted { 0.0 } else { 1.0 });
                loaded.sink.stop();
                loaded.sink = sink;
            }
            Err(reason) => log::warn!("rebuilding {} failed: {reason}", loaded.ticket.source),
        }
    }

    fn tick(&mut self) {
        if !self.playing {
            return;
        }
        let Some(loaded) = &self.current else {
            return;
        };
        let generation = loaded.ticket.generation;
        if loaded.sink.empty() {
            self.playing = false;
            self.events.emit(MediaEvent::Ended { generation });
        } else {
            self.events.emit(MediaEvent::PositionTick {
                generation,
                seconds: loaded.sink.get_pos().as_secs_f64(),
            });
        }
    }

    fn resolve(&self, ticket: LoadTicket, outcome: LoadOutcome) {
        self.events.emit(MediaEvent::Resolved { ticket, outcome });
    }

    fn emit_native(&self, started: bool) {
        let Some(loaded) = &self.current else {
            return;
        };
        let generation = loaded.ticket.generation;
        self.events.emit(if started {
            MediaEvent::NativeStarted { generation }
        } else {
            MediaEvent::NativePaused { generation }
        });
    }
}

fn extension_hint(source: &str) -> Option<String> {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Decode `bytes` into a paused `Sink` positioned at `start_at`.
fn create_sink_at(
    stream: &OutputStream,
    bytes: &Arc<[u8]>,
    hint: Option<&str>,
    start_at: Duration,
) -> Result<(Sink, Option<Duration>), String> {
    let mut builder = Decoder::builder()
        .with_data(Cursor::new(bytes.clone()))
        .with_byte_len(bytes.len() as u64)
        .with_seekable(true);
    if let Some(h) = hint {
        builder = builder.with_hint(h);
    }
    let source = builder.build().map_err(|e| e.to_string())?;
    let duration = source.total_duration();

    let sink = Sink::connect_new(stream.mixer());
    sink.pause();
    sink.append(source);
    if !start_at.is_zero() {
        sink.try_seek(start_at).map_err(|e| e.to_string())?;
    }
    Ok((sink, duration))
}

fn fade_out_sink(sink: &Sink, fade_out_ms: u64, from: f32) {
    if fade_out_ms == 0 || from == 0.0 {
        sink.set_volume(0.0);
        return;
    }
    let steps: u64 = 20;
    let step_ms = (fade_out_ms / steps).max(1);
    for step in 1..=steps {
        let t = step as f32 / steps as f32;
        sink.set_volume(from * (1.0 - t));
        thread::sleep(Duration::from_millis(step_ms));
    }
    sink.set_volume(0.0);
}

#[cfg(test)]
mod tests {
    use super::extension_hint;

    #[test]
    fn extension_hint_ignores_query_and_case() {
        assert_eq!(
            extension_hint("https://p.scdn.co/mp3-preview/abc.MP3?cid=1").as_deref(),
            Some("mp3")
        );
        assert_eq!(extension_hint("file:///music/a.flac").as_deref(), Some("flac"));
        assert_eq!(extension_hint("https://p.scdn.co/mp3-preview/abc"), None);
    }
}
