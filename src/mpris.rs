//! MPRIS bridge: desktop media keys and `playerctl` drive the same coordinator as
//! the terminal UI.
//!
//! Player methods call coordinator intents directly; properties read its latest
//! snapshot. A subscription on the coordinator triggers `PropertiesChanged`.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::object_server::InterfaceRef;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::coordinator::Coordinator;
use crate::player::{MAX_RATE, MIN_RATE, PlaybackStatus, PlayerState};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.segue";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";
const POLL: Duration = Duration::from_millis(200);

/// Requests the bridge cannot serve itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "segue"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".into(), "https".into()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec!["audio/mpeg".into()]
    }
}

struct PlayerIface {
    coordinator: Coordinator,
}

/// `mpris:trackid` for the current track: the catalog id restricted to the
/// characters D-Bus object paths allow.
fn trackid_for(state: &PlayerState) -> String {
    match &state.current_track {
        Some(t) => {
            let id: String = t
                .id
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!("{OBJECT_PATH}/track/{}", if id.is_empty() { "_" } else { &id })
        }
        None => NO_TRACK.to_string(),
    }
}

fn micros(seconds: f64) -> i64 {
    (seconds.max(0.0) * 1_000_000.0) as i64
}

fn status_str(state: &PlayerState) -> &'static str {
    match state.status() {
        PlaybackStatus::Idle => "Stopped",
        PlaybackStatus::Playing => "Playing",
        // nothing is audible until the handle confirms a start
        PlaybackStatus::Loading | PlaybackStatus::Paused => "Paused",
    }
}

fn put(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

fn metadata_for(state: &PlayerState) -> HashMap<String, OwnedValue> {
    let mut map = HashMap::new();
    if let Ok(path) = ObjectPath::try_from(trackid_for(state)) {
        put(&mut map, "mpris:trackid", Value::from(path));
    }
    let Some(track) = &state.current_track else {
        return map;
    };

    put(&mut map, "xesam:title", Value::from(track.title.clone()));
    if !track.artists.is_empty() {
        put(&mut map, "xesam:artist", Value::from(track.artists.clone()));
    }
    if let Some(album) = &track.album {
        put(&mut map, "xesam:album", Value::from(album.clone()));
    }
    if let Some(url) = &track.source_url {
        put(&mut map, "xesam:url", Value::from(url.clone()));
    }
    let length = if state.duration > 0.0 {
        Some(state.duration)
    } else {
        track.duration_hint.map(|d| d.as_secs_f64())
    };
    if let Some(secs) = length {
        put(&mut map, "mpris:length", Value::from(micros(secs)));
    }
    map
}

impl PlayerIface {
    fn snapshot(&self) -> std::sync::Arc<PlayerState> {
        self.coordinator.snapshot()
    }

    fn send(&self, what: &str, result: crate::error::Result<()>) {
        if let Err(e) = result {
            log::warn!("MPRIS {what}: {e}");
        }
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        // No queue.
    }

    fn previous(&self) {
        // No queue.
    }

    fn play(&self) {
        self.send("play", self.coordinator.play(None));
    }

    fn pause(&self) {
        self.send("pause", self.coordinator.pause());
    }

    fn play_pause(&self) {
        self.send("play-pause", self.coordinator.toggle(None));
    }

    fn stop(&self) {
        self.send("stop", self.coordinator.pause());
        self.send("stop", self.coordinator.seek(0.0));
    }

    /// `offset` in microseconds, relative to the current position.
    fn seek(&self, offset: i64) {
        self.send("seek", self.coordinator.seek_by(offset as f64 / 1_000_000.0));
    }

    fn set_position(&self, track_id: OwnedObjectPath, position: i64) {
        // Ignored unless it targets the current track.
        if track_id.as_str() != trackid_for(&self.snapshot()) {
            return;
        }
        self.send(
            "set-position",
            self.coordinator.seek(position as f64 / 1_000_000.0),
        );
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        status_str(&self.snapshot())
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.snapshot().playback_rate
    }

    #[zbus(property)]
    fn set_rate(&mut self, rate: f64) {
        self.send("rate", self.coordinator.set_playback_rate(rate));
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        MIN_RATE
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        MAX_RATE
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        if self.snapshot().muted { 0.0 } else { 1.0 }
    }

    /// Only mute/unmute is supported: 0 mutes, anything else unmutes.
    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        if (volume <= 0.0) != self.snapshot().muted {
            self.send("volume", self.coordinator.toggle_mute());
        }
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        micros(self.snapshot().position)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        metadata_for(&self.snapshot())
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.snapshot().current_track.is_some()
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        false
    }
}

/// Whether a transition changes anything MPRIS clients display.
fn mpris_relevant(prev: &PlayerState, next: &PlayerState) -> bool {
    status_str(prev) != status_str(next)
        || prev.current_track != next.current_track
        || prev.duration != next.duration
        || prev.playback_rate != next.playback_rate
        || prev.muted != next.muted
}

async fn emit_changes(iface: &InterfaceRef<PlayerIface>) -> zbus::Result<()> {
    let emitter = iface.signal_emitter();
    let player = iface.get().await;
    player.playback_status_changed(emitter).await?;
    player.metadata_changed(emitter).await?;
    player.rate_changed(emitter).await?;
    player.volume_changed(emitter).await?;
    player.can_play_changed(emitter).await?;
    Ok(())
}

async fn serve(coordinator: Coordinator, tx: Sender<ControlCmd>) -> zbus::Result<()> {
    let updates = coordinator
        .subscribe_with(Box::new(mpris_relevant))
        .map_err(|e| zbus::Error::Failure(e.to_string()))?;

    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server.at(OBJECT_PATH, RootIface { tx }).await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { coordinator })
        .await?;
    let iface = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    log::info!("MPRIS: registered {BUS_NAME}");

    loop {
        Timer::after(POLL).await;
        if updates.try_latest().is_some() {
            if let Err(e) = emit_changes(&iface).await {
                log::debug!("MPRIS: failed to emit PropertiesChanged: {e}");
            }
        }
    }
}

/// Register on the session bus from a background thread. Failure (no session bus,
/// name taken) is logged and otherwise ignored.
pub fn spawn_mpris(coordinator: Coordinator, tx: Sender<ControlCmd>) {
    let spawned = std::thread::Builder::new()
        .name("segue-mpris".into())
        .spawn(move || {
            if let Err(e) = block_on(serve(coordinator, tx)) {
                log::warn!("MPRIS unavailable: {e}");
            }
        });
    if let Err(e) = spawned {
        log::warn!("MPRIS: failed to spawn thread: {e}");
    }
}
