use super::*;
use crate::error::PlaybackError;
use crate::track::Track;

fn track(id: &str, src: Option<&str>) -> Track {
    Track::new(id, id.to_uppercase(), src)
}

fn replay(initial: &PlayerState, events: &[PlayerEvent]) -> PlayerState {
    events.iter().fold(initial.clone(), |s, e| reduce(&s, e))
}

fn mixed_events() -> Vec<PlayerEvent> {
    vec![
        PlayerEvent::Started,
        PlayerEvent::TrackSelected(track("a", Some("a.mp3"))),
        PlayerEvent::DurationReported(30.0),
        PlayerEvent::Started,
        PlayerEvent::PositionReported(12.4),
        PlayerEvent::MuteToggled,
        PlayerEvent::RateChanged(1.5),
        PlayerEvent::Stopped,
        PlayerEvent::StartRequested,
        PlayerEvent::TrackSelected(track("b", None)),
        PlayerEvent::StartRequested,
        PlayerEvent::FaultReported(PlaybackError::NoActiveTrack),
        PlayerEvent::PositionReported(-3.0),
        PlayerEvent::TrackSelected(track("c", Some("c.mp3"))),
        PlayerEvent::Started,
        PlayerEvent::PositionReported(99.0),
    ]
}

#[test]
fn replay_is_deterministic() {
    let initial = PlayerState::default();
    let events = mixed_events();
    assert_eq!(replay(&initial, &events), replay(&initial, &events));
}

#[test]
fn playing_implies_track_in_every_prefix() {
    let events = mixed_events();
    let mut s = PlayerState::default();
    for e in &events {
        s = reduce(&s, e);
        assert!(!s.playing || s.current_track.is_some(), "after {e:?}");
        assert!(!(s.playing && s.loading), "after {e:?}");
    }
}

#[test]
fn started_without_track_is_ignored() {
    let s = reduce(&PlayerState::default(), &PlayerEvent::Started);
    assert!(!s.playing);
    assert_eq!(s.status(), PlaybackStatus::Idle);
}

#[test]
fn track_selected_resets_position_duration_and_fault() {
    let s = replay(
        &PlayerState::default(),
        &[
            PlayerEvent::TrackSelected(track("a", Some("a.mp3"))),
            PlayerEvent::DurationReported(30.0),
            PlayerEvent::PositionReported(20.0),
            PlayerEvent::FaultReported(PlaybackError::PlaybackRejected("busy".into())),
            PlayerEvent::TrackSelected(track("b", Some("b.mp3"))),
        ],
    );
    assert_eq!(s.position, 0.0);
    assert_eq!(s.duration, 0.0);
    assert_eq!(s.fault, None);
    assert!(s.loading);
    assert_eq!(s.status(), PlaybackStatus::Loading);
}

#[test]
fn position_is_clamped_to_known_duration() {
    let s = replay(
        &PlayerState::default(),
        &[
            PlayerEvent::TrackSelected(track("a", Some("a.mp3"))),
            PlayerEvent::PositionReported(45.0),
        ],
    );
    // duration unknown: only the lower bound applies
    assert_eq!(s.position, 45.0);

    let s = reduce(&s, &PlayerEvent::DurationReported(30.0));
    assert_eq!(s.position, 30.0);

    let s = reduce(&s, &PlayerEvent::PositionReported(f64::NAN));
    assert_eq!(s.position, 0.0);
    let s = reduce(&s, &PlayerEvent::PositionReported(-1.0));
    assert_eq!(s.position, 0.0);
}

#[test]
fn bad_duration_and_rate_are_clamped() {
    let s = reduce(&PlayerState::default(), &PlayerEvent::DurationReported(f64::INFINITY));
    assert_eq!(s.duration, 0.0);
    let s = reduce(&s, &PlayerEvent::RateChanged(100.0));
    assert_eq!(s.playback_rate, MAX_RATE);
    let s = reduce(&s, &PlayerEvent::RateChanged(f64::NAN));
    assert_eq!(s.playback_rate, 1.0);
}

#[test]
fn fault_stops_and_keeps_track() {
    let s = replay(
        &PlayerState::default(),
        &[
            PlayerEvent::TrackSelected(track("a", Some("a.mp3"))),
            PlayerEvent::Started,
            PlayerEvent::FaultReported(PlaybackError::LoadFailed {
                source_url: Some("a.mp3".into()),
                reason: "404".into(),
            }),
        ],
    );
    assert!(!s.playing);
    assert_eq!(s.current_track.as_ref().map(|t| t.id.as_str()), Some("a"));
    assert!(s.fault.is_some());
    assert_eq!(s.status(), PlaybackStatus::Paused);
}

#[test]
fn scoped_is_playing_compares_sources() {
    let a = track("a", Some("a.mp3"));
    let a_row_copy = Track::new("row-7", "A again", Some("a.mp3"));
    let b = track("b", Some("b.mp3"));
    let s = replay(
        &PlayerState::default(),
        &[PlayerEvent::TrackSelected(a.clone()), PlayerEvent::Started],
    );
    assert!(s.is_playing(None));
    assert!(s.is_playing(Some(&a)));
    assert!(s.is_playing(Some(&a_row_copy)));
    assert!(!s.is_playing(Some(&b)));
    assert!(!s.is_playing(Some(&track("x", None))));
}

#[test]
fn start_request_counts_as_active_until_confirmed() {
    let a = track("a", Some("a.mp3"));
    let paused = replay(
        &PlayerState::default(),
        &[
            PlayerEvent::TrackSelected(a.clone()),
            PlayerEvent::Started,
            PlayerEvent::Stopped,
        ],
    );
    assert!(!paused.is_active(Some(&a)));

    let requested = reduce(&paused, &PlayerEvent::StartRequested);
    assert!(requested.loading);
    assert!(!requested.playing);
    assert!(requested.is_active(Some(&a)));
    assert!(requested.is_active(None));
    assert!(!requested.is_active(Some(&track("b", Some("b.mp3")))));

    assert!(!reduce(&requested, &PlayerEvent::Stopped).is_active(None));
    let started = reduce(&requested, &PlayerEvent::Started);
    assert!(started.playing && !started.loading);
}

#[test]
fn start_request_needs_a_playable_track() {
    let none = reduce(&PlayerState::default(), &PlayerEvent::StartRequested);
    assert_eq!(none, PlayerState::default());

    let silent = reduce(
        &PlayerState::default(),
        &PlayerEvent::TrackSelected(track("s", None)),
    );
    assert!(!reduce(&silent, &PlayerEvent::StartRequested).loading);
}

#[test]
fn store_reports_only_real_changes() {
    let mut store = Store::default();
    assert!(!store.dispatch(&PlayerEvent::Stopped));
    assert!(store.dispatch(&PlayerEvent::MuteToggled));
    assert!(store.state().muted);
    assert!(!store.dispatch(&PlayerEvent::Started));
}

#[test]
fn preferences_seed_rate_and_mute() {
    let s = PlayerState::with_preferences(1.5, true);
    assert_eq!(s.playback_rate, 1.5);
    assert!(s.muted);
    assert!(!s.playing);
}
