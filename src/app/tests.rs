use super::*;
use crate::error::PlaybackError;
use crate::player::{PlayerEvent, PlayerState, reduce};
use crate::track::Track;
use std::sync::Arc;

fn t(title: &str) -> Track {
    Track::new(
        title.to_ascii_lowercase(),
        title,
        Some(&format!("https://cdn.test/{}.mp3", title.to_ascii_lowercase())),
    )
}

fn playing(track: &Track) -> Arc<PlayerState> {
    let s = reduce(&PlayerState::default(), &PlayerEvent::TrackSelected(track.clone()));
    Arc::new(reduce(&s, &PlayerEvent::Started))
}

#[test]
fn fuzzy_match_simple() {
    let title = "Hello World";
    assert!(App::fuzzy_match_positions(title, "hw").is_some());
    assert!(App::fuzzy_match_positions(title, "ello").is_some());
    assert!(App::fuzzy_match_positions(title, "xyz").is_none());
}

#[test]
fn display_indices_respects_filter_query() {
    let tracks = vec![t("Alpha"), t("Beta"), t("Gamma"), t("Delta")];
    let mut app = App::new(tracks);
    app.filter_query = "et".into();
    assert_eq!(app.display_indices(), vec![1, 3]);
}

#[test]
fn display_indices_uses_fuzzy_not_substring_only() {
    let mut a = t("Blackened");
    a.artists = vec!["Metallica".into()];
    let mut b = t("Paranoid");
    b.artists = vec!["Black Sabbath".into()];

    let mut app = App::new(vec![a, b]);
    // Fuzzy query: letters appear in order but not necessarily contiguously
    app.filter_query = "mtbk".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn trimming_filter_query_affects_matching() {
    let mut app = App::new(vec![t("Black Sabbath")]);
    app.filter_query = "Black ".into();
    assert_eq!(app.display_indices(), vec![0]);

    app.filter_query = "   ".into();
    assert_eq!(app.display_indices(), vec![0]);
}

#[test]
fn next_prev_in_view_helpers_work() {
    let mut app = App::new(vec![t("Alpha"), t("Beta"), t("Gamma")]);
    app.filter_query = "et".into(); // only Beta is visible

    assert_eq!(app.next_in_view_from(0), Some(1));
    assert_eq!(app.prev_in_view_from(0), Some(1));
    assert_eq!(app.next_in_view_from(1), Some(1));
    assert_eq!(app.prev_in_view_from(1), Some(1));
}

#[test]
fn follow_playback_moves_cursor_to_current_track() {
    let tracks = vec![t("Alpha"), t("Beta"), t("Gamma")];
    let gamma = tracks[2].clone();
    let mut app = App::new(tracks);

    app.set_player(playing(&gamma));
    assert_eq!(app.selected, 2);
    assert_eq!(app.current_index(), Some(2));

    app.follow_playback_off();
    app.set_selected(0);
    app.set_player(playing(&gamma));
    assert_eq!(app.selected, 0);
}

#[test]
fn current_track_matches_by_source_not_id() {
    let tracks = vec![t("Alpha"), t("Beta")];
    let mut copy = tracks[1].clone();
    copy.id = "album-row-7".into();
    let mut app = App::new(tracks);

    app.set_player(playing(&copy));
    assert_eq!(app.current_index(), Some(1));
}

#[test]
fn row_status_reflects_snapshot() {
    let tracks = vec![t("Alpha"), t("Beta")];
    let alpha = tracks[0].clone();
    let mut app = App::new(tracks);
    app.follow_playback_off();

    assert_eq!(app.row_status(0), RowStatus::Idle);

    let loading = reduce(&PlayerState::default(), &PlayerEvent::TrackSelected(alpha.clone()));
    app.set_player(Arc::new(loading.clone()));
    assert_eq!(app.row_status(0), RowStatus::Loading);
    assert_eq!(app.row_status(1), RowStatus::Idle);

    let started = reduce(&loading, &PlayerEvent::Started);
    app.set_player(Arc::new(started.clone()));
    assert_eq!(app.row_status(0), RowStatus::Playing);

    app.set_player(Arc::new(reduce(&started, &PlayerEvent::Stopped)));
    assert_eq!(app.row_status(0), RowStatus::Paused);

    let failed = reduce(
        &loading,
        &PlayerEvent::FaultReported(PlaybackError::PlaybackRejected("no device".into())),
    );
    app.set_player(Arc::new(failed));
    assert_eq!(app.row_status(0), RowStatus::Failed);
}

#[test]
fn next_rate_cycles_presets() {
    let mut app = App::new(vec![t("Alpha")]);
    app.rate_presets = vec![1.0, 1.5, 2.0];
    assert_eq!(app.next_rate(), 1.5);

    app.player = Arc::new(PlayerState::with_preferences(2.0, false));
    assert_eq!(app.next_rate(), 1.0);

    // off-preset rates restart the cycle
    app.player = Arc::new(PlayerState::with_preferences(0.75, false));
    assert_eq!(app.next_rate(), 1.0);
}

#[test]
fn filter_mode_stops_following() {
    let mut app = App::new(vec![t("Alpha"), t("Beta")]);
    assert!(app.follow_playback);
    app.enter_filter_mode();
    assert!(!app.follow_playback);
    app.push_filter_char('b');
    assert_eq!(app.selected, 1);
    app.clear_filter();
    assert!(!app.filter_mode);
}
