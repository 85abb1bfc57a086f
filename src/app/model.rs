//! Application model types: `App` and `RowStatus`.
//!
//! The `App` struct holds the loaded catalog, the cursor, filter state and the
//! latest player snapshot used by the UI and runtime.

use std::sync::Arc;

use crate::player::{PlaybackStatus, PlayerState};
use crate::track::Track;

/// What a list row shows next to its title.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowStatus {
    /// Not the selected track.
    Idle,
    Loading,
    Playing,
    Paused,
    /// Selected, but loading or starting it failed.
    Failed,
}

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,
    /// Latest published player snapshot.
    pub player: Arc<PlayerState>,

    lower_titles: Option<Vec<String>>,

    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub catalog_name: Option<String>,
    pub metadata_window: bool,
    pub rate_presets: Vec<f64>,
}

impl App {
    /// Create a new `App` with the provided list of `tracks`.
    pub fn new(tracks: Vec<Track>) -> Self {
        // Optimization: for larger catalogs, precompute lowercase titles to speed up fuzzy
        // filtering (avoid per-char lowercase conversions on every redraw/keystroke).
        let lower_titles = if tracks.len() > 100 {
            Some(
                tracks
                    .iter()
                    .map(|t| t.display().to_ascii_lowercase())
                    .collect(),
            )
        } else {
            None
        };

        Self {
            tracks,
            selected: 0,
            player: Arc::new(PlayerState::default()),

            lower_titles,

            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            catalog_name: None,
            metadata_window: false,
            rate_presets: vec![1.0],
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Enable following playback (cursor follows the current track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn set_catalog_name(&mut self, name: String) {
        self.catalog_name = Some(name);
    }

    /// Store a new snapshot; when following, move the cursor to the current track.
    pub fn set_player(&mut self, player: Arc<PlayerState>) {
        self.player = player;
        if !self.follow_playback || self.filter_mode {
            return;
        }
        if let Some(idx) = self.current_index() {
            if idx != self.selected {
                self.set_selected(idx);
            }
        }
    }

    /// Index of the player's current track in the catalog.
    ///
    /// Matched by source; tracks without a preview fall back to the id.
    pub fn current_index(&self) -> Option<usize> {
        let current = self.player.current_track.as_ref()?;
        self.tracks.iter().position(|t| {
            t.same_source(current) || (!current.has_preview() && t.id == current.id)
        })
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.tracks.get(self.selected)
    }

    pub fn row_status(&self, index: usize) -> RowStatus {
        if self.current_index() != Some(index) {
            return RowStatus::Idle;
        }
        if self.player.fault.is_some() && !self.player.playing {
            return RowStatus::Failed;
        }
        match self.player.status() {
            PlaybackStatus::Idle => RowStatus::Idle,
            PlaybackStatus::Loading => RowStatus::Loading,
            PlaybackStatus::Playing => RowStatus::Playing,
            PlaybackStatus::Paused => RowStatus::Paused,
        }
    }

    /// The preset after the current rate, wrapping around.
    pub fn next_rate(&self) -> f64 {
        let current = self.player.playback_rate;
        let Some(first) = self.rate_presets.first().copied() else {
            return 1.0;
        };
        self.rate_presets
            .iter()
            .position(|r| (r - current).abs() < 1e-6)
            .and_then(|i| self.rate_presets.get(i + 1).copied())
            .unwrap_or(first)
    }

    /// Return the display order of track indices, taking into account the
    /// active filter.
    pub fn display_indices(&self) -> Vec<usize> {
        let base = 0..self.tracks.len();

        let query = self.filter_query.trim();
        if query.is_empty() {
            return base.collect();
        }
        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                let query_lower = query.to_ascii_lowercase();
                base.filter(|&i| {
                    Self::fuzzy_match_positions_lower(&lower_titles[i], &query_lower).is_some()
                })
                .collect()
            }
            None => base
                .filter(|&i| Self::fuzzy_match_positions(&self.tracks[i].display(), query).is_some())
                .collect(),
        }
    }

    /// Return true if this `App` uses precomputed lowercase titles.
    pub fn uses_lower_titles(&self) -> bool {
        self.lower_titles.is_some()
    }

    /// Fuzzy-match `query_lower` against a specific track by index.
    ///
    /// Returns the character positions that match, or `None` when there is no match.
    pub fn fuzzy_match_positions_for_track_lower(
        &self,
        track_index: usize,
        query_lower: &str,
    ) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        match self.lower_titles.as_deref() {
            Some(lower_titles) => {
                Self::fuzzy_match_positions_lower(&lower_titles[track_index], query_lower)
            }
            None => Self::fuzzy_match_positions(&self.tracks[track_index].display(), query_lower),
        }
    }

    /// Return the next visible index in the current display order after `current`.
    /// Wraps around to the first element.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(p) => Some(display[(p + 1) % display.len()]),
            None => Some(display[0]),
        }
    }

    /// Return the previous visible index in the current display order before `current`.
    /// Wraps around to the last element.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        if display.is_empty() {
            return None;
        }

        let pos = display.iter().position(|&i| i == current);
        match pos {
            Some(0) => Some(display[display.len() - 1]),
            Some(p) => Some(display[p - 1]),
            None => Some(display[display.len() - 1]),
        }
    }

    /// Set the selected track index and ensure it is visible in the display.
    pub fn set_selected(&mut self, idx: usize) {
        self.selected = idx;
        self.ensure_selected_visible();
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Fuzzy/subsequence match: return the character positions in `title`
    /// that match `query`, or `None` if not matched.
    pub fn fuzzy_match_positions(title: &str, query: &str) -> Option<Vec<usize>> {
        if query.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title.chars().enumerate();

        for qc in query.chars() {
            let qc_low = qc.to_ascii_lowercase();
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc.to_ascii_lowercase() == qc_low => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    fn fuzzy_match_positions_lower(title_lower: &str, query_lower: &str) -> Option<Vec<usize>> {
        if query_lower.is_empty() {
            return Some(Vec::new());
        }

        let mut positions: Vec<usize> = Vec::new();
        let mut title_iter = title_lower.chars().enumerate();

        for qc in query_lower.chars() {
            loop {
                match title_iter.next() {
                    Some((ti, tc)) if tc == qc => {
                        positions.push(ti);
                        break;
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        }

        Some(positions)
    }

    /// Enter filter mode: enable filtering and stop following playback.
    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    /// Clear the active filter and restore selection visibility.
    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    /// Ensure that `selected` is part of the current filtered view,
    /// otherwise move selection to the first visible track.
    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        if display.is_empty() {
            self.selected = 0;
            return;
        }

        if !display.contains(&self.selected) {
            self.selected = display[0];
        }
    }

    /// Move selection to the next visible track.
    pub fn next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    /// Move selection to the previous visible track.
    pub fn prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }
}
